use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::page::{self, FORM_ROUTE, LOGO_ROUTE};
use super::service::{GeneratedReport, ReportOptions, ReportService, ReportServiceError};
use crate::verification::TagEncoder;

/// JSON body accepted by `POST /api/v1/reports`.
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub include_verification_tag: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportForm {
    #[serde(default)]
    identifier: String,
}

/// Router builder exposing the landing page, the form flow, and the JSON API.
pub fn screening_router<E>(service: Arc<ReportService<E>>) -> Router
where
    E: TagEncoder + 'static,
{
    Router::new()
        .route("/", get(index_handler::<E>))
        .route(LOGO_ROUTE, get(logo_handler::<E>))
        .route(FORM_ROUTE, post(form_report_handler::<E>))
        .route("/api/v1/students/:identifier", get(student_handler::<E>))
        .route("/api/v1/reports", post(report_handler::<E>))
        .with_state(service)
}

impl ReportServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ReportServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReportServiceError::Encode(_)
            | ReportServiceError::Render(_)
            | ReportServiceError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReportServiceError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (self.status_code(), Json(payload)).into_response()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Encoding and rendering are synchronous and read the logo from disk, so they
/// run on the blocking pool.
async fn generate_blocking<E>(
    service: Arc<ReportService<E>>,
    identifier: String,
    options: ReportOptions,
) -> Result<GeneratedReport, ReportServiceError>
where
    E: TagEncoder + 'static,
{
    let generated_at = now();
    tokio::task::spawn_blocking(move || service.generate(&identifier, generated_at, options))
        .await?
}

fn download(report: GeneratedReport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, report.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response()
}

pub(crate) async fn index_handler<E>(State(service): State<Arc<ReportService<E>>>) -> Html<String>
where
    E: TagEncoder + 'static,
{
    Html(page::render_index(service.renderer().branding(), None, ""))
}

pub(crate) async fn logo_handler<E>(State(service): State<Arc<ReportService<E>>>) -> Response
where
    E: TagEncoder + 'static,
{
    let path = service.renderer().logo_path().to_path_buf();
    let read = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || std::fs::read(path)).await
    };
    match read {
        Ok(Ok(bytes)) => {
            let content_type = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, content_type.to_string())], bytes).into_response()
        }
        Ok(Err(err)) => {
            warn!(path = %path.display(), error = %err, "logo unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "logo read did not finish");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) async fn form_report_handler<E>(
    State(service): State<Arc<ReportService<E>>>,
    Form(form): Form<ReportForm>,
) -> Response
where
    E: TagEncoder + 'static,
{
    let options = service.defaults();
    match generate_blocking(service.clone(), form.identifier.clone(), options).await {
        Ok(report) => Html(page::render_result(service.renderer().branding(), &report))
            .into_response(),
        Err(error) => {
            let html = page::render_index(
                service.renderer().branding(),
                Some(&error.to_string()),
                &form.identifier,
            );
            (error.status_code(), Html(html)).into_response()
        }
    }
}

pub(crate) async fn student_handler<E>(
    State(service): State<Arc<ReportService<E>>>,
    Path(identifier): Path<String>,
) -> Response
where
    E: TagEncoder + 'static,
{
    match service.lookup(&identifier) {
        Ok(record) => (StatusCode::OK, Json(record.clone())).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn report_handler<E>(
    State(service): State<Arc<ReportService<E>>>,
    Json(request): Json<ReportRequest>,
) -> Response
where
    E: TagEncoder + 'static,
{
    let options = ReportOptions {
        include_verification_tag: request
            .include_verification_tag
            .unwrap_or(service.defaults().include_verification_tag),
    };

    match generate_blocking(service, request.identifier, options).await {
        Ok(report) => download(report),
        Err(error) => error.into_response(),
    }
}
