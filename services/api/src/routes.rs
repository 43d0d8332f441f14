use crate::infra::{AppState, ScreeningService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use screening_report::screening::screening_router;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_operational_routes(service: Arc<ScreeningService>) -> axum::Router {
    screening_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use screening_report::records::RecordStore;
    use screening_report::report::{ReportBranding, ReportRenderer};
    use screening_report::screening::ReportService;
    use screening_report::verification::QrTagEncoder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let table = "Matric Number,Fullname,Dept,RESULT\nS1001,Jane Doe,CS,Negative\n";
        let store = RecordStore::from_reader(table.as_bytes()).expect("table parses");
        let service = Arc::new(ReportService::new(
            Arc::new(store),
            ReportRenderer::new(ReportBranding::default(), "./missing-logo.jpeg"),
            Arc::new(QrTagEncoder::default()),
        ));
        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        (
            with_operational_routes(service).layer(Extension(state)),
            readiness,
        )
    }

    async fn status_of(router: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (router, _) = app(false);
        let (status, body) = status_of(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let (router, readiness) = app(false);
        let (status, body) = status_of(router.clone(), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "status": "initializing" }));

        readiness.store(true, Ordering::Release);
        let (status, _) = status_of(router, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn screening_routes_are_mounted_alongside() {
        let (router, _) = app(true);
        let (status, body) = status_of(router, "/api/v1/students/S1001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("department"), Some(&json!("CS")));
    }

    #[tokio::test]
    async fn missing_logo_is_a_500_for_that_request_only() {
        let (router, _) = app(true);
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/reports")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"identifier":"S1001"}"#))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = status_of(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
