use chrono::NaiveDateTime;
use metrics_exporter_prometheus::PrometheusHandle;
use screening_report::config::AppConfig;
use screening_report::error::AppError;
use screening_report::records::RecordStore;
use screening_report::report::layout::TIMESTAMP_FORMAT;
use screening_report::report::ReportRenderer;
use screening_report::screening::{ReportOptions, ReportService};
use screening_report::verification::QrTagEncoder;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ScreeningService = ReportService<QrTagEncoder>;

/// Loads the student table once and wires it to the renderer and QR encoder.
/// A table that fails to load is fatal for the caller.
pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<ScreeningService>, AppError> {
    let store = Arc::new(RecordStore::load(&config.data.records_path)?);
    let renderer = ReportRenderer::new(
        config.report.branding.clone(),
        config.report.logo_path.clone(),
    );
    let service = ReportService::new(store, renderer, Arc::new(QrTagEncoder::default()))
        .with_defaults(ReportOptions {
            include_verification_tag: config.report.include_verification_tag,
        });
    Ok(Arc::new(service))
}

pub(crate) fn apply_data_override(config: &mut AppConfig, data: Option<PathBuf>) {
    if let Some(path) = data {
        config.data.records_path = path;
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM:SS ({err})"))
}
