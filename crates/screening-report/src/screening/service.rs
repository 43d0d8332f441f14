use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::records::{RecordStore, StudentRecord};
use crate::report::{RenderError, ReportRenderer};
use crate::verification::{EncodeError, TagEncoder, VerificationPayload};

/// Per-request rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub include_verification_tag: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_verification_tag: true,
        }
    }
}

/// A finished document ready to be offered for download.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub record: StudentRecord,
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a matric number.")]
    EmptyIdentifier,
}

/// Error raised while serving a single report request. None of these leave
/// the service in a different state than before the call.
#[derive(Debug, thiserror::Error)]
pub enum ReportServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Matric number not found or medical test not completed.")]
    NotFound { identifier: String },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("report worker did not finish: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// Composes the record store, tag encoder, and renderer into the
/// lookup-then-render flow.
pub struct ReportService<E> {
    store: Arc<RecordStore>,
    renderer: ReportRenderer,
    encoder: Arc<E>,
    defaults: ReportOptions,
}

impl<E> ReportService<E>
where
    E: TagEncoder + 'static,
{
    pub fn new(store: Arc<RecordStore>, renderer: ReportRenderer, encoder: Arc<E>) -> Self {
        Self {
            store,
            renderer,
            encoder,
            defaults: ReportOptions::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ReportOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> ReportOptions {
        self.defaults
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Empty identifiers are rejected before the store is consulted. Anything
    /// else, whitespace included, is matched verbatim.
    pub fn lookup(&self, identifier: &str) -> Result<&StudentRecord, ReportServiceError> {
        if identifier.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }

        self.store.find_by_identifier(identifier).ok_or_else(|| {
            info!(identifier, "no screening record for identifier");
            ReportServiceError::NotFound {
                identifier: identifier.to_string(),
            }
        })
    }

    pub fn generate(
        &self,
        identifier: &str,
        generated_at: NaiveDateTime,
        options: ReportOptions,
    ) -> Result<GeneratedReport, ReportServiceError> {
        let record = self.lookup(identifier)?;

        let tag = if options.include_verification_tag {
            let payload = VerificationPayload::from_record(record);
            let png = self.encoder.encode(&payload).map_err(|err| {
                error!(identifier, error = %err, "verification tag encoding failed");
                err
            })?;
            Some(png)
        } else {
            None
        };

        let bytes = self
            .renderer
            .render(record, generated_at, tag.as_deref())
            .map_err(|err| {
                error!(identifier, error = %err, "report rendering failed");
                err
            })?;

        info!(
            identifier,
            bytes = bytes.len(),
            verification_tag = tag.is_some(),
            "screening report generated"
        );

        Ok(GeneratedReport {
            record: record.clone(),
            file_name: report_file_name(identifier),
            content_type: mime::APPLICATION_PDF,
            bytes,
        })
    }
}

/// `{identifier}_report.pdf`, stripped of characters that are unsafe in file
/// names or a `Content-Disposition` header.
pub fn report_file_name(identifier: &str) -> String {
    let stem = sanitize_filename::sanitize(identifier);
    if stem.trim().is_empty() {
        "report.pdf".to_string()
    } else {
        format!("{stem}_report.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_derived_from_identifier() {
        assert_eq!(report_file_name("S1001"), "S1001_report.pdf");
    }

    #[test]
    fn file_name_drops_path_separators_and_quotes() {
        let name = report_file_name("BU/22/\"CS\"/014");
        assert!(!name.contains('/'));
        assert!(!name.contains('"'));
        assert!(name.ends_with("_report.pdf"));
    }

    #[test]
    fn file_name_falls_back_when_nothing_survives() {
        assert_eq!(report_file_name("///"), "report.pdf");
    }

    #[test]
    fn user_facing_messages_match_clinic_wording() {
        assert_eq!(
            ReportServiceError::from(ValidationError::EmptyIdentifier).to_string(),
            "Please enter a matric number."
        );
        assert_eq!(
            ReportServiceError::NotFound {
                identifier: "S9999".to_string()
            }
            .to_string(),
            "Matric number not found or medical test not completed."
        );
    }
}
