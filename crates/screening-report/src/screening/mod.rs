//! Identifier lookup, report generation, and the HTTP surface in front of them.

mod page;
pub mod router;
pub mod service;

pub use page::{render_index, render_result};
pub use router::{screening_router, ReportRequest};
pub use service::{
    report_file_name, GeneratedReport, ReportOptions, ReportService, ReportServiceError,
    ValidationError,
};
