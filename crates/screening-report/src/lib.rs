pub mod config;
pub mod error;
pub mod records;
pub mod report;
pub mod screening;
pub mod telemetry;
pub mod verification;
