use crate::infra::{apply_data_override, build_service, parse_timestamp};
use chrono::{Local, NaiveDateTime};
use clap::Args;
use screening_report::config::AppConfig;
use screening_report::error::AppError;
use screening_report::records::StudentRecord;
use screening_report::screening::ReportOptions;
use screening_report::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Matric or hospital number to look up
    #[arg(long)]
    pub(crate) identifier: String,
    /// Override the student table (CSV)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Matric or hospital number to report on
    #[arg(long)]
    pub(crate) identifier: String,
    /// Destination file (defaults to ./<identifier>_report.pdf)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Leave the QR verification tag off the report
    #[arg(long)]
    pub(crate) no_verification_tag: bool,
    /// Timestamp printed on the report, "YYYY-MM-DD HH:MM:SS" (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) generated_at: Option<NaiveDateTime>,
    /// Override the student table (CSV)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

pub(crate) fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    apply_data_override(&mut config, args.data);
    telemetry::init_for_command(&config.telemetry)?;

    let service = build_service(&config)?;
    let record = service.lookup(&args.identifier)?;
    print_student_details(record);
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        identifier,
        output,
        no_verification_tag,
        generated_at,
        data,
    } = args;

    let mut config = AppConfig::load()?;
    apply_data_override(&mut config, data);
    telemetry::init_for_command(&config.telemetry)?;

    let service = build_service(&config)?;
    let generated_at = generated_at.unwrap_or_else(|| Local::now().naive_local());
    let options = ReportOptions {
        include_verification_tag: !no_verification_tag
            && service.defaults().include_verification_tag,
    };

    let report = service.generate(&identifier, generated_at, options)?;
    let output = output.unwrap_or_else(|| PathBuf::from(&report.file_name));
    std::fs::write(&output, &report.bytes)?;

    print_student_details(&report.record);
    println!(
        "\nReport written to {} ({} bytes)",
        output.display(),
        report.bytes.len()
    );
    Ok(())
}

fn print_student_details(record: &StudentRecord) {
    println!("Student Details");
    println!("Matric Number/Hospital Number: {}", record.identifier);
    println!("Full Name: {}", record.full_name);
    println!("Department: {}", record.department);
    println!("Substance abuse screening: {}", record.result);
}
