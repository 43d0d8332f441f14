use crate::commands::{run_lookup, run_report, LookupArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use screening_report::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Screening Report Service",
    about = "Look up student screening results and issue verifiable PDF reports",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the screening record for one identifier
    Lookup(LookupArgs),
    /// Write the PDF report for one identifier to disk
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the student table (CSV) loaded at startup
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lookup(args) => run_lookup(args),
        Command::Report(args) => run_report(args),
    }
}
