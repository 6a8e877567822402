use crate::duplicates::{run_duplicates, DuplicatesArgs};
use crate::validate::{run_validate, ValidateArgs};
use clap::{Parser, Subcommand};
use housing_subsidy::config::AppConfig;
use housing_subsidy::error::AppError;
use housing_subsidy::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Subsidy Wizard",
    about = "Validate housing-subsidy application records from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply optional edits to a record, derive defaults and print every section's errors
    Validate(ValidateArgs),
    /// Check the applicants of a record against a roster of known persons
    Duplicates(DuplicatesArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    info!(?config.environment, "housing subsidy wizard ready");

    match cli.command {
        Command::Validate(args) => run_validate(args, &config.engine),
        Command::Duplicates(args) => run_duplicates(args, config.engine).await,
    }
}
