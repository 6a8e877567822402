mod cli;
mod duplicates;
mod infra;
mod validate;

use housing_subsidy::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
