//! Errors surfaced by command handlers

use pricescout_app::app::EstimationServiceError;
use pricescout_types::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error(transparent)]
    Service(#[from] EstimationServiceError),
}

pub type Result<T> = std::result::Result<T, CliError>;
