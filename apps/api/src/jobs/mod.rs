//! Job postings and the append-only chain document, both held as JSON files
//! in a remote repository.

pub mod chain;
pub mod file_store;
pub mod handlers;
pub mod store;

use crate::errors::AppError;

/// Job ids arrive as path strings; anything but an integer is a 400.
pub fn parse_job_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid job id '{raw}': expected an integer")))
}
