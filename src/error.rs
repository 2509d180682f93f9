//! Error types for the import pipeline and the storage layer.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unreadable spreadsheet: {reason}")]
    Unreadable { reason: String },

    #[error("spreadsheet must have at least 2 columns (name and weeks), found {found}")]
    InsufficientColumns { found: usize },

    #[error("no week columns found (expected headers like '1ª Semana', '2a Semana')")]
    NoWeekColumns,

    #[error("week header {header:?} has a week number out of range")]
    WeekNumberOutOfRange { header: String },

    #[error("invalid score: {0}")]
    InvalidScore(Decimal),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Unreadable {
            reason: err.to_string(),
        }
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Unreadable {
            reason: err.to_string(),
        }
    }
}
