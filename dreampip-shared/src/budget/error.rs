/// Budget error types
///
/// Storage failures are a single class (`StoreError`) regardless of backend.
/// How each ledger operation reacts to one is decided in `ledger.rs`.

use crate::settings::SettingsError;
use uuid::Uuid;

/// Any failure of the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the ledger and task-list service
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Persisting the allocation would push an owner past 100%
    #[error("Budget allocation exceeded for user {user_id}: {current} allocated, {requested} requested")]
    AllocationExceeded {
        user_id: Uuid,
        requested: f64,
        current: f64,
    },

    #[error("Budget percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(f64),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
}

impl From<sqlx::Error> for BudgetError {
    fn from(err: sqlx::Error) -> Self {
        BudgetError::Store(StoreError::Database(err))
    }
}

pub type BudgetResult<T> = Result<T, BudgetError>;
