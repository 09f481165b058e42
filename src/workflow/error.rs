use derive_more::Display;

use crate::model::status::IllegalTransition;
use crate::store::StoreError;

/// Terminal failure of a workflow operation, surfaced as-is to the caller.
#[derive(Debug, Display)]
pub enum WorkflowError {
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "annual leave quota for {} is exhausted", year)]
    QuotaExhausted { year: i32 },
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    InvalidState(String),
    #[display(fmt = "{}", _0)]
    Storage(StoreError),
}

impl std::error::Error for WorkflowError {}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            not_found @ StoreError::NotFound { .. } => WorkflowError::NotFound(not_found.to_string()),
            other => WorkflowError::Storage(other),
        }
    }
}

impl From<IllegalTransition> for WorkflowError {
    fn from(err: IllegalTransition) -> Self {
        WorkflowError::InvalidState(format!("request already resolved: {err}"))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
