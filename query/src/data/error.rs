//! Unified error type for the data layer
//!
//! Compilation itself is total and never fails. These errors come from the
//! two edges around it: decoding untrusted query JSON, and binding the
//! compiled query for execution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// Query JSON exceeded the configured size limit
    #[error("Query JSON exceeds maximum size of {max} bytes ({size} bytes given)")]
    QueryTooLarge { size: usize, max: usize },

    /// Query JSON did not decode into the expected shape
    #[error("Invalid query JSON: {0}")]
    InvalidQueryJson(#[from] serde_json::Error),

    /// Expression nesting exceeded the configured depth
    #[error("Query nesting depth {depth} exceeds maximum of {max}")]
    QueryTooDeep { depth: usize, max: usize },

    /// A field outside the allowed set was referenced
    #[error("Cannot filter by field: {0}")]
    InvalidField(String),

    /// An IN / NOT IN parameter was bound to an empty array
    #[error("Membership list for parameter '{param}' is empty")]
    InvalidMembershipList { param: String },

    /// A placeholder in the predicate has no bound value
    #[error("No value bound for parameter '{0}'")]
    UnknownParameter(String),

    /// SQLite execution error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

impl DataError {
    /// Create a query-too-large error
    pub fn query_too_large(size: usize, max: usize) -> Self {
        Self::QueryTooLarge { size, max }
    }

    /// Create an empty membership list error
    pub fn invalid_membership_list(param: impl Into<String>) -> Self {
        Self::InvalidMembershipList {
            param: param.into(),
        }
    }

    /// True when the caller sent something unusable (as opposed to an execution failure)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Sqlite(_))
    }
}
