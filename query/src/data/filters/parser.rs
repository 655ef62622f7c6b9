//! Query parsing
//!
//! Decodes client JSON into a [`ToolkitQuery`], enforcing size and depth limits
//! so the recursive compiler only ever sees bounded input.

use serde::{Deserialize, Serialize};

use super::types::{Keys, ToolkitQuery};
use crate::core::constants::{DEFAULT_MAX_QUERY_DEPTH, DEFAULT_MAX_QUERY_JSON_SIZE};
use crate::data::error::DataError;

/// Limits applied while decoding untrusted query JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Maximum size of the query JSON in bytes
    pub max_json_bytes: usize,
    /// Maximum expression nesting depth
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_json_bytes: DEFAULT_MAX_QUERY_JSON_SIZE,
            max_depth: DEFAULT_MAX_QUERY_DEPTH,
        }
    }
}

/// Parse a query from JSON text
pub fn parse_query(json_str: &str, limits: &ParseLimits) -> Result<ToolkitQuery, DataError> {
    if json_str.len() > limits.max_json_bytes {
        return Err(DataError::query_too_large(
            json_str.len(),
            limits.max_json_bytes,
        ));
    }

    let query: ToolkitQuery = serde_json::from_str(json_str)?;

    let depth = query.expression.depth();
    if depth > limits.max_depth {
        return Err(DataError::QueryTooDeep {
            depth,
            max: limits.max_depth,
        });
    }

    tracing::trace!(depth, "Parsed query");
    Ok(query)
}

/// Parse a query and check every referenced field against a whitelist
pub fn parse_query_checked(
    json_str: &str,
    limits: &ParseLimits,
    allowed_fields: &[&str],
) -> Result<ToolkitQuery, DataError> {
    let query = parse_query(json_str, limits)?;
    query.validate(allowed_fields)?;
    Ok(query)
}

/// Parse the key constraints map from JSON text
pub fn parse_keys(json_str: &str) -> Result<Keys, DataError> {
    if json_str.trim().is_empty() {
        return Ok(Keys::new());
    }
    Ok(serde_json::from_str(json_str)?)
}
