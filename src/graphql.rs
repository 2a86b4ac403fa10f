//! graphql types
//!
//! wrappers for graphql responses and errors.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// graphql response wrapper
///
/// `data` and `errors` may both be present: a partial success carries data
/// for the fields that resolved and errors for the ones that did not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse<T> {
    /// response data or null if errors
    pub data: Option<T>,
    /// graphql errors array, null when absent
    pub errors: Option<Vec<GraphQlError>>,
}

impl<T> GraphQlResponse<T> {
    /// successful response without errors
    pub fn with_data(data: T) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// true if the response contains graphql errors
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// turn graphql errors into an [`Error::GraphQl`]
    ///
    /// any partial data is dropped when errors are present.
    pub fn into_result(self) -> Result<Option<T>> {
        match self.errors {
            Some(errors) if !errors.is_empty() => {
                let message = errors
                    .first()
                    .map(|err| err.message.clone())
                    .unwrap_or_else(|| "graphql error".to_string());
                Err(Error::GraphQl {
                    status: None,
                    errors,
                    body: String::new(),
                    message,
                })
            }
            _ => Ok(self.data),
        }
    }
}

/// graphql error entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
    /// error message
    pub message: String,
    /// error locations in the query
    #[serde(default)]
    pub locations: Vec<GraphQlLocation>,
    /// response path
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    /// optional extensions payload
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphQlError {
    /// error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

/// graphql error location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlLocation {
    /// line number (1-based)
    pub line: i64,
    /// column number (1-based)
    pub column: i64,
}
