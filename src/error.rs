//! error types
//!
//! structured errors for config, http, json, and graphql responses, plus the
//! [`RequestError`] entries stored in query and mutation state.

use crate::graphql::GraphQlError;
use std::fmt;
use std::sync::Arc;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for the client and transports
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("graphql error: {message}")]
    GraphQl {
        /// http status if available
        status: Option<u16>,
        /// graphql error list
        errors: Vec<GraphQlError>,
        /// raw response body
        body: String,
        /// top-level message
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// true if the error looks like an auth failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::GraphQl { status: Some(401 | 403), .. })
            || matches!(self, Error::Http(err) if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED))
    }
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// one entry of the `errors` list held by query and mutation state
///
/// protocol errors come back from the server next to (possibly partial)
/// data; transport errors replace the whole response.
#[derive(Debug, Clone)]
pub enum RequestError {
    /// error entry reported by the graphql service
    GraphQl(GraphQlError),
    /// the request itself failed
    Transport(Arc<Error>),
}

impl RequestError {
    /// human readable message
    pub fn message(&self) -> String {
        match self {
            RequestError::GraphQl(err) => err.message.clone(),
            RequestError::Transport(err) => err.to_string(),
        }
    }

    /// true for failures raised by the transport rather than the service
    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Transport(_))
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::GraphQl(err) => write!(f, "{err}"),
            RequestError::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl From<GraphQlError> for RequestError {
    fn from(err: GraphQlError) -> Self {
        RequestError::GraphQl(err)
    }
}

impl From<Error> for RequestError {
    fn from(err: Error) -> Self {
        RequestError::Transport(Arc::new(err))
    }
}
