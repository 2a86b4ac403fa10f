//! typed operations
//!
//! operation trait for documents with a known response shape.

use crate::request::{Request, Variables};
use serde::de::DeserializeOwned;

/// graphql operation with a fixed document and response type
pub trait Operation {
    /// graphql query or mutation string
    const QUERY: &'static str;
    /// response payload type
    type Response: DeserializeOwned;

    /// build a request descriptor for this operation
    fn request(variables: Variables) -> Request {
        Request::new(Self::QUERY).with_variables(variables)
    }
}
