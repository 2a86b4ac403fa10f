//! request descriptors
//!
//! a [`Request`] is the `{query, variables}` pair sent for every call.

use graphql_parser::query::{parse_query, Definition, OperationDefinition};
use serde::Serialize;
use serde_json::Value;

/// graphql variables keyed by name
pub type Variables = serde_json::Map<String, Value>;

/// kind of graphql operation a transport is asked to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// immutable query or mutation descriptor
///
/// serializes to exactly the graphql-over-http body:
///
/// ```
/// use graphql_bind::Request;
/// use serde_json::json;
///
/// let request = Request::new("query ($login: String!) { user(login: $login) { name } }")
///     .with_variable("login", "octocat");
/// assert_eq!(
///     serde_json::to_value(&request).unwrap(),
///     json!({
///         "query": "query ($login: String!) { user(login: $login) { name } }",
///         "variables": {"login": "octocat"},
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    query: String,
    variables: Variables,
}

impl Request {
    /// create a request with no variables
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Variables::new(),
        }
    }

    /// replace all variables
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// set a single variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// document text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// variables sent with the document
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// name of the first operation in the document, if it has one
    pub fn operation_name(&self) -> Option<String> {
        let document = parse_query::<String>(&self.query).ok()?;
        document.definitions.into_iter().find_map(|definition| match definition {
            Definition::Operation(OperationDefinition::Query(query)) => query.name,
            Definition::Operation(OperationDefinition::Mutation(mutation)) => mutation.name,
            Definition::Operation(OperationDefinition::Subscription(sub)) => sub.name,
            _ => None,
        })
    }
}

/// turn a json object into [`Variables`]
///
/// anything other than an object (including `null`) yields no variables.
pub fn into_variables(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        _ => Variables::new(),
    }
}
