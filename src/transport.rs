//! transport seam
//!
//! state machines talk to the network through [`Transport`]. [`crate::Client`]
//! is the http implementation; [`FnTransport`] wraps a closure so any sender
//! can be plugged in.

use crate::error::Result;
use crate::graphql::GraphQlResponse;
use crate::request::{OperationKind, Request};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// boxed future returned by transports
pub type BoxFutureResult<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// sends request descriptors and returns raw graphql responses
///
/// a resolved future means the service answered; graphql errors travel
/// inside the response. a rejected future is a transport failure.
pub trait Transport: Send + Sync {
    /// run a query
    fn query(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>>;

    /// run a mutation
    fn mutate(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>>;
}

/// closure-backed transport
///
/// ```
/// use graphql_bind::{FnTransport, GraphQlResponse};
/// use serde_json::json;
///
/// let transport = FnTransport::new(|_kind, _request| async {
///     Ok(GraphQlResponse::with_data(json!({"ok": true})))
/// });
/// # let _ = transport;
/// ```
pub struct FnTransport<F> {
    send: F,
}

impl<F> FnTransport<F> {
    /// wrap a sender closure
    pub fn new<Fut>(send: F) -> Self
    where
        F: Fn(OperationKind, Request) -> Fut + Send + Sync,
        Fut: Future<Output = Result<GraphQlResponse<Value>>> + Send + 'static,
    {
        Self { send }
    }
}

impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(OperationKind, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<GraphQlResponse<Value>>> + Send + 'static,
{
    fn query(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>> {
        Box::pin((self.send)(OperationKind::Query, request))
    }

    fn mutate(&self, request: Request) -> BoxFutureResult<'_, GraphQlResponse<Value>> {
        Box::pin((self.send)(OperationKind::Mutation, request))
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}
