//! graphql client with observable request state
//!
//! this crate provides a small graphql-over-http [`Client`] and two state
//! machines that track request lifecycles for view code: [`Query`] (initial
//! fetch, re-fetch on variable change, merged "fetch more" pages) and
//! [`Mutation`] (latest mutation result, resettable initial value).
//!
//! state machines talk to the network through the [`Transport`] trait, so
//! any sender can be plugged in. a [`ClientContext`] binds one transport and
//! builds state machines on it.
//!
//! ## quick start
//!
//! ```no_run
//! use graphql_bind::{append_edges, into_variables, Client, ClientConfig, ClientContext};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(
//!     ClientConfig::new("https://api.github.com/graphql").with_bearer_token("token"),
//! )?;
//! let context = ClientContext::new(client);
//!
//! let issues = context
//!     .query("query ($cursor: String) { viewer { issues(first: 5, after: $cursor) { edges { node { title } } pageInfo { endCursor hasNextPage } } } }")
//!     .variables(into_variables(json!({})))
//!     .merge_with(append_edges("/viewer/issues"))
//!     .build();
//!
//! issues.subscribe(|state| println!("loading={:?} data={:?}", state.loading, state.data));
//! issues.activate().await;
//! if let Some(next) = issues.next_page("/viewer/issues", "cursor") {
//!     issues.fetch_more(next).await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## known races
//!
//! requests are never cancelled. if a query is re-fetched while an earlier
//! request is still in flight, whichever response settles last wins, even
//! when it belongs to the older variables.
//!
//! listeners are called synchronously after each transition, in the order
//! the state was written, including when requests settle on different
//! worker threads. a listener must not block waiting on another thread's
//! transition of the same query or mutation.

mod client;
mod config;
mod context;
mod error;
mod graphql;
mod merge;
mod mutation;
mod observe;
mod operation;
mod query;
mod request;
mod transport;

pub use client::Client;
pub use config::{ClientConfig, ENDPOINT_ENV, TOKEN_ENV};
pub use context::ClientContext;
pub use error::{Error, RequestError, Result};
pub use graphql::{GraphQlError, GraphQlLocation, GraphQlResponse};
pub use merge::{append_edges, concat_edges, page_info, PageInfo};
pub use mutation::{Mutation, MutationBuilder, MutationMerge, MutationState};
pub use observe::SubscriptionId;
pub use operation::Operation;
pub use query::{Query, QueryBuilder, QueryMerge, QueryState};
pub use request::{into_variables, OperationKind, Request, Variables};
pub use transport::{BoxFutureResult, FnTransport, Transport};
