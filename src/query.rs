//! query state machine
//!
//! a [`Query`] owns the lifecycle of one graphql query: the initial fetch,
//! re-fetches when variables change, and incremental "fetch more" pages
//! merged into the accumulated data.
//!
//! states go `idle -> loading -> settled` and re-enter `loading` on every
//! trigger. nothing is cancelled: when two requests overlap, whichever
//! settles last writes the state.

use crate::error::RequestError;
use crate::graphql::GraphQlResponse;
use crate::merge::{page_info, PageInfo};
use crate::observe::{Listeners, SubscriptionId};
use crate::request::{Request, Variables};
use crate::transport::Transport;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// merge function for fetch-more pages
///
/// receives the new page's data (`null` when absent) and the state at the
/// time the page settles; the return value becomes the new `data`. it runs
/// while the state is locked, so it must not call back into the query.
pub type QueryMerge = Arc<dyn Fn(&Value, &QueryState) -> Value + Send + Sync>;

/// observable query state
///
/// `loading` and `fetch_more_loading` stay `None` until the first trigger.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub data: Option<Value>,
    pub loading: Option<bool>,
    pub fetch_more_loading: Option<bool>,
    pub errors: Option<Vec<RequestError>>,
}

impl QueryState {
    /// true while the main query is in flight
    pub fn is_loading(&self) -> bool {
        self.loading == Some(true)
    }

    /// true while a fetch-more page is in flight
    pub fn is_fetching_more(&self) -> bool {
        self.fetch_more_loading == Some(true)
    }

    /// `pageInfo` of the connection at json pointer `connection`
    pub fn page_info(&self, connection: &str) -> Option<PageInfo> {
        page_info(self.data.as_ref()?, connection)
    }
}

/// builder for [`Query`]
pub struct QueryBuilder {
    transport: Arc<dyn Transport>,
    document: String,
    variables: Variables,
    merge: Option<QueryMerge>,
}

impl QueryBuilder {
    pub(crate) fn new(transport: Arc<dyn Transport>, document: String) -> Self {
        Self {
            transport,
            document,
            variables: Variables::new(),
            merge: None,
        }
    }

    /// initial variables
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// merge function used by [`Query::fetch_more`]
    ///
    /// without one, a fetched page replaces the data.
    pub fn merge<F>(mut self, merge: F) -> Self
    where
        F: Fn(&Value, &QueryState) -> Value + Send + Sync + 'static,
    {
        self.merge = Some(Arc::new(merge));
        self
    }

    /// shared merge function, e.g. from [`crate::append_edges`]
    pub fn merge_with(mut self, merge: QueryMerge) -> Self {
        self.merge = Some(merge);
        self
    }

    /// build the query in its idle state; nothing is sent yet
    pub fn build(self) -> Query {
        let operation = Request::new(self.document.as_str()).operation_name();
        Query {
            inner: Arc::new(QueryInner {
                transport: self.transport,
                document: self.document,
                operation,
                merge: self.merge,
                variables: Mutex::new(self.variables),
                state: Mutex::new(QueryState::default()),
                listeners: Listeners::new(),
            }),
        }
    }
}

struct QueryInner {
    transport: Arc<dyn Transport>,
    document: String,
    operation: Option<String>,
    merge: Option<QueryMerge>,
    variables: Mutex<Variables>,
    state: Mutex<QueryState>,
    listeners: Listeners<QueryState>,
}

/// query state machine handle
///
/// clones share the same state.
#[derive(Clone)]
pub struct Query {
    inner: Arc<QueryInner>,
}

impl Query {
    /// start building a query bound to `transport`
    pub fn builder(transport: Arc<dyn Transport>, document: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(transport, document.into())
    }

    /// current state
    pub fn snapshot(&self) -> QueryState {
        self.inner.state.lock().clone()
    }

    /// currently configured variables
    pub fn variables(&self) -> Variables {
        self.inner.variables.lock().clone()
    }

    /// register a listener called with a snapshot on every transition
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&QueryState) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// remove a listener; false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    /// first activation: send the configured query and wait for it to settle
    pub async fn activate(&self) {
        self.run_query().await;
    }

    /// send the configured query again, even if nothing changed
    pub async fn refetch(&self) {
        self.run_query().await;
    }

    /// replace the variables, re-fetching only if they differ
    ///
    /// variables are compared by value, so a freshly built but equal map is
    /// a no-op. returns whether a request was sent.
    pub async fn configure(&self, variables: Variables) -> bool {
        {
            let mut current = self.inner.variables.lock();
            if *current == variables {
                debug!(operation = self.label(), "variables unchanged, skipping re-fetch");
                return false;
            }
            *current = variables;
        }
        self.run_query().await;
        true
    }

    /// fetch another page and merge it into the current data
    pub async fn fetch_more(&self, request: Request) {
        self.update(|state| state.fetch_more_loading = Some(true));
        debug!(operation = self.label(), "fetching more");

        match self.inner.transport.query(request).await {
            Ok(response) => {
                let GraphQlResponse { data, errors } = response;
                let page = data.unwrap_or(Value::Null);
                self.update(|state| {
                    let merged = match &self.inner.merge {
                        Some(merge) => merge(&page, &*state),
                        None => page,
                    };
                    state.data = non_null(merged);
                    state.errors = protocol_errors(errors);
                    state.fetch_more_loading = Some(false);
                });
                debug!(operation = self.label(), "fetch more settled");
            }
            Err(err) => {
                warn!(operation = self.label(), error = %err, "fetch more failed");
                self.update(|state| {
                    state.errors = Some(vec![RequestError::from(err)]);
                    state.fetch_more_loading = Some(false);
                });
            }
        }
    }

    /// fire-and-forget [`Query::fetch_more`] on the tokio runtime
    ///
    /// the handle may be dropped; the state still updates when the page
    /// settles. must be called from within a tokio runtime.
    pub fn spawn_fetch_more(&self, request: Request) -> JoinHandle<()> {
        let query = self.clone();
        tokio::spawn(async move { query.fetch_more(request).await })
    }

    /// request for the page after the connection at json pointer `connection`
    ///
    /// uses the current variables with `cursor_variable` set to the
    /// connection's `endCursor`. `None` when there is no next page.
    pub fn next_page(&self, connection: &str, cursor_variable: &str) -> Option<Request> {
        let info = self.snapshot().page_info(connection)?;
        if !info.has_next_page {
            return None;
        }
        let cursor = info.end_cursor?;
        Some(
            Request::new(self.inner.document.as_str())
                .with_variables(self.variables())
                .with_variable(cursor_variable, cursor),
        )
    }

    async fn run_query(&self) {
        let request = Request::new(self.inner.document.as_str()).with_variables(self.variables());
        self.update(|state| state.loading = Some(true));
        debug!(operation = self.label(), "query loading");

        match self.inner.transport.query(request).await {
            Ok(response) => {
                let GraphQlResponse { data, errors } = response;
                self.update(|state| {
                    state.data = data.and_then(non_null);
                    state.errors = protocol_errors(errors);
                    state.loading = Some(false);
                });
                debug!(operation = self.label(), "query settled");
            }
            Err(err) => {
                warn!(operation = self.label(), error = %err, "query failed, keeping previous data");
                self.update(|state| {
                    state.errors = Some(vec![RequestError::from(err)]);
                    state.loading = Some(false);
                });
            }
        }
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut QueryState),
    {
        self.inner.listeners.publish(|| {
            let mut state = self.inner.state.lock();
            apply(&mut state);
            Some(state.clone())
        });
    }

    fn label(&self) -> &str {
        self.inner.operation.as_deref().unwrap_or("<anonymous>")
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("operation", &self.inner.operation)
            .field("state", &*self.inner.state.lock())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

pub(crate) fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        value => Some(value),
    }
}

pub(crate) fn protocol_errors(
    errors: Option<Vec<crate::graphql::GraphQlError>>,
) -> Option<Vec<RequestError>> {
    errors.map(|errors| errors.into_iter().map(RequestError::from).collect())
}
