//! mutation state machine
//!
//! a [`Mutation`] holds the result of the latest mutation, seeded from an
//! optional initial value. resetting the initial value starts over: data goes
//! back to the new initial value and results of mutations sent before the
//! reset are dropped when they settle.

use crate::error::RequestError;
use crate::graphql::GraphQlResponse;
use crate::observe::{Listeners, SubscriptionId};
use crate::query::{non_null, protocol_errors};
use crate::request::{Request, Variables};
use crate::transport::Transport;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// merge function for mutation results
///
/// receives the mutation's response data (`null` when absent) and the state
/// when it settles; the return value becomes the new `data`.
pub type MutationMerge = Arc<dyn Fn(&Value, &MutationState) -> Value + Send + Sync>;

/// observable mutation state
#[derive(Debug, Clone, Default)]
pub struct MutationState {
    pub data: Option<Value>,
    pub loading: Option<bool>,
    pub errors: Option<Vec<RequestError>>,
}

impl MutationState {
    /// true while a mutation is in flight
    pub fn is_loading(&self) -> bool {
        self.loading == Some(true)
    }
}

/// builder for [`Mutation`]
pub struct MutationBuilder {
    transport: Arc<dyn Transport>,
    document: String,
    variables: Variables,
    initial: Option<Value>,
    merge: Option<MutationMerge>,
}

impl MutationBuilder {
    pub(crate) fn new(transport: Arc<dyn Transport>, document: String) -> Self {
        Self {
            transport,
            document,
            variables: Variables::new(),
            initial: None,
            merge: None,
        }
    }

    /// default variables for [`Mutation::mutate`]
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// data shown before the first mutation settles
    pub fn initial(mut self, initial: Value) -> Self {
        self.initial = non_null(initial);
        self
    }

    /// fold mutation results into the current state instead of replacing it
    pub fn merge<F>(mut self, merge: F) -> Self
    where
        F: Fn(&Value, &MutationState) -> Value + Send + Sync + 'static,
    {
        self.merge = Some(Arc::new(merge));
        self
    }

    pub fn build(self) -> Mutation {
        let operation = Request::new(self.document.as_str()).operation_name();
        Mutation {
            inner: Arc::new(MutationInner {
                transport: self.transport,
                document: self.document,
                operation,
                variables: self.variables,
                merge: self.merge,
                slot: Mutex::new(Slot {
                    state: MutationState {
                        data: self.initial.clone(),
                        loading: None,
                        errors: None,
                    },
                    initial: self.initial,
                    generation: 0,
                }),
                listeners: Listeners::new(),
            }),
        }
    }
}

struct Slot {
    state: MutationState,
    initial: Option<Value>,
    /// bumped on every reset; results from older generations are dropped
    generation: u64,
}

struct MutationInner {
    transport: Arc<dyn Transport>,
    document: String,
    operation: Option<String>,
    variables: Variables,
    merge: Option<MutationMerge>,
    slot: Mutex<Slot>,
    listeners: Listeners<MutationState>,
}

/// mutation state machine handle
///
/// clones share the same state.
#[derive(Clone)]
pub struct Mutation {
    inner: Arc<MutationInner>,
}

impl Mutation {
    /// start building a mutation bound to `transport`
    pub fn builder(transport: Arc<dyn Transport>, document: impl Into<String>) -> MutationBuilder {
        MutationBuilder::new(transport, document.into())
    }

    /// current state
    pub fn snapshot(&self) -> MutationState {
        self.inner.slot.lock().state.clone()
    }

    /// register a listener called with a snapshot on every transition
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&MutationState) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(listener)
    }

    /// remove a listener; false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.listeners.unsubscribe(id)
    }

    /// replace the initial value
    ///
    /// when it differs from the current one, data is reset to it, loading
    /// and errors are cleared, and in-flight results are discarded. returns
    /// whether a reset happened.
    pub fn reset(&self, initial: Option<Value>) -> bool {
        let initial = initial.and_then(non_null);
        let reset = self.inner.listeners.publish(|| {
            let mut slot = self.inner.slot.lock();
            if slot.initial == initial {
                return None;
            }
            slot.generation += 1;
            slot.initial = initial.clone();
            slot.state = MutationState {
                data: initial,
                loading: None,
                errors: None,
            };
            Some(slot.state.clone())
        });
        if reset {
            debug!(operation = self.label(), "mutation reset to new initial value");
        }
        reset
    }

    /// send the mutation with its configured variables
    pub async fn mutate(&self) {
        self.mutate_with(self.inner.variables.clone()).await;
    }

    /// send the configured mutation with other variables
    pub async fn mutate_with(&self, variables: Variables) {
        let request = Request::new(self.inner.document.as_str()).with_variables(variables);
        self.mutate_request(request).await;
    }

    /// send an arbitrary mutation descriptor through this state machine
    pub async fn mutate_request(&self, request: Request) {
        let mut generation = 0;
        self.inner.listeners.publish(|| {
            let mut slot = self.inner.slot.lock();
            slot.state.loading = Some(true);
            generation = slot.generation;
            Some(slot.state.clone())
        });
        debug!(operation = self.label(), "mutation loading");

        match self.inner.transport.mutate(request).await {
            Ok(response) => {
                let GraphQlResponse { data, errors } = response;
                let result = data.unwrap_or(Value::Null);
                self.settle(generation, |state| {
                    let merged = match &self.inner.merge {
                        Some(merge) => merge(&result, &*state),
                        None => result,
                    };
                    state.data = non_null(merged);
                    state.errors = protocol_errors(errors);
                    state.loading = Some(false);
                });
            }
            Err(err) => {
                warn!(operation = self.label(), error = %err, "mutation failed");
                self.settle(generation, |state| {
                    state.errors = Some(vec![RequestError::from(err)]);
                    state.loading = Some(false);
                });
            }
        }
    }

    /// fire-and-forget [`Mutation::mutate_with`] on the tokio runtime
    pub fn spawn_mutate(&self, variables: Variables) -> JoinHandle<()> {
        let mutation = self.clone();
        tokio::spawn(async move { mutation.mutate_with(variables).await })
    }

    fn settle<F>(&self, generation: u64, apply: F)
    where
        F: FnOnce(&mut MutationState),
    {
        let settled = self.inner.listeners.publish(|| {
            let mut slot = self.inner.slot.lock();
            if slot.generation != generation {
                return None;
            }
            apply(&mut slot.state);
            Some(slot.state.clone())
        });
        if settled {
            debug!(operation = self.label(), "mutation settled");
        } else {
            debug!(operation = self.label(), "dropping mutation result from before reset");
        }
    }

    fn label(&self) -> &str {
        self.inner.operation.as_deref().unwrap_or("<anonymous>")
    }
}

impl std::fmt::Debug for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("operation", &self.inner.operation)
            .field("state", &self.inner.slot.lock().state)
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}
