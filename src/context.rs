//! shared transport binding
//!
//! a [`ClientContext`] is created once at startup and handed to the parts of
//! an application that build queries and mutations, so each construction
//! site does not need the transport itself. the bound transport cannot be
//! swapped; build a new context (and new state machines) instead.

use crate::mutation::MutationBuilder;
use crate::query::QueryBuilder;
use crate::transport::Transport;
use std::sync::Arc;

/// factory for state machines sharing one transport
#[derive(Clone)]
pub struct ClientContext {
    transport: Arc<dyn Transport>,
}

impl ClientContext {
    /// bind a transport, e.g. a [`crate::Client`]
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// bind an already shared transport
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// the bound transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// start building a query on the bound transport
    pub fn query(&self, document: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(self.transport.clone(), document.into())
    }

    /// start building a mutation on the bound transport
    pub fn mutation(&self, document: impl Into<String>) -> MutationBuilder {
        MutationBuilder::new(self.transport.clone(), document.into())
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext").finish_non_exhaustive()
    }
}
