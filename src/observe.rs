//! state observers
//!
//! listener registry shared by [`crate::Query`] and [`crate::Mutation`].
//!
//! transitions go through [`Listeners::publish`], which holds an ordering
//! lock across the state write and the notification. listeners therefore see
//! snapshots in the order the state was written, even when requests settle
//! on different worker threads.

use parking_lot::{ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// registered listeners for one state machine
pub(crate) struct Listeners<S> {
    entries: RwLock<Vec<(SubscriptionId, Listener<S>)>>,
    next_id: AtomicU64,
    /// serializes write + notify; re-entrant so a listener may trigger
    /// another transition on the same thread
    order: ReentrantMutex<()>,
}

impl<S> Listeners<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            order: ReentrantMutex::new(()),
        }
    }

    pub(crate) fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.write().push((id, Arc::new(listener)));
        id
    }

    /// returns false if the id was not registered
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// call every listener in registration order
    ///
    /// the registry lock is released first so listeners may subscribe or
    /// unsubscribe from inside the callback.
    pub(crate) fn notify(&self, snapshot: &S) {
        let listeners: Vec<Listener<S>> = self
            .entries
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    /// run a state write and notify with its snapshot, in write order
    ///
    /// `write` returns `None` when nothing changed. the state lock taken
    /// inside `write` must be released before it returns. returns whether
    /// listeners were notified.
    pub(crate) fn publish<F>(&self, write: F) -> bool
    where
        F: FnOnce() -> Option<S>,
    {
        let _order = self.order.lock();
        match write() {
            Some(snapshot) => {
                self.notify(&snapshot);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
