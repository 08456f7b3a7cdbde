//! Synchronous delivery of committed change batches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureId;

/// Kind of change carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    /// Only emitted on request, mutations never produce it.
    Styling,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::Styling => "styling",
        };
        f.write_str(name)
    }
}

/// Handler receiving the affected ids, the change kind, and a read-only view of the
/// source whose state already includes the change.
pub type ChangeHandler<S> = Box<dyn FnMut(&[FeatureId], ChangeKind, &S)>;

/// Handle returned on subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of subscribers. Every batch is delivered to each of them in
/// subscription order.
///
/// Parameters:
/// - `S`: the type handlers get a shared view of, usually the store.
pub struct ChangeNotifier<S> {
    subscribers: Vec<(SubscriptionId, ChangeHandler<S>)>,
    next_subscription: u64,
}

impl<S> Default for ChangeNotifier<S> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl<S> fmt::Debug for ChangeNotifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .field("next_subscription", &self.next_subscription)
            .finish()
    }
}

impl<S> ChangeNotifier<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber after the existing ones.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&[FeatureId], ChangeKind, &S) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Drop every subscriber and install `handler` as the only one.
    pub fn replace<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&[FeatureId], ChangeKind, &S) + 'static,
    {
        self.subscribers.clear();
        self.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscription, _)| *subscription != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn notify(&mut self, ids: &[FeatureId], kind: ChangeKind, source: &S) {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(ids, kind, source);
        }
    }
}
