use std::collections::BTreeMap;

use crate::viewport::navigation::InputKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Input listeners currently attached to the viewer.
///
/// A session registers one listener per input kind and removes them on
/// teardown; events for a kind with no listener are dropped.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, InputKind>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: InputKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.insert(id, kind);
        id
    }

    /// Returns false if the listener was already removed.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn listens_for(&self, kind: InputKind) -> bool {
        self.listeners.values().any(|k| *k == kind)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
