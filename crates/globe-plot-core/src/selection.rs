//! Selection notifications for an external property panel.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::host::ShapeKey;

/// Shared selection state. Cloning shares the same store.
#[derive(Clone, Default)]
pub struct SelectionStore {
    inner: Arc<RwLock<SelectionStoreInner>>,
}

#[derive(Default)]
struct SelectionStoreInner {
    selected: Option<ShapeKey>,
    version: u64,
    /// Notifications not yet taken by the panel.
    pending: Vec<Option<ShapeKey>>,
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SelectionStore")
            .field("selected", &inner.selected)
            .field("version", &inner.version)
            .finish_non_exhaustive()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape currently in an edit session.
    pub fn selected(&self) -> Option<ShapeKey> {
        self.inner.read().selected
    }

    /// Incremented once per selection notification.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Record a selection change (called by the registry).
    pub fn notify(&self, selected: Option<ShapeKey>) {
        let mut inner = self.inner.write();
        inner.selected = selected;
        inner.pending.push(selected);
        inner.version += 1;
    }

    /// Take pending notifications in the order they happened.
    pub fn take_notifications(&self) -> Vec<Option<ShapeKey>> {
        let mut inner = self.inner.write();
        std::mem::take(&mut inner.pending)
    }
}
