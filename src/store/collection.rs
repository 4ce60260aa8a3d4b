//! Keyed in-memory collection for catalog records.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

/// A thread-safe map of records keyed by UUID.
///
/// Cloning shares the underlying map.
#[derive(Debug)]
pub struct Collection<T> {
    inner: Arc<DashMap<Uuid, T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: Uuid, record: T) {
        self.inner.insert(id, record);
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// All records matching `keep`, in no particular order.
    pub fn filter(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.inner
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn all(&self) -> Vec<T> {
        self.filter(|_| true)
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.inner.remove(id).map(|(_, record)| record)
    }

    /// Remove `id` only if `condition` holds for the stored record.
    pub fn remove_if(&self, id: &Uuid, condition: impl FnOnce(&T) -> bool) -> Option<T> {
        self.inner
            .remove_if(id, |_, record| condition(record))
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
