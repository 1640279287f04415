//! Read-through cache for list-type GET responses.
//!
//! An automation run looks up campaigns and ad groups many times; the
//! canonical unfiltered lists are fetched once and served from here until
//! a mutation invalidates them. Filtered fetches are never cached because
//! they are not the full set.

use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
pub struct EntityCache<T> {
    name: &'static str,
    entries: RwLock<Option<Vec<T>>>,
}

impl<T: Clone> EntityCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(None),
        }
    }

    /// Return the cached list, if one is present
    pub async fn get(&self) -> Option<Vec<T>> {
        let entries = self.entries.read().await;
        if let Some(cached) = entries.as_ref() {
            debug!("Using cached {} ({} items)", self.name, cached.len());
        }
        entries.clone()
    }

    /// Replace the cache with a freshly fetched full list
    pub async fn store(&self, items: Vec<T>) {
        let mut entries = self.entries.write().await;
        *entries = Some(items);
    }

    /// Drop the cache so the next read goes to the network
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        if entries.take().is_some() {
            debug!("Invalidated {} cache", self.name);
        }
    }
}
