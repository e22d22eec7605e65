//! In-memory stand-ins for storage and the seed source.
//!
//! **WARNING**: Do NOT use in production. These are for tests and demos.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::seed::{SeedError, SeedSource, SeedTodo};
use crate::storage::{StorageError, StorageFuture, TodoStorage};
use crate::types::Snapshot;

/// Mock storage keeping the last accepted snapshot in memory
///
/// Honors the revision rule of [`TodoStorage::save`]: an older snapshot never
/// replaces a newer one.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    snapshot: Arc<Mutex<Option<Snapshot>>>,
    saves: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStorage {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `snapshot`
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(snapshot))),
            ..Self::default()
        }
    }

    /// The stored snapshot, if any
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn last_saved(&self) -> Option<Snapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    /// Number of `save` calls, including rejected and stale ones
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following `save` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl TodoStorage for InMemoryStorage {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    fn save(&self, snapshot: Snapshot) -> StorageFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("writes disabled".to_string()));
            }

            let mut stored = self.snapshot.lock().unwrap();
            let stale = stored
                .as_ref()
                .is_some_and(|current| snapshot.revision < current.revision);
            if !stale {
                *stored = Some(snapshot);
            }
            Ok(())
        })
    }

    fn load(&self) -> StorageFuture<'_, Snapshot> {
        Box::pin(async move { self.last_saved().unwrap_or_default() })
    }
}

/// Mock seed source returning a fixed list
#[derive(Clone, Default)]
pub struct StaticSeedSource {
    items: Vec<SeedTodo>,
    delay: Option<Duration>,
    fetches: Arc<AtomicUsize>,
}

impl StaticSeedSource {
    /// Source that always returns `items`
    #[must_use]
    pub fn new(items: Vec<SeedTodo>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Source that returns nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wait `delay` before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed fetches
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SeedSource for StaticSeedSource {
    fn fetch_seed(&self) -> StorageFuture<'_, Result<Vec<SeedTodo>, SeedError>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        })
    }
}

/// Mock seed source that always fails
#[derive(Clone)]
pub struct FailingSeedSource {
    error: SeedError,
}

impl FailingSeedSource {
    /// Source failing with `error`
    #[must_use]
    pub const fn new(error: SeedError) -> Self {
        Self { error }
    }
}

impl Default for FailingSeedSource {
    fn default() -> Self {
        Self::new(SeedError::RequestFailed("network unreachable".to_string()))
    }
}

impl SeedSource for FailingSeedSource {
    fn fetch_seed(&self) -> StorageFuture<'_, Result<Vec<SeedTodo>, SeedError>> {
        let error = self.error.clone();
        Box::pin(async move { Err(error) })
    }
}
