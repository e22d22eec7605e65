//! Wiring: build the environment from configuration and start the store.

use std::sync::Arc;

use pocket_todo_core::environment::SystemClock;
use pocket_todo_runtime::retry::RetryPolicy;
use pocket_todo_runtime::{EffectHandle, Store, StoreError};
use thiserror::Error;

use crate::config::Config;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::seed::{HttpSeedSource, SeedError};
use crate::storage::JsonFileStorage;
use crate::types::{TodoAction, TodoState};

/// The store type the front end talks to
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Errors raised while starting up
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The seed source could not be created
    #[error(transparent)]
    Seed(#[from] SeedError),

    /// The store refused the initial seed request
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Production environment: system clock, JSON file storage, HTTP seed source
///
/// # Errors
///
/// Returns [`BootstrapError::Seed`] if the HTTP client cannot be built.
pub fn environment(config: &Config) -> Result<TodoEnvironment, BootstrapError> {
    let storage = JsonFileStorage::new(&config.storage.data_dir, &config.storage.key);
    tracing::debug!(path = %storage.path().display(), "Using JSON file storage");

    let seed = HttpSeedSource::new(config.seed.url.clone(), config.seed.timeout())?
        .with_limit(config.seed.limit())
        .with_retry_policy(RetryPolicy::new(config.seed.retries));

    Ok(
        TodoEnvironment::new(Arc::new(SystemClock), Arc::new(storage), Arc::new(seed))
            .with_seed_policy(config.seed.policy),
    )
}

/// Loads the stored collection and creates the store
///
/// With `seed_on_start`, an empty collection triggers a seed fetch; the
/// returned handle completes once the fetch has been applied.
///
/// # Errors
///
/// Returns [`BootstrapError::Store`] if the store rejects the seed request.
pub async fn start(
    env: TodoEnvironment,
    seed_on_start: bool,
) -> Result<(TodoStore, Option<EffectHandle>), BootstrapError> {
    let snapshot = env.storage.load().await;
    let state = TodoState::from_snapshot(snapshot);
    let empty = state.todos.is_empty();
    tracing::info!(todos = state.count(), next_id = state.next_id, "Starting todo store");

    let store = Store::new(state, TodoReducer::new(), env);

    let seeding = if seed_on_start && empty {
        Some(store.send(TodoAction::LoadSeed).await?)
    } else {
        None
    };

    Ok((store, seeding))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{InMemoryStorage, StaticSeedSource};
    use crate::seed::SeedTodo;
    use crate::types::{Snapshot, TodoId, TodoItem};
    use pocket_todo_testing::{test_clock, test_time};

    fn env(storage: InMemoryStorage, seed: StaticSeedSource) -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(test_clock()), Arc::new(storage), Arc::new(seed))
    }

    fn remote() -> StaticSeedSource {
        StaticSeedSource::new(vec![SeedTodo {
            id: TodoId::from(1),
            title: "delectus aut autem".to_string(),
            completed: false,
        }])
    }

    #[tokio::test]
    async fn empty_storage_seeds_on_start() {
        let storage = InMemoryStorage::new();
        let (store, seeding) = start(env(storage.clone(), remote()), true).await.unwrap();

        let mut seeding = seeding.unwrap();
        seeding.wait().await;

        let (count, loading) = store.state(|s| (s.count(), s.loading)).await;
        assert_eq!(count, 1);
        assert!(!loading);
        assert_eq!(storage.last_saved().unwrap().todos.len(), 1);
    }

    #[tokio::test]
    async fn stored_todos_skip_seeding() {
        let mut snapshot = Snapshot::empty();
        snapshot.todos.push(TodoItem::new(TodoId::from(5), "kept".to_string(), test_time()));
        let seed = remote();

        let (store, seeding) = start(env(InMemoryStorage::with_snapshot(snapshot), seed.clone()), true)
            .await
            .unwrap();

        assert!(seeding.is_none());
        assert_eq!(seed.fetch_count(), 0);
        assert_eq!(store.state(|s| s.next_id).await, 6);
    }

    #[tokio::test]
    async fn seeding_can_be_disabled() {
        let (store, seeding) = start(env(InMemoryStorage::new(), remote()), false).await.unwrap();

        assert!(seeding.is_none());
        assert_eq!(store.state(TodoState::count).await, 0);
    }

    #[test]
    fn environment_from_default_config() {
        let env = environment(&Config::default()).unwrap();
        assert_eq!(env.seed_policy, crate::types::SeedPolicy::Replace);
    }
}
