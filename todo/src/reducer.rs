//! Reducer logic for the todo list.
//!
//! Every user intent is applied synchronously. Changes to the collection bump
//! the state's `revision` and return a persist effect; fetching the seed list
//! is the only effect that feeds an action back.

use std::sync::Arc;

use pocket_todo_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

use crate::seed::{SeedSource, SeedTodo, normalize_seed};
use crate::storage::TodoStorage;
use crate::types::{SeedPolicy, TodoAction, TodoId, TodoItem, TodoState, normalize_title};

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
    /// Where snapshots are saved
    pub storage: Arc<dyn TodoStorage>,
    /// Where the seed list comes from
    pub seed: Arc<dyn SeedSource>,
    /// How a fetched seed list combines with existing todos
    pub seed_policy: SeedPolicy,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment` with the default seed policy
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, storage: Arc<dyn TodoStorage>, seed: Arc<dyn SeedSource>) -> Self {
        Self {
            clock,
            storage,
            seed,
            seed_policy: SeedPolicy::default(),
        }
    }

    /// Sets the seed policy
    #[must_use]
    pub const fn with_seed_policy(mut self, policy: SeedPolicy) -> Self {
        self.seed_policy = policy;
        self
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Bumps the revision and describes saving the resulting snapshot
    fn persist(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        state.revision += 1;
        let snapshot = state.snapshot();
        let storage = Arc::clone(&env.storage);

        smallvec![Effect::future(async move {
            let revision = snapshot.revision;
            if let Err(error) = storage.save(snapshot).await {
                // The in-memory change stands; the next save carries it again
                tracing::error!(revision, error = %error, "Failed to persist todos");
            }
            None
        })]
    }

    fn add(state: &mut TodoState, title: &str, env: &TodoEnvironment) -> Effects {
        let Some(title) = normalize_title(title) else {
            tracing::debug!("Ignoring add with blank title");
            return SmallVec::new();
        };

        let Some(id) = state.allocate_id() else {
            tracing::warn!(next_id = state.next_id, "Local ids exhausted, ignoring add");
            return SmallVec::new();
        };
        tracing::debug!(id = %id, "Adding todo");
        state.todos.insert(0, TodoItem::new(id, title, env.clock.now()));
        Self::persist(state, env)
    }

    fn toggle(state: &mut TodoState, id: &TodoId, env: &TodoEnvironment) -> Effects {
        let now = env.clock.now();
        let Some(todo) = state.get_mut(id) else {
            tracing::debug!(id = %id, "Ignoring toggle of unknown todo");
            return SmallVec::new();
        };

        todo.toggle(now);
        Self::persist(state, env)
    }

    fn edit(state: &mut TodoState, id: &TodoId, title: &str, env: &TodoEnvironment) -> Effects {
        let Some(title) = normalize_title(title) else {
            tracing::debug!(id = %id, "Ignoring edit with blank title");
            return SmallVec::new();
        };
        let now = env.clock.now();
        let Some(todo) = state.get_mut(id) else {
            tracing::debug!(id = %id, "Ignoring edit of unknown todo");
            return SmallVec::new();
        };

        todo.rename(title, now);
        Self::persist(state, env)
    }

    fn delete(state: &mut TodoState, id: &TodoId, env: &TodoEnvironment) -> Effects {
        let before = state.todos.len();
        state.todos.retain(|todo| &todo.id != id);
        if state.todos.len() == before {
            tracing::debug!(id = %id, "Ignoring delete of unknown todo");
            return SmallVec::new();
        }

        Self::persist(state, env)
    }

    fn toggle_all(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        if state.todos.is_empty() {
            return SmallVec::new();
        }

        let completed = !state.all_completed();
        let now = env.clock.now();
        for todo in &mut state.todos {
            todo.set_completed(completed, now);
        }
        Self::persist(state, env)
    }

    fn clear_completed(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        if state.completed_count() == 0 {
            return SmallVec::new();
        }

        state.todos.retain(|todo| !todo.completed);
        Self::persist(state, env)
    }

    fn load_seed(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        if state.loading {
            tracing::debug!("Seed fetch already in flight");
            return SmallVec::new();
        }

        state.loading = true;
        let seed = Arc::clone(&env.seed);
        let clock = Arc::clone(&env.clock);

        smallvec![Effect::future(async move {
            Some(match seed.fetch_seed().await {
                Ok(items) => TodoAction::SeedLoaded {
                    items,
                    fetched_at: clock.now(),
                },
                Err(error) => TodoAction::SeedFailed {
                    reason: error.to_string(),
                },
            })
        })]
    }

    fn seed_loaded(
        state: &mut TodoState,
        items: Vec<SeedTodo>,
        fetched_at: chrono::DateTime<chrono::Utc>,
        env: &TodoEnvironment,
    ) -> Effects {
        state.loading = false;
        let seeded = normalize_seed(items, fetched_at);

        match env.seed_policy {
            SeedPolicy::Replace => {
                tracing::info!(count = seeded.len(), "Replacing todos with seed list");
                state.todos = seeded;
            },
            SeedPolicy::Merge => {
                let fresh: Vec<TodoItem> = seeded
                    .into_iter()
                    .filter(|todo| !state.exists(&todo.id))
                    .collect();
                tracing::info!(count = fresh.len(), "Merging seed list into todos");
                state.todos.extend(fresh);
            },
        }

        state.reserve_seen_ids();
        Self::persist(state, env)
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) -> Effects {
        match action {
            // ========== Intents ==========
            TodoAction::Add { title } => Self::add(state, &title, env),
            TodoAction::Toggle { id } => Self::toggle(state, &id, env),
            TodoAction::Edit { id, title } => Self::edit(state, &id, &title, env),
            TodoAction::Delete { id } => Self::delete(state, &id, env),
            TodoAction::ToggleAll => Self::toggle_all(state, env),
            TodoAction::ClearCompleted => Self::clear_completed(state, env),

            TodoAction::SetFilter { filter } => {
                state.filter = filter;
                SmallVec::new()
            },
            TodoAction::SetSort { sort } => {
                state.sort = sort;
                SmallVec::new()
            },
            TodoAction::ToggleSort => {
                state.sort = state.sort.toggled();
                SmallVec::new()
            },
            TodoAction::SetSearch { text } => {
                state.search = text;
                SmallVec::new()
            },

            TodoAction::LoadSeed => Self::load_seed(state, env),

            // ========== Effect results ==========
            TodoAction::SeedLoaded { items, fetched_at } => {
                Self::seed_loaded(state, items, fetched_at, env)
            },
            TodoAction::SeedFailed { reason } => {
                tracing::warn!(reason = %reason, "Seed fetch failed, keeping current todos");
                state.loading = false;
                SmallVec::new()
            },
        }
    }
}
