//! Pocket Todo: a todo list with local persistence and a remote seed list.
//!
//! Users add, edit, complete, delete, filter, search and sort short text
//! tasks. The collection is saved locally as a single snapshot and can be
//! seeded from a remote list on first start.
//!
//! - [`types`]: todos, session settings and the actions that change them
//! - [`reducer`]: the update rules, run by the runtime `Store`
//! - [`view`]: the derived list a front end renders
//! - [`storage`] and [`seed`]: the persistence adapter and remote loader
//! - [`cli`]: the terminal front end
//!
//! # Quick Start
//!
//! ```no_run
//! use pocket_todo::mocks::{InMemoryStorage, StaticSeedSource};
//! use pocket_todo::{TodoAction, TodoEnvironment, TodoReducer, TodoState};
//! use pocket_todo_core::environment::SystemClock;
//! use pocket_todo_runtime::Store;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodoEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(InMemoryStorage::new()),
//!     Arc::new(StaticSeedSource::empty()),
//! );
//! let store = Store::new(TodoState::new(), TodoReducer::new(), env);
//!
//! store.send(TodoAction::Add { title: "Buy milk".to_string() }).await?;
//!
//! let view = store.state(TodoState::view).await;
//! println!("{} todos shown", view.len());
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;
pub mod mocks;
pub mod reducer;
pub mod seed;
pub mod storage;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use bootstrap::TodoStore;
pub use config::Config;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use seed::{HttpSeedSource, SeedError, SeedSource, SeedTodo};
pub use storage::{JsonFileStorage, StorageError, TodoStorage};
pub use types::{Filter, SeedPolicy, SortOrder, Snapshot, TodoAction, TodoId, TodoItem, TodoState};
pub use view::{ViewSummary, compute_view};
