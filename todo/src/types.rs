//! Domain types for the todo list.
//!
//! A todo list is an ordered collection of [`TodoItem`]s (most recently added
//! first) plus session-only view settings. Everything a user can do is a
//! [`TodoAction`]; the reducer is the only code that mutates [`TodoState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::seed::SeedTodo;
use crate::view::{self, ViewSummary};

/// Version written into every persisted [`Snapshot`]
pub const SNAPSHOT_VERSION: u32 = 1;

/// Unique identifier for a todo item
///
/// Ids are opaque strings. Locally created todos get decimal ids from a
/// counter; ids coming from the seed source are kept as they arrive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Creates a `TodoId` from any string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric interpretation of the id, if it is a plain decimal integer
    #[must_use]
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for TodoId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// Display text, never blank
    pub title: String,
    /// Whether the todo is completed
    pub completed: bool,
    /// When the todo was created
    pub created_at: DateTime<Utc>,
    /// When the todo was last changed
    pub updated_at: DateTime<Utc>,
}

impl TodoItem {
    /// Creates an open todo item stamped with `now`
    #[must_use]
    pub const fn new(id: TodoId, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flips the completion flag
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Sets the completion flag
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.touch(now);
    }

    /// Replaces the title; callers pass an already validated title
    pub fn rename(&mut self, title: String, now: DateTime<Utc>) {
        self.title = title;
        self.touch(now);
    }

    // updated_at never moves backwards, even if the clock jumps back
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }
}

/// Returns the trimmed title, or `None` if nothing is left after trimming
#[must_use]
pub fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Error returned when parsing a filter, sort order or seed policy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseOptionError {
    /// What was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
    /// Accepted spellings
    pub expected: &'static str,
}

/// Which todos the view shows, by completion state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every todo
    #[default]
    All,
    /// Todos not yet completed (also accepted as "pending")
    #[serde(alias = "pending")]
    Active,
    /// Completed todos
    Completed,
}

impl Filter {
    /// Whether `todo` passes this filter
    #[must_use]
    pub const fn matches(self, todo: &TodoItem) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

impl FromStr for Filter {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "pending" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(ParseOptionError {
                kind: "filter",
                value: s.to_string(),
                expected: "all, active, pending, completed",
            }),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        })
    }
}

/// Ordering of the derived view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending numeric id (insertion order for local todos)
    #[default]
    Id,
    /// Newest `created_at` first
    Recent,
}

impl SortOrder {
    /// The other sort order
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Id => Self::Recent,
            Self::Recent => Self::Id,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "recent" => Ok(Self::Recent),
            _ => Err(ParseOptionError {
                kind: "sort order",
                value: s.to_string(),
                expected: "id, recent",
            }),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Id => "ID",
            Self::Recent => "Recent",
        })
    }
}

/// How a successful seed fetch combines with todos already in the store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// The fetched set replaces the whole collection
    #[default]
    Replace,
    /// Local todos are kept; fetched todos with unseen ids are appended
    Merge,
}

impl FromStr for SeedPolicy {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            _ => Err(ParseOptionError {
                kind: "seed policy",
                value: s.to_string(),
                expected: "replace, merge",
            }),
        }
    }
}

impl std::fmt::Display for SeedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Merge => "merge",
        })
    }
}

/// The persisted form of the collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    /// Increases with every persisted change; newer snapshots win
    #[serde(default)]
    pub revision: u64,
    /// Next local id to hand out
    #[serde(default)]
    pub next_id: u64,
    /// The collection, head first
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

const fn default_snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    /// Snapshot of an empty collection
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            revision: 0,
            next_id: 1,
            todos: Vec::new(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// State of the todo list
///
/// `todos`, `next_id` and `revision` are persisted; the rest is session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoState {
    /// All todos, most recently added first
    pub todos: Vec<TodoItem>,
    /// Next local id; greater than every numeric id ever held
    pub next_id: u64,
    /// Revision of the last persisted change
    pub revision: u64,
    /// Active completion filter
    pub filter: Filter,
    /// Active sort order
    pub sort: SortOrder,
    /// Free-text search, matched case-insensitively against titles
    pub search: String,
    /// True while a seed fetch is in flight
    pub loading: bool,
}

impl Default for TodoState {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            todos: Vec::new(),
            next_id: 1,
            revision: 0,
            filter: Filter::All,
            sort: SortOrder::Id,
            search: String::new(),
            loading: false,
        }
    }

    /// Rebuilds state from a persisted snapshot
    ///
    /// Duplicate ids keep their first occurrence, and `next_id` is raised past
    /// every numeric id so new todos can never collide with stored ones.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut seen = HashSet::new();
        let todos: Vec<TodoItem> = snapshot
            .todos
            .into_iter()
            .filter(|todo| seen.insert(todo.id.clone()))
            .collect();

        let mut state = Self {
            todos,
            next_id: snapshot.next_id.max(1),
            revision: snapshot.revision,
            ..Self::new()
        };
        state.reserve_seen_ids();
        state
    }

    /// The persisted part of the state
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            revision: self.revision,
            next_id: self.next_id,
            todos: self.todos.clone(),
        }
    }

    /// Hands out the next local id
    ///
    /// Returns `None` once the counter is exhausted. `u64::MAX` itself is never
    /// handed out, so a collection holding it cannot collide with a local id.
    pub fn allocate_id(&mut self) -> Option<TodoId> {
        let next = self.next_id.checked_add(1)?;
        let id = TodoId::from(self.next_id);
        self.next_id = next;
        Some(id)
    }

    /// Raises `next_id` above every numeric id in the collection
    ///
    /// An id of `u64::MAX` has no successor and is skipped.
    pub fn reserve_seen_ids(&mut self) {
        let highest = self
            .todos
            .iter()
            .filter_map(|t| t.id.numeric())
            .filter(|&n| n < u64::MAX)
            .max();
        if let Some(highest) = highest {
            self.next_id = self.next_id.max(highest + 1);
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns the number of open todos
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.count() - self.completed_count()
    }

    /// True when the collection is non-empty and every todo is completed
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(|t| t.completed)
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Returns a mutable todo by ID
    pub fn get_mut(&mut self, id: &TodoId) -> Option<&mut TodoItem> {
        self.todos.iter_mut().find(|t| &t.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }

    /// The list to render for the current filter, search and sort order
    #[must_use]
    pub fn view(&self) -> Vec<TodoItem> {
        view::compute_view(&self.todos, self.filter, &self.search, self.sort)
    }

    /// Counts for the status line
    #[must_use]
    pub fn summary(&self) -> ViewSummary {
        ViewSummary::new(&self.todos, self.view().len())
    }
}

/// Actions for the todo list
///
/// User intents come first; the remaining variants are produced by effects
/// and fed back into the reducer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== Intents ==========
    /// Add a todo at the head of the list
    Add {
        /// Title as typed; trimmed before use
        title: String,
    },

    /// Flip a todo's completion flag
    Toggle {
        /// Todo to toggle
        id: TodoId,
    },

    /// Replace a todo's title
    Edit {
        /// Todo to edit
        id: TodoId,
        /// New title as typed; trimmed before use
        title: String,
    },

    /// Remove a todo
    Delete {
        /// Todo to delete
        id: TodoId,
    },

    /// Complete everything, or reopen everything if all are complete
    ToggleAll,

    /// Remove every completed todo
    ClearCompleted,

    /// Change the completion filter
    SetFilter {
        /// New filter
        filter: Filter,
    },

    /// Change the sort order
    SetSort {
        /// New sort order
        sort: SortOrder,
    },

    /// Switch to the other sort order
    ToggleSort,

    /// Change the search text
    SetSearch {
        /// New search text; blank clears the search
        text: String,
    },

    /// Fetch the remote seed list
    LoadSeed,

    // ========== Effect results ==========
    /// The seed fetch succeeded
    SeedLoaded {
        /// Records as returned by the seed source
        items: Vec<SeedTodo>,
        /// When the fetch completed
        fetched_at: DateTime<Utc>,
    },

    /// The seed fetch failed
    SeedFailed {
        /// Human readable failure
        reason: String,
    },
}
