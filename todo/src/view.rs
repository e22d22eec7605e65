//! Derived view: the ordered list a front end renders.
//!
//! [`compute_view`] is a pure function of the collection and the session
//! settings. It never mutates its input and always returns the same ordering
//! for the same inputs, so callers can recompute it on every render.

use std::cmp::Reverse;

use crate::types::{Filter, SortOrder, TodoItem};

/// Filters, searches and sorts `todos` into a new list.
///
/// 1. Keep todos matching `filter`.
/// 2. If `search` is not blank, keep todos whose title contains the search
///    text as typed, ignoring case. Surrounding spaces are part of the match.
/// 3. Sort by `sort`. Sorting is stable, so ties keep collection order.
///    [`SortOrder::Id`] orders numeric ids ascending and puts non-numeric ids
///    last; [`SortOrder::Recent`] orders by `created_at`, newest first.
#[must_use]
pub fn compute_view(todos: &[TodoItem], filter: Filter, search: &str, sort: SortOrder) -> Vec<TodoItem> {
    let blank = search.trim().is_empty();
    let needle = search.to_lowercase();

    let mut view: Vec<TodoItem> = todos
        .iter()
        .filter(|todo| filter.matches(todo))
        .filter(|todo| blank || todo.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match sort {
        SortOrder::Id => view.sort_by_key(id_sort_key),
        SortOrder::Recent => view.sort_by_key(|todo| Reverse(todo.created_at)),
    }

    view
}

fn id_sort_key(todo: &TodoItem) -> (bool, u64) {
    todo.id.numeric().map_or((true, 0), |n| (false, n))
}

/// Counts shown under the list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewSummary {
    /// Todos in the collection
    pub total: usize,
    /// Completed todos in the collection
    pub completed: usize,
    /// Open todos in the collection
    pub active: usize,
    /// Todos in the derived view
    pub shown: usize,
}

impl ViewSummary {
    /// Summarizes `todos`, with `shown` taken from the derived view
    #[must_use]
    pub fn new(todos: &[TodoItem], shown: usize) -> Self {
        let completed = todos.iter().filter(|t| t.completed).count();
        Self {
            total: todos.len(),
            completed,
            active: todos.len() - completed,
            shown,
        }
    }
}

impl std::fmt::Display for ViewSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total: {} | Completed: {} | Showing: {}",
            self.total, self.completed, self.shown
        )
    }
}
