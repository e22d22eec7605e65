//! Terminal front end: line commands in, rendered list out.
//!
//! The front end only sends intents and reads state; it never touches storage.

use pocket_todo_runtime::{EffectHandle, StoreError};
use thiserror::Error;

use crate::bootstrap::TodoStore;
use crate::types::{Filter, ParseOptionError, SortOrder, TodoAction, TodoId, TodoState};

/// Usage text printed by `help` and after an unknown command
pub const HELP: &str = "\
Commands:
  add <title>               add a todo
  toggle <id>               complete or reopen a todo
  edit <id> <title>         rename a todo
  delete <id>               delete a todo
  toggle-all                complete everything, or reopen everything
  clear-completed           delete completed todos
  filter <all|active|completed>
  sort [id|recent]          set the order, or switch it when no order is given
  search [text]             filter by title; no text clears the search
  seed                      fetch todos from the remote list
  list                      show the list
  help                      show this help
  quit                      exit";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `add <title>`
    Add(String),
    /// `toggle <id>`
    Toggle(TodoId),
    /// `edit <id> <title>`
    Edit {
        /// Todo to edit
        id: TodoId,
        /// New title
        title: String,
    },
    /// `delete <id>`
    Delete(TodoId),
    /// `toggle-all`
    ToggleAll,
    /// `clear-completed`
    ClearCompleted,
    /// `filter <filter>`
    Filter(Filter),
    /// `sort <order>`
    Sort(SortOrder),
    /// `sort` without an order
    ToggleSort,
    /// `search [text]`
    Search(String),
    /// `seed`
    Seed,
    /// `list`
    List,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// Errors for input lines that are not a valid command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Nothing but whitespace
    #[error("empty command")]
    Empty,

    /// The first word is not a command
    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),

    /// A required argument is missing
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        /// The command
        command: &'static str,
        /// What is missing
        argument: &'static str,
    },

    /// An option argument could not be parsed
    #[error(transparent)]
    InvalidOption(#[from] ParseOptionError),
}

impl Command {
    /// Parses one input line
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why the line is not a command.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = split_word(line);
        if word.is_empty() {
            return Err(CommandError::Empty);
        }

        let command = match word.to_ascii_lowercase().as_str() {
            "add" => Self::Add(required(rest, "add", "a title")?.to_string()),
            "toggle" => Self::Toggle(TodoId::from(required(rest, "toggle", "an id")?)),
            "edit" => {
                let (id, title) = split_word(required(rest, "edit", "an id")?);
                let title = required(title, "edit", "a title")?;
                Self::Edit {
                    id: TodoId::from(id),
                    title: title.to_string(),
                }
            },
            "delete" | "rm" => Self::Delete(TodoId::from(required(rest, "delete", "an id")?)),
            "toggle-all" => Self::ToggleAll,
            "clear-completed" => Self::ClearCompleted,
            "filter" => Self::Filter(required(rest, "filter", "a filter")?.parse()?),
            "sort" if rest.is_empty() => Self::ToggleSort,
            "sort" => Self::Sort(rest.parse()?),
            "search" => Self::Search(rest.to_string()),
            "seed" => Self::Seed,
            "list" | "ls" => Self::List,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };

        Ok(command)
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    s.split_once(char::is_whitespace)
        .map_or((s, ""), |(word, rest)| (word, rest.trim()))
}

fn required<'a>(
    value: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    if value.trim().is_empty() {
        Err(CommandError::MissingArgument { command, argument })
    } else {
        Ok(value.trim())
    }
}

/// What the front end should do after a command
#[derive(Debug)]
pub enum Outcome {
    /// An intent was sent; the handle tracks its effects
    Sent(EffectHandle),
    /// Show the list
    List,
    /// Show the help text
    Help,
    /// Exit
    Quit,
}

/// Sends the intent for `command` to the store
///
/// # Errors
///
/// Returns [`StoreError::ShutdownInProgress`] once the store is shutting down.
pub async fn dispatch(store: &TodoStore, command: Command) -> Result<Outcome, StoreError> {
    let action = match command {
        Command::List => return Ok(Outcome::List),
        Command::Help => return Ok(Outcome::Help),
        Command::Quit => return Ok(Outcome::Quit),
        Command::Add(title) => TodoAction::Add { title },
        Command::Toggle(id) => TodoAction::Toggle { id },
        Command::Edit { id, title } => TodoAction::Edit { id, title },
        Command::Delete(id) => TodoAction::Delete { id },
        Command::ToggleAll => TodoAction::ToggleAll,
        Command::ClearCompleted => TodoAction::ClearCompleted,
        Command::Filter(filter) => TodoAction::SetFilter { filter },
        Command::Sort(sort) => TodoAction::SetSort { sort },
        Command::ToggleSort => TodoAction::ToggleSort,
        Command::Search(text) => TodoAction::SetSearch { text },
        Command::Seed => TodoAction::LoadSeed,
    };

    Ok(Outcome::Sent(store.send(action).await?))
}

/// Renders the derived view with a header and the status line
#[must_use]
pub fn render(state: &TodoState) -> String {
    let view = state.view();
    let mut out = String::new();

    out.push_str(&format!("Filter: {} | Sort: {}", state.filter, state.sort));
    if !state.search.trim().is_empty() {
        out.push_str(&format!(" | Search: \"{}\"", state.search));
    }
    out.push('\n');

    if state.loading {
        out.push_str("  Loading todos...\n");
    }

    if view.is_empty() {
        out.push_str("  (no todos)\n");
    }
    for todo in &view {
        let mark = if todo.completed { 'x' } else { ' ' };
        out.push_str(&format!("  [{mark}] {:>4}  {}\n", todo.id, todo.title));
    }

    out.push_str(&state.summary().to_string());
    out
}

/// Message for a seed result, read against the state it produced
///
/// Counts come from the stored collection, after blank titles and duplicate
/// ids were dropped. Other actions have nothing to report.
#[must_use]
pub fn seed_report(action: &TodoAction, state: &TodoState) -> Option<String> {
    match action {
        TodoAction::SeedLoaded { .. } => Some(format!(
            "Loaded todos from the remote list, {} in total. Type 'list' to show them.",
            state.count()
        )),
        TodoAction::SeedFailed { reason } => Some(format!("Could not load todos: {reason}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedTodo;
    use crate::types::TodoItem;
    use pocket_todo_testing::test_time;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            Command::parse("add   Buy milk  "),
            Ok(Command::Add("Buy milk".to_string()))
        );
        assert_eq!(Command::parse("toggle 3"), Ok(Command::Toggle(TodoId::from(3))));
        assert_eq!(
            Command::parse("edit 3 Buy oat milk"),
            Ok(Command::Edit {
                id: TodoId::from(3),
                title: "Buy oat milk".to_string()
            })
        );
        assert_eq!(Command::parse("DELETE 7"), Ok(Command::Delete(TodoId::from(7))));
        assert_eq!(Command::parse("filter pending"), Ok(Command::Filter(Filter::Active)));
        assert_eq!(Command::parse("sort recent"), Ok(Command::Sort(SortOrder::Recent)));
        assert_eq!(Command::parse("sort"), Ok(Command::ToggleSort));
        assert_eq!(Command::parse("search"), Ok(Command::Search(String::new())));
        assert_eq!(Command::parse("search dog"), Ok(Command::Search("dog".to_string())));
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert!(matches!(
            Command::parse("add   "),
            Err(CommandError::MissingArgument { command: "add", .. })
        ));
        assert!(matches!(
            Command::parse("edit 3"),
            Err(CommandError::MissingArgument { command: "edit", .. })
        ));
        assert!(matches!(
            Command::parse("filter someday"),
            Err(CommandError::InvalidOption(_))
        ));
    }

    #[test]
    fn render_shows_view_and_summary() {
        let mut state = TodoState::new();
        let mut done = TodoItem::new(TodoId::from(1), "Buy milk".to_string(), test_time());
        done.completed = true;
        state.todos = vec![
            TodoItem::new(TodoId::from(2), "Walk dog".to_string(), test_time()),
            done,
        ];
        state.search = "dog".to_string();

        let out = render(&state);

        assert!(out.starts_with("Filter: All | Sort: ID | Search: \"dog\"\n"));
        assert!(out.contains("[ ]    2  Walk dog"));
        assert!(!out.contains("Buy milk"));
        assert!(out.ends_with("Total: 2 | Completed: 1 | Showing: 1"));
    }

    #[test]
    fn render_keeps_search_text_as_typed() {
        let state = TodoState {
            search: "dog ".to_string(),
            ..TodoState::new()
        };

        assert!(render(&state).starts_with("Filter: All | Sort: ID | Search: \"dog \"\n"));
    }

    #[test]
    fn seed_report_counts_stored_todos() {
        let mut state = TodoState::new();
        state.todos = vec![TodoItem::new(TodoId::from(1), "kept".to_string(), test_time())];
        let loaded = TodoAction::SeedLoaded {
            items: vec![
                SeedTodo {
                    id: TodoId::from(1),
                    title: "kept".to_string(),
                    completed: false,
                },
                SeedTodo {
                    id: TodoId::from(2),
                    title: "   ".to_string(),
                    completed: false,
                },
            ],
            fetched_at: test_time(),
        };

        let report = seed_report(&loaded, &state).unwrap();
        assert!(report.contains(", 1 in total."));

        let failed = TodoAction::SeedFailed {
            reason: "timeout".to_string(),
        };
        assert_eq!(
            seed_report(&failed, &state).as_deref(),
            Some("Could not load todos: timeout")
        );
        assert_eq!(seed_report(&TodoAction::ToggleAll, &state), None);
    }

    #[test]
    fn render_empty_and_loading() {
        let state = TodoState {
            loading: true,
            ..TodoState::new()
        };

        let out = render(&state);

        assert!(out.contains("Loading todos..."));
        assert!(out.contains("(no todos)"));
    }
}
