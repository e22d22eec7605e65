//! Remote seed loader: a one-shot fetch of an initial todo list.
//!
//! The remote side is any read-only endpoint returning a JSON array of
//! `{id, title, completed}` records. Records are normalized into full
//! [`TodoItem`]s by [`normalize_seed`] once the fetch has completed.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pocket_todo_runtime::retry::{RetryPolicy, retry_transient};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::storage::StorageFuture;
use crate::types::{TodoId, TodoItem, normalize_title};

/// Default seed endpoint
pub const DEFAULT_SEED_URL: &str = "https://jsonplaceholder.typicode.com/todos";

/// A record as delivered by the seed source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTodo {
    /// Remote id; JSON numbers and strings are both accepted
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: TodoId,
    /// Remote title, not yet validated
    pub title: String,
    /// Remote completion flag
    #[serde(default)]
    pub completed: bool,
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<TodoId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => TodoId::from(n),
        RawId::Text(s) => TodoId::new(s),
    })
}

/// Errors raised while fetching the seed list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request did not complete (connection, timeout)
    #[error("seed request failed: {0}")]
    RequestFailed(String),

    /// The endpoint answered with a non-success status
    #[error("seed endpoint returned status {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
    },

    /// The body was not a list of seed records
    #[error("malformed seed response: {0}")]
    ResponseParseFailed(String),

    /// A non-HTTP source failed
    #[error("seed source unavailable: {0}")]
    Unavailable(String),
}

impl SeedError {
    /// Whether retrying the fetch could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) => true,
            Self::HttpStatus { status } => *status == 429 || *status >= 500,
            Self::Client(_) | Self::ResponseParseFailed(_) | Self::Unavailable(_) => false,
        }
    }
}

/// Source of the initial todo list
///
/// Returns boxed futures so the trait can be used as `Arc<dyn SeedSource>`.
pub trait SeedSource: Send + Sync {
    /// Fetches the seed records
    fn fetch_seed(&self) -> StorageFuture<'_, Result<Vec<SeedTodo>, SeedError>>;
}

/// Seed source backed by an HTTP GET
#[derive(Clone, Debug)]
pub struct HttpSeedSource {
    client: Client,
    url: String,
    limit: Option<u32>,
    retry_policy: RetryPolicy,
}

impl HttpSeedSource {
    /// Source fetching `url` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Client`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            limit: None,
            retry_policy: RetryPolicy::none(),
        })
    }

    /// Ask the endpoint for at most `limit` records (sent as `_limit`)
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Retry transient failures with `policy`
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn fetch_once(&self) -> Result<Vec<SeedTodo>, SeedError> {
        let mut request = self.client.get(&self.url);
        if let Some(limit) = self.limit {
            request = request.query(&[("_limit", limit)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SeedError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<SeedTodo>>()
                .await
                .map_err(|e| SeedError::ResponseParseFailed(e.to_string())),
            status => Err(SeedError::HttpStatus {
                status: status.as_u16(),
            }),
        }
    }
}

impl SeedSource for HttpSeedSource {
    fn fetch_seed(&self) -> StorageFuture<'_, Result<Vec<SeedTodo>, SeedError>> {
        Box::pin(async move {
            tracing::info!(url = %self.url, limit = ?self.limit, "Fetching seed todos");
            let items = retry_transient(
                &self.retry_policy,
                "fetch_seed",
                || self.fetch_once(),
                SeedError::is_transient,
            )
            .await?;
            tracing::info!(count = items.len(), "Fetched seed todos");
            Ok(items)
        })
    }
}

/// Turns seed records into todos stamped with `fetched_at`
///
/// Titles are trimmed; records with a blank title or an id already seen are
/// dropped.
#[must_use]
pub fn normalize_seed(items: Vec<SeedTodo>, fetched_at: DateTime<Utc>) -> Vec<TodoItem> {
    let mut seen = HashSet::new();
    let mut todos = Vec::with_capacity(items.len());

    for item in items {
        let Some(title) = normalize_title(&item.title) else {
            tracing::debug!(id = %item.id, "Dropping seed record with blank title");
            continue;
        };
        if !seen.insert(item.id.clone()) {
            tracing::debug!(id = %item.id, "Dropping seed record with duplicate id");
            continue;
        }

        let mut todo = TodoItem::new(item.id, title, fetched_at);
        todo.completed = item.completed;
        todos.push(todo);
    }

    todos
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_todo_testing::test_time;

    fn record(id: u64, title: &str, completed: bool) -> SeedTodo {
        SeedTodo {
            id: TodoId::from(id),
            title: title.to_string(),
            completed,
        }
    }

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        let json = r#"[
            {"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false},
            {"id": "x-2", "title": "quis ut nam", "completed": true},
            {"id": 3, "title": "no flag"}
        ]"#;

        let items: Vec<SeedTodo> = serde_json::from_str(json).unwrap();

        assert_eq!(items[0].id, TodoId::from(1));
        assert_eq!(items[1].id, TodoId::from("x-2"));
        assert!(items[1].completed);
        assert!(!items[2].completed);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let json = r#"[{"id": {"nested": true}, "title": "bad"}]"#;
        assert!(serde_json::from_str::<Vec<SeedTodo>>(json).is_err());
    }

    #[test]
    fn normalize_stamps_trims_and_dedupes() {
        let items = vec![
            record(1, "  first  ", true),
            record(2, "   ", false),
            record(1, "duplicate", false),
            record(3, "third", false),
        ];

        let todos = normalize_seed(items, test_time());

        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "first");
        assert!(todos[0].completed);
        assert_eq!(todos[0].created_at, test_time());
        assert_eq!(todos[0].updated_at, test_time());
        assert_eq!(todos[1].id, TodoId::from(3));
    }

    #[test]
    fn transient_classification() {
        assert!(SeedError::RequestFailed("timeout".into()).is_transient());
        assert!(SeedError::HttpStatus { status: 503 }.is_transient());
        assert!(SeedError::HttpStatus { status: 429 }.is_transient());
        assert!(!SeedError::HttpStatus { status: 404 }.is_transient());
        assert!(!SeedError::ResponseParseFailed("eof".into()).is_transient());
    }
}
