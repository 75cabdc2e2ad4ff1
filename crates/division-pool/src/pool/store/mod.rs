//! Persistence gateway for the three pool collections.
//!
//! Every backend keeps `choices` most-recently-created first. Updating an existing choice
//! keeps its id and its position; only new choices enter at the head.

mod kv;
mod memory;
mod sqlite;

pub use kv::JsonFileGateway;
pub use memory::InMemoryGateway;
pub use sqlite::SqliteGateway;

use super::domain::{Choice, ChoiceDraft, Person, PredictionRow};

pub const CHOICES: &str = "choices";
pub const PEOPLE: &str = "people";
pub const PREDICTIONS: &str = "predictions";

/// Storage abstraction so the pool service can run against any backend.
///
/// `read_choices` follows the key-value ordering: newest creation first, with updates
/// left in place rather than refreshed to the head as a `created_at DESC` query would.
pub trait PoolGateway: Send + Sync {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError>;
    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError>;
    /// Insert or overwrite the single choice held for `draft.subject_id`.
    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError>;
    fn read_people(&self) -> Result<Vec<Person>, StoreError>;
    fn write_people(&self, people: &[Person]) -> Result<(), StoreError>;
    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError>;
    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError>;
    /// Remove all three collections. The choices collection is emptied atomically.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("collection '{collection}' could not be decoded: {source}")]
    Decode {
        collection: &'static str,
        source: serde_json::Error,
    },
    #[error("collection '{collection}' could not be encoded: {source}")]
    Encode {
        collection: &'static str,
        source: serde_json::Error,
    },
    #[error("sqlite failure: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Fresh id derived from the record time, bumped past every id already in use.
pub(crate) fn next_choice_id(highest_in_use: i64, draft: &ChoiceDraft) -> i64 {
    draft.recorded_at.timestamp_millis().max(highest_in_use + 1)
}

/// Upsert over an in-memory collection, shared by the vector-backed gateways.
pub(crate) fn apply_upsert(choices: &mut Vec<Choice>, draft: ChoiceDraft) -> Choice {
    match choices
        .iter_mut()
        .find(|choice| choice.subject_id == draft.subject_id)
    {
        Some(existing) => {
            existing.subject_name = draft.subject_name;
            existing.category = draft.category;
            existing.timestamp = draft.recorded_at;
            existing.clone()
        }
        None => {
            let choice = Choice {
                id: next_choice_id(
                    choices.iter().map(|choice| choice.id).max().unwrap_or(0),
                    &draft,
                ),
                subject_id: draft.subject_id,
                subject_name: draft.subject_name,
                category: draft.category,
                timestamp: draft.recorded_at,
            };
            choices.insert(0, choice.clone());
            choice
        }
    }
}

/// Namespaced name of a collection, e.g. `sorteio_choices`.
pub(crate) fn collection_name(namespace: &str, collection: &str) -> String {
    let namespace: String = namespace
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{namespace}_{collection}")
}
