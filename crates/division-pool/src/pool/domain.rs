use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::normalizer::normalize_subject;

/// Roster identifier of a person whose category is being predicted.
pub type SubjectId = i64;

/// Case-folded subject name used to join choices against prediction columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn from_name(name: &str) -> Self {
        Self(normalize_subject(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roster entry. Reference data, never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: SubjectId,
    pub name: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
}

/// Authoritative category assignment for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: i64,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

/// Input to an upsert; the store decides the choice id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDraft {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub category: String,
    pub recorded_at: DateTime<Utc>,
}

/// One predictor's guesses keyed by normalized subject name. Blank cells are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    pub predictor_name: String,
    pub guesses: BTreeMap<SubjectKey, String>,
}

impl PredictionRow {
    pub fn new(predictor_name: impl Into<String>) -> Self {
        Self {
            predictor_name: predictor_name.into(),
            guesses: BTreeMap::new(),
        }
    }

    /// Builder used by fixtures and ingestion. Blank categories are dropped.
    pub fn with_guess(mut self, subject_name: &str, category: &str) -> Self {
        self.insert_guess(subject_name, category);
        self
    }

    pub fn insert_guess(&mut self, subject_name: &str, category: &str) {
        let category = category.trim();
        if category.is_empty() {
            return;
        }
        self.guesses
            .insert(SubjectKey::from_name(subject_name), category.to_string());
    }

    pub fn guess_for(&self, key: &SubjectKey) -> Option<&str> {
        self.guesses.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPredictor {
    pub predictor_name: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub predictor_name: String,
    pub points: u32,
    pub rank: usize,
}

/// Position change of a predictor between two successive rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    New,
    Up,
    Down,
    Same,
}

impl Movement {
    pub fn label(&self) -> &'static str {
        match self {
            Movement::New => "NEW",
            Movement::Up => "up",
            Movement::Down => "down",
            Movement::Same => "same",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub entry: RankedEntry,
    pub movement: Movement,
}
