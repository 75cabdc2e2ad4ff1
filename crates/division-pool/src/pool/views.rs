use serde::Serialize;

use super::domain::{LeaderboardEntry, Person};

/// Best and worst slices of the current ranking plus progress counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    pub top: Vec<LeaderboardEntry>,
    pub bottom: Vec<LeaderboardEntry>,
    pub predictors: usize,
    pub chosen: usize,
    pub roster: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub person: Person,
    pub chosen_category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub people: usize,
    pub predictors: usize,
    pub choices: usize,
}
