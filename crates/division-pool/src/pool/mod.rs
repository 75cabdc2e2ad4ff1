//! Division assignment pool: roster choices, prediction scoring, and the leaderboard.
//!
//! Choices flow through the [`ChoiceStore`] into a [`PoolGateway`]; every mutation
//! re-scores the static prediction table from scratch and ranks the result against the
//! previous ranking to report movement.

pub mod choices;
pub mod domain;
pub mod ingest;
mod normalizer;
pub mod ranking;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use choices::ChoiceStore;
pub use domain::{
    Choice, ChoiceDraft, LeaderboardEntry, Movement, Person, PredictionRow, RankedEntry,
    ScoredPredictor, SubjectId, SubjectKey,
};
pub use ingest::{BulkSource, CsvFileSource, IngestError, InlineSource};
pub use ranking::{classify_movement, rank, MovementTracker, Ranking};
pub use router::pool_router;
pub use scoring::{score, Scoreboard};
pub use service::{PoolService, PoolServiceError, PoolSettings};
pub use store::{InMemoryGateway, JsonFileGateway, PoolGateway, SqliteGateway, StoreError};
pub use views::{LeaderboardView, LoadSummary, RosterEntry};
