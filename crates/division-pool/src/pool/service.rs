use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::choices::ChoiceStore;
use super::domain::{Choice, LeaderboardEntry, Person, PredictionRow, SubjectId};
use super::ingest::{load_or_empty, BulkSource, LoadedData};
use super::ranking::{bottom, rank, top, MovementTracker};
use super::scoring::score;
use super::store::{PoolGateway, StoreError};
use super::views::{LeaderboardView, LoadSummary, RosterEntry};
use crate::config::PoolConfig;

/// Leaderboard shape and the categories offered to callers.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub slice_size: usize,
    pub categories: Vec<String>,
}

impl From<&PoolConfig> for PoolSettings {
    fn from(config: &PoolConfig) -> Self {
        Self {
            slice_size: config.slice_size,
            categories: config.categories.clone(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings::from(&PoolConfig::default())
    }
}

#[derive(Debug, Default)]
struct PoolState {
    people: Vec<Person>,
    predictions: Vec<PredictionRow>,
    choices: Vec<Choice>,
    tracker: MovementTracker,
}

impl PoolState {
    fn refresh(&mut self) {
        let scoreboard = score(&self.choices, &self.predictions);
        self.tracker.advance(rank(&scoreboard));
    }

    fn summary(&self) -> LoadSummary {
        LoadSummary {
            people: self.people.len(),
            predictors: self.predictions.len(),
            choices: self.choices.len(),
        }
    }
}

/// Service composing the gateway, the bulk sources, scoring and ranking.
///
/// Every mutation persists first and only then replaces the in-memory snapshot, so a
/// failed write leaves the previous leaderboard in place.
pub struct PoolService<G, S> {
    gateway: Arc<G>,
    choices: ChoiceStore<G>,
    source: Arc<S>,
    settings: PoolSettings,
    state: Mutex<PoolState>,
}

impl<G, S> PoolService<G, S>
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    pub fn new(gateway: Arc<G>, source: Arc<S>, settings: PoolSettings) -> Self {
        Self {
            choices: ChoiceStore::new(Arc::clone(&gateway)),
            gateway,
            source,
            settings,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Load the bulk sources into storage and pick up any saved choices.
    ///
    /// A failed roster or predictions write is logged and the loaded sources are still
    /// served from memory.
    pub fn bootstrap(&self) -> Result<LoadSummary, PoolServiceError> {
        let mut state = self.lock()?;
        let LoadedData {
            people,
            predictions,
        } = load_or_empty(self.source.as_ref());
        if let Err(err) = self.persist_reference_data(&people, &predictions) {
            warn!(error = %err, "reference data not persisted; serving sources from memory");
        }

        let choices = self.choices.try_get_all().unwrap_or_else(|err| {
            warn!(error = %err, "saved choices unavailable; starting with none");
            Vec::new()
        });

        state.people = people;
        state.predictions = predictions;
        state.choices = choices;
        state.refresh();

        let summary = state.summary();
        info!(
            people = summary.people,
            predictors = summary.predictors,
            choices = summary.choices,
            "pool initialized"
        );
        Ok(summary)
    }

    /// Confirm or update the category chosen for a roster member.
    pub fn confirm(
        &self,
        subject_id: SubjectId,
        category: &str,
    ) -> Result<Choice, PoolServiceError> {
        let mut state = self.lock()?;
        let subject_name = state
            .people
            .iter()
            .find(|person| person.id == subject_id)
            .map(|person| person.name.clone())
            .ok_or(PoolServiceError::UnknownSubject(subject_id))?;

        if !self.choices.upsert(subject_id, &subject_name, category) {
            return Err(PoolServiceError::SaveFailed(subject_id));
        }

        let choices = self.choices.try_get_all()?;
        let saved = choices
            .iter()
            .find(|choice| choice.subject_id == subject_id)
            .cloned()
            .ok_or(PoolServiceError::SaveFailed(subject_id))?;

        state.choices = choices;
        state.refresh();
        info!(subject_id, category = %saved.category, "choice confirmed");
        Ok(saved)
    }

    /// Clear every collection, then reload roster and predictions. Choices stay empty.
    pub fn reset(&self) -> Result<LoadSummary, PoolServiceError> {
        let mut state = self.lock()?;
        if !self.choices.clear() {
            return Err(PoolServiceError::ResetFailed);
        }

        let LoadedData {
            people,
            predictions,
        } = load_or_empty(self.source.as_ref());
        if let Err(err) = self.persist_reference_data(&people, &predictions) {
            warn!(error = %err, "reset could not reload reference data");
            return Err(err.into());
        }

        state.people = people;
        state.predictions = predictions;
        state.choices = Vec::new();
        state.refresh();

        let summary = state.summary();
        info!(
            people = summary.people,
            predictors = summary.predictors,
            "pool reset and reloaded"
        );
        Ok(summary)
    }

    /// Full ranking with movement against the ranking before the last mutation.
    pub fn ranking(&self) -> Result<Vec<LeaderboardEntry>, PoolServiceError> {
        Ok(self.lock()?.tracker.entries())
    }

    pub fn leaderboard(&self, size: Option<usize>) -> Result<LeaderboardView, PoolServiceError> {
        let state = self.lock()?;
        let size = size.unwrap_or(self.settings.slice_size);
        let entries = state.tracker.entries();

        Ok(LeaderboardView {
            top: top(&entries, size),
            bottom: bottom(&entries, size),
            predictors: entries.len(),
            chosen: state.choices.len(),
            roster: state.people.len(),
        })
    }

    pub fn choices(&self) -> Result<Vec<Choice>, PoolServiceError> {
        Ok(self.lock()?.choices.clone())
    }

    /// Roster members whose name contains `search`, ignoring case.
    pub fn roster(&self, search: Option<&str>) -> Result<Vec<RosterEntry>, PoolServiceError> {
        let state = self.lock()?;
        let needle = search
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());

        Ok(state
            .people
            .iter()
            .filter(|person| match &needle {
                Some(term) => person.name.to_lowercase().contains(term.as_str()),
                None => true,
            })
            .map(|person| RosterEntry {
                person: person.clone(),
                chosen_category: state
                    .choices
                    .iter()
                    .find(|choice| choice.subject_id == person.id)
                    .map(|choice| choice.category.clone()),
            })
            .collect())
    }

    pub fn categories(&self) -> &[String] {
        &self.settings.categories
    }

    pub fn accepts_category(&self, category: &str) -> bool {
        self.settings.categories.iter().any(|known| known == category)
    }

    fn persist_reference_data(
        &self,
        people: &[Person],
        predictions: &[PredictionRow],
    ) -> Result<(), StoreError> {
        self.gateway.write_people(people)?;
        self.gateway.write_predictions(predictions)
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>, PoolServiceError> {
        self.state
            .lock()
            .map_err(|_| PoolServiceError::Unavailable)
    }
}

/// Error raised by the pool service.
#[derive(Debug, thiserror::Error)]
pub enum PoolServiceError {
    #[error("subject {0} is not on the roster")]
    UnknownSubject(SubjectId),
    #[error("choice for subject {0} could not be saved")]
    SaveFailed(SubjectId),
    #[error("pool storage could not be reset")]
    ResetFailed,
    #[error("pool state unavailable")]
    Unavailable,
    #[error(transparent)]
    Store(#[from] StoreError),
}
