use std::sync::{Mutex, MutexGuard};

use super::{apply_upsert, PoolGateway, StoreError};
use crate::pool::domain::{Choice, ChoiceDraft, Person, PredictionRow};

#[derive(Debug, Default)]
struct Collections {
    choices: Vec<Choice>,
    people: Vec<Person>,
    predictions: Vec<PredictionRow>,
}

/// Process-local gateway for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    collections: Mutex<Collections>,
}

impl InMemoryGateway {
    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }
}

impl PoolGateway for InMemoryGateway {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError> {
        Ok(self.lock()?.choices.clone())
    }

    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError> {
        self.lock()?.choices = choices.to_vec();
        Ok(())
    }

    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError> {
        let mut guard = self.lock()?;
        Ok(apply_upsert(&mut guard.choices, draft))
    }

    fn read_people(&self) -> Result<Vec<Person>, StoreError> {
        Ok(self.lock()?.people.clone())
    }

    fn write_people(&self, people: &[Person]) -> Result<(), StoreError> {
        self.lock()?.people = people.to_vec();
        Ok(())
    }

    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError> {
        Ok(self.lock()?.predictions.clone())
    }

    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError> {
        self.lock()?.predictions = rows.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = Collections::default();
        Ok(())
    }
}
