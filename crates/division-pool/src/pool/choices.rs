use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{Choice, ChoiceDraft, SubjectId};
use super::store::{PoolGateway, StoreError};

/// Upsert-by-subject access to the `choices` collection.
///
/// Failures are logged and reported as `false`; callers decide whether to retry.
pub struct ChoiceStore<G: ?Sized> {
    gateway: Arc<G>,
}

impl<G: ?Sized> Clone for ChoiceStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G> ChoiceStore<G>
where
    G: PoolGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn upsert(&self, subject_id: SubjectId, subject_name: &str, category: &str) -> bool {
        self.upsert_at(subject_id, subject_name, category, Utc::now())
    }

    pub fn upsert_at(
        &self,
        subject_id: SubjectId,
        subject_name: &str,
        category: &str,
        recorded_at: DateTime<Utc>,
    ) -> bool {
        let draft = ChoiceDraft {
            subject_id,
            subject_name: subject_name.to_string(),
            category: category.to_string(),
            recorded_at,
        };

        match self.gateway.upsert_choice(draft) {
            Ok(_) => true,
            Err(err) => {
                warn!(subject_id, error = %err, "failed to save choice");
                false
            }
        }
    }

    /// Most-recently-created first; empty when the store cannot be read.
    pub fn get_all(&self) -> Vec<Choice> {
        self.try_get_all().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read choices");
            Vec::new()
        })
    }

    pub fn try_get_all(&self) -> Result<Vec<Choice>, StoreError> {
        self.gateway.read_choices()
    }

    /// Reset every collection. `false` means nothing should be assumed cleared.
    pub fn clear(&self) -> bool {
        match self.gateway.clear() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to reset pool storage");
                false
            }
        }
    }
}
