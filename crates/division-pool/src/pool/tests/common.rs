use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use crate::pool::domain::{Choice, ChoiceDraft, Person, PredictionRow};
use crate::pool::ingest::InlineSource;
use crate::pool::service::{PoolService, PoolSettings};
use crate::pool::store::{InMemoryGateway, PoolGateway, StoreError};

pub(super) const ROSTER_CSV: &str = "id,name,department,photo\n\
1,Ana Silva,Auditoria,ana.jpg\n\
2,Caio Lima,Controle,\n\
3,Duda Reis,Contabilidade,duda.png\n";

pub(super) const PREDICTIONS_CSV: &str = "Id,NOME COMPLETO,ANA SILVA,CAIO LIMA,DUDA REIS\n\
1,Bob,DCD,DTI,DIE\n\
2,Carol,DCI,DTI,\n\
3,Dani,DCD,,DIE\n";

pub(super) fn source() -> InlineSource {
    InlineSource {
        roster_csv: ROSTER_CSV.to_string(),
        predictions_csv: PREDICTIONS_CSV.to_string(),
    }
}

pub(super) fn settings() -> PoolSettings {
    PoolSettings {
        slice_size: 3,
        categories: ["DCD", "DCI", "DTI", "DIE"]
            .iter()
            .map(|category| category.to_string())
            .collect(),
    }
}

pub(super) type MemoryService = PoolService<InMemoryGateway, InlineSource>;

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<InMemoryGateway>) {
    let gateway = Arc::new(InMemoryGateway::default());
    let service = PoolService::new(gateway.clone(), Arc::new(source()), settings());
    service.bootstrap().expect("bootstrap succeeds");
    (Arc::new(service), gateway)
}

pub(super) fn draft(subject_id: i64, name: &str, category: &str, offset_secs: i64) -> ChoiceDraft {
    ChoiceDraft {
        subject_id,
        subject_name: name.to_string(),
        category: category.to_string(),
        recorded_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
            + Duration::seconds(offset_secs),
    }
}

pub(super) fn person(id: i64, name: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
        department: "Auditoria".to_string(),
        photo_ref: None,
    }
}

/// Gateway whose writes can be switched off to simulate an unavailable store.
#[derive(Default)]
pub(super) struct FlakyGateway {
    inner: InMemoryGateway,
    pub(super) fail_writes: AtomicBool,
    pub(super) fail_reference_writes: AtomicBool,
}

impl FlakyGateway {
    pub(super) fn failing(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail only the roster and predictions writes.
    pub(super) fn failing_reference_writes(&self, fail: bool) {
        self.fail_reference_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        Self::refuse_if(&self.fail_writes)
    }

    fn check_reference(&self) -> Result<(), StoreError> {
        Self::refuse_if(&self.fail_reference_writes)
    }

    fn refuse_if(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PoolGateway for FlakyGateway {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError> {
        self.inner.read_choices()
    }

    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError> {
        self.check()?;
        self.inner.write_choices(choices)
    }

    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError> {
        self.check()?;
        self.inner.upsert_choice(draft)
    }

    fn read_people(&self) -> Result<Vec<Person>, StoreError> {
        self.inner.read_people()
    }

    fn write_people(&self, people: &[Person]) -> Result<(), StoreError> {
        self.check_reference()?;
        self.inner.write_people(people)
    }

    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError> {
        self.inner.read_predictions()
    }

    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError> {
        self.check_reference()?;
        self.inner.write_predictions(rows)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.clear()
    }
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
