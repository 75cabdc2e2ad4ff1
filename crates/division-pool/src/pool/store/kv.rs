use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{
    apply_upsert, collection_name, PoolGateway, StoreError, CHOICES, PEOPLE, PREDICTIONS,
};
use crate::pool::domain::{Choice, ChoiceDraft, Person, PredictionRow};

/// Key-value gateway: one JSON document per collection inside a directory.
///
/// Writes go to a sibling temp file and are renamed into place, so a reader never sees a
/// half-written collection.
#[derive(Debug)]
pub struct JsonFileGateway {
    root: PathBuf,
    namespace: String,
    write_lock: Mutex<()>,
}

impl JsonFileGateway {
    pub fn open(root: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            namespace: namespace.to_string(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", collection_name(&self.namespace, collection)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("json store lock poisoned".to_string()))
    }

    fn read<T: DeserializeOwned>(&self, collection: &'static str) -> Result<Vec<T>, StoreError> {
        let path = self.path_for(collection);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode { collection, source })
    }

    fn write<T: Serialize>(&self, collection: &'static str, records: &[T]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(records)
            .map_err(|source| StoreError::Encode { collection, source })?;
        let path = self.path_for(collection);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &path)?;
        debug!(path = %path.display(), records = records.len(), "collection written");
        Ok(())
    }

    fn remove(&self, collection: &'static str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(collection)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl PoolGateway for JsonFileGateway {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError> {
        self.read(CHOICES)
    }

    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.write(CHOICES, choices)
    }

    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError> {
        let _guard = self.lock()?;
        let mut choices: Vec<Choice> = self.read(CHOICES)?;
        let choice = apply_upsert(&mut choices, draft);
        self.write(CHOICES, &choices)?;
        Ok(choice)
    }

    fn read_people(&self) -> Result<Vec<Person>, StoreError> {
        self.read(PEOPLE)
    }

    fn write_people(&self, people: &[Person]) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.write(PEOPLE, people)
    }

    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError> {
        self.read(PREDICTIONS)
    }

    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.write(PREDICTIONS, rows)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        self.remove(CHOICES)?;
        self.remove(PEOPLE)?;
        self.remove(PREDICTIONS)
    }
}
