use division_pool::config::{PoolConfig, StorageBackend};
use division_pool::pool::{
    Choice, ChoiceDraft, CsvFileSource, InMemoryGateway, JsonFileGateway, Person, PoolGateway,
    PoolService, PoolSettings, PredictionRow, SqliteGateway, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type AppPoolService = PoolService<ConfiguredGateway, CsvFileSource>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) photo_dir: Arc<PathBuf>,
}

/// Backend chosen at startup via `POOL_STORAGE`.
pub(crate) enum ConfiguredGateway {
    Memory(InMemoryGateway),
    Json(JsonFileGateway),
    Sqlite(SqliteGateway),
}

impl ConfiguredGateway {
    pub(crate) fn open(config: &PoolConfig) -> Result<Self, StoreError> {
        Ok(match config.storage {
            StorageBackend::Memory => Self::Memory(InMemoryGateway::default()),
            StorageBackend::Json => {
                Self::Json(JsonFileGateway::open(&config.data_dir, &config.namespace)?)
            }
            StorageBackend::Sqlite => {
                std::fs::create_dir_all(&config.data_dir)?;
                let path = config.data_dir.join(format!("{}.sqlite", config.namespace));
                Self::Sqlite(SqliteGateway::open(path, &config.namespace)?)
            }
        })
    }

    fn inner(&self) -> &dyn PoolGateway {
        match self {
            Self::Memory(gateway) => gateway,
            Self::Json(gateway) => gateway,
            Self::Sqlite(gateway) => gateway,
        }
    }
}

impl PoolGateway for ConfiguredGateway {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError> {
        self.inner().read_choices()
    }

    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError> {
        self.inner().write_choices(choices)
    }

    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError> {
        self.inner().upsert_choice(draft)
    }

    fn read_people(&self) -> Result<Vec<Person>, StoreError> {
        self.inner().read_people()
    }

    fn write_people(&self, people: &[Person]) -> Result<(), StoreError> {
        self.inner().write_people(people)
    }

    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError> {
        self.inner().read_predictions()
    }

    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError> {
        self.inner().write_predictions(rows)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner().clear()
    }
}

/// Open the configured store and load the bulk sources into it.
pub(crate) fn build_pool_service(config: &PoolConfig) -> Result<AppPoolService, StoreError> {
    let gateway = Arc::new(ConfiguredGateway::open(config)?);
    let source = Arc::new(CsvFileSource::new(
        &config.roster_csv,
        &config.predictions_csv,
    ));
    Ok(PoolService::new(gateway, source, PoolSettings::from(config)))
}
