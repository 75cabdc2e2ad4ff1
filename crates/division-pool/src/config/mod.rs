use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Categories offered when `POOL_CATEGORIES` is not set.
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "DCD",
    "DCI",
    "Contabilidade",
    "Transparência",
    "Orientação",
    "Apuração e Combate à Corrupção",
    "DIE",
    "DTI",
    "Projetos e Processos",
];

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Which persistence backend holds the pool collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "json" | "kv" | "local" => Ok(Self::Json),
            "sqlite" | "sql" => Ok(Self::Sqlite),
            other => Err(ConfigError::InvalidStorage(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pool: PoolConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pool: PoolConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Storage, data sources, and leaderboard shape for the pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub storage: StorageBackend,
    pub data_dir: PathBuf,
    pub namespace: String,
    pub roster_csv: PathBuf,
    pub predictions_csv: PathBuf,
    pub photo_dir: PathBuf,
    pub slice_size: usize,
    pub categories: Vec<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Json,
            data_dir: PathBuf::from("./data"),
            namespace: "sorteio".to_string(),
            roster_csv: PathBuf::from("./data/employees.csv"),
            predictions_csv: PathBuf::from("./data/guesses.csv"),
            photo_dir: PathBuf::from("./photos"),
            slice_size: 3,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl PoolConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("POOL_STORAGE") {
            config.storage = StorageBackend::parse(&raw)?;
        }
        if let Ok(raw) = env::var("POOL_DATA_DIR") {
            config.data_dir = PathBuf::from(raw);
        }
        if let Ok(raw) = env::var("POOL_NAMESPACE") {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::EmptyNamespace);
            }
            config.namespace = trimmed.to_string();
        }
        if let Ok(raw) = env::var("POOL_ROSTER_CSV") {
            config.roster_csv = PathBuf::from(raw);
        }
        if let Ok(raw) = env::var("POOL_PREDICTIONS_CSV") {
            config.predictions_csv = PathBuf::from(raw);
        }
        if let Ok(raw) = env::var("POOL_PHOTO_DIR") {
            config.photo_dir = PathBuf::from(raw);
        }
        if let Ok(raw) = env::var("POOL_SLICE_SIZE") {
            config.slice_size = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidSliceSize)?;
        }
        if let Ok(raw) = env::var("POOL_CATEGORIES") {
            let categories: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
            if !categories.is_empty() {
                config.categories = categories;
            }
        }

        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStorage(String),
    InvalidSliceSize,
    EmptyNamespace,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStorage(value) => write!(
                f,
                "POOL_STORAGE must be one of memory, json, sqlite (got '{}')",
                value
            ),
            ConfigError::InvalidSliceSize => {
                write!(f, "POOL_SLICE_SIZE must be a positive integer")
            }
            ConfigError::EmptyNamespace => write!(f, "POOL_NAMESPACE must not be blank"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
