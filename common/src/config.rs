use chrono::NaiveDate;
use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Logical namespace of the warehouse tables.
#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_bucket")]
    pub bucket: String,
    #[serde(default = "default_object_path")]
    pub object_path: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_local_root")]
    pub local_root: String,
    #[serde(default = "default_s3_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// When set, every table load also writes a Parquet snapshot to this bucket.
    #[serde(default)]
    pub snapshot_bucket: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Date stamped on every fact row when the extract has no date column.
    /// Defaults to the local date at run time.
    #[serde(default)]
    pub fallback_date: Option<NaiveDate>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            dataset_id: default_dataset_id(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bucket: default_source_bucket(),
            object_path: default_object_path(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_root: default_local_root(),
            endpoint: default_s3_endpoint(),
            region: default_s3_region(),
            access_key: String::new(),
            secret_key: String::new(),
            snapshot_bucket: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            fallback_date: None,
        }
    }
}

fn default_project_id() -> String {
    "sri-vehiculos-etl".to_string()
}

fn default_dataset_id() -> String {
    "sri_vehiculos_dw".to_string()
}

fn default_source_bucket() -> String {
    "sri-vehiculos-raw".to_string()
}

fn default_object_path() -> String {
    "raw-data/sri_vehiculos.csv".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_local_root() -> String {
    "data".to_string()
}

fn default_s3_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    300
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            project = %settings.warehouse.project_id,
            dataset = %settings.warehouse.dataset_id,
            backend = ?settings.storage.backend,
            "Loaded warehouse settings"
        );

        Ok(settings)
    }
}
