pub mod object;

pub use object::{ObjectStorage, ObjectStoreStorage};

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use common::config::{StorageBackend, StorageSettings};
use common::{Error, Result};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

#[derive(Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl S3Config {
    pub fn from_settings(settings: &StorageSettings) -> Result<Self> {
        Url::parse(&settings.endpoint)?;
        Ok(Self {
            endpoint: settings.endpoint.clone(),
            region: settings.region.clone(),
            access_key: settings.access_key.clone(),
            secret_key: settings.secret_key.clone(),
        })
    }
}

#[derive(Clone)]
pub struct S3Manager {
    pub config: S3Config,
    client_cache: Arc<dashmap::DashMap<String, Arc<S3Client>>>,
    object_store_cache: Arc<dashmap::DashMap<String, Arc<object_store::aws::AmazonS3>>>,
}

impl S3Manager {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client_cache: Arc::new(dashmap::DashMap::new()),
            object_store_cache: Arc::new(dashmap::DashMap::new()),
        }
    }

    pub fn get_client(&self, bucket: &str) -> Arc<S3Client> {
        if let Some(client) = self.client_cache.get(bucket) {
            return client.clone();
        }

        let credentials = Credentials::new(
            &self.config.access_key,
            &self.config.secret_key,
            None,
            None,
            "static",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&self.config.endpoint)
            .region(Region::new(self.config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Arc::new(S3Client::from_conf(s3_config));
        self.client_cache.insert(bucket.to_string(), client.clone());
        client
    }

    pub fn get_object_store(&self, bucket: &str) -> Result<Arc<object_store::aws::AmazonS3>> {
        if let Some(store) = self.object_store_cache.get(bucket) {
            return Ok(store.clone());
        }

        let s3 = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&self.config.region)
            .with_access_key_id(&self.config.access_key)
            .with_secret_access_key(&self.config.secret_key)
            .with_endpoint(&self.config.endpoint)
            .with_allow_http(true)
            .build()?;

        let store = Arc::new(s3);
        self.object_store_cache
            .insert(bucket.to_string(), store.clone());
        Ok(store)
    }

    /// Verifies that a bucket exists and is accessible
    pub async fn verify_bucket_exists(&self, bucket: &str) -> Result<()> {
        let client = self.get_client(bucket);

        match client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket, "Bucket is reachable");
                Ok(())
            }
            Err(e) => Err(Error::Storage(format!(
                "Cannot access bucket '{}': {}",
                bucket, e
            ))),
        }
    }
}

/// Opens `bucket` on the configured backend.
///
/// Local buckets are directories under `local_root`; memory buckets start
/// empty and live as long as the returned handle.
pub async fn build_storage(
    settings: &StorageSettings,
    bucket: &str,
) -> Result<Arc<dyn ObjectStorage>> {
    let storage = match settings.backend {
        StorageBackend::Memory => ObjectStoreStorage::new(bucket, Arc::new(InMemory::new())),
        StorageBackend::Local => {
            let root = PathBuf::from(&settings.local_root).join(bucket);
            std::fs::create_dir_all(&root)?;
            let store = LocalFileSystem::new_with_prefix(&root)?;
            ObjectStoreStorage::new(bucket, Arc::new(store))
        }
        StorageBackend::S3 => {
            let manager = S3Manager::new(S3Config::from_settings(settings)?);
            manager.verify_bucket_exists(bucket).await?;
            ObjectStoreStorage::new(bucket, manager.get_object_store(bucket)?)
        }
    };

    info!(bucket, backend = ?settings.backend, "Opened object storage");
    Ok(Arc::new(storage))
}
