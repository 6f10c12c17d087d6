use async_trait::async_trait;
use bytes::Bytes;
use common::{Error, Result};
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::debug;

/// Bucket-scoped blob access used to fetch the extract and write snapshots.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
    fn bucket(&self) -> &str;

    /// Reads a UTF-8 object whole.
    async fn read_text(&self, key: &str) -> Result<String> {
        let data = self.get_object(key).await?;
        Ok(String::from_utf8(data)?)
    }
}

/// [`ObjectStorage`] over any `object_store` backend.
pub struct ObjectStoreStorage {
    bucket: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreStorage {
    pub fn new(bucket: &str, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.to_string(),
            store,
        }
    }
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = Path::parse(key)?;
        let payload = PutPayload::from(Bytes::copy_from_slice(data));
        self.store.put(&path, payload).await?;
        debug!(bucket = %self.bucket, key, bytes = data.len(), "Stored object");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = Path::parse(key)?;
        let result = self.store.get(&path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => Error::Storage(format!(
                "Object {} not found in bucket {}",
                key, self.bucket
            )),
            other => other.into(),
        })?;

        Ok(result.bytes().await?.to_vec())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn missing_objects_name_the_bucket() {
        let storage = ObjectStoreStorage::new("raw", Arc::new(InMemory::new()));
        let err = storage.get_object("nope.csv").await.unwrap_err();
        assert!(err.to_string().contains("nope.csv not found in bucket raw"));
    }

    #[tokio::test]
    async fn read_text_rejects_invalid_utf8() {
        let storage = ObjectStoreStorage::new("raw", Arc::new(InMemory::new()));
        storage.put_object("bad.csv", &[0xff, 0xfe]).await.unwrap();
        assert!(matches!(
            storage.read_text("bad.csv").await,
            Err(Error::Utf8(_))
        ));
    }
}
