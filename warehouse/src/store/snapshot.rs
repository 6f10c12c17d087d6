use crate::storage::ObjectStorage;
use arrow::record_batch::RecordBatch;
use common::Result;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::sync::Arc;
use tracing::info;

/// Writes every loaded table as `<prefix>/<table>/<table>.parquet`.
pub struct ParquetSnapshotWriter {
    storage: Arc<dyn ObjectStorage>,
    prefix: String,
}

impl ParquetSnapshotWriter {
    pub fn new(storage: Arc<dyn ObjectStorage>, prefix: &str) -> Self {
        Self {
            storage,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn object_key(&self, table: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}/{}.parquet", table, table)
        } else {
            format!("{}/{}/{}.parquet", self.prefix, table, table)
        }
    }

    pub async fn write(&self, table: &str, batch: &RecordBatch) -> Result<String> {
        let properties = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut buffer: Vec<u8> = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(properties))?;
        writer.write(batch)?;
        writer.close()?;

        let key = self.object_key(table);
        self.storage.put_object(&key, &buffer).await?;
        info!(
            table,
            bucket = self.storage.bucket(),
            key = %key,
            bytes = buffer.len(),
            "Wrote parquet snapshot"
        );

        Ok(key)
    }
}
