//! The analytical store the warehouse tables are loaded into and queried from.

mod snapshot;

pub use snapshot::ParquetSnapshotWriter;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use common::{Error, Result};
use datafusion::datasource::MemTable;
use datafusion::execution::context::SessionContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

static TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("Invalid table name regex"));

#[async_trait]
pub trait AnalyticalStore: Send + Sync {
    /// Truncate-and-reload: `table` holds exactly `batch` once this returns.
    async fn bulk_replace(&self, table: &str, batch: RecordBatch) -> Result<()>;

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>>;

    /// Column names of a loaded table, in schema order.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>>;
}

pub fn validate_table_name(table: &str) -> Result<()> {
    if TABLE_NAME.is_match(table) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "'{}' is not a valid table name",
            table
        )))
    }
}

/// In-process store backed by DataFusion memory tables.
pub struct DataFusionStore {
    ctx: SessionContext,
    // Guards the deregister/register pair against concurrent queries.
    swap_lock: RwLock<()>,
    snapshots: Option<ParquetSnapshotWriter>,
}

impl DataFusionStore {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
            swap_lock: RwLock::new(()),
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, snapshots: ParquetSnapshotWriter) -> Self {
        self.snapshots = Some(snapshots);
        self
    }
}

impl Default for DataFusionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyticalStore for DataFusionStore {
    async fn bulk_replace(&self, table: &str, batch: RecordBatch) -> Result<()> {
        validate_table_name(table)?;
        let rows = batch.num_rows();

        if let Some(snapshots) = &self.snapshots {
            snapshots.write(table, &batch).await?;
        }

        let provider = MemTable::try_new(batch.schema(), vec![vec![batch]])?;

        let _guard = self.swap_lock.write().await;
        if self.ctx.table_exist(table)? {
            self.ctx.deregister_table(table)?;
        }
        self.ctx.register_table(table, Arc::new(provider))?;

        info!(table, rows, "Replaced table");
        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let _guard = self.swap_lock.read().await;
        debug!(sql, "Running query");
        let df = self.ctx.sql(sql).await?;
        Ok(df.collect().await?)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        validate_table_name(table)?;
        let _guard = self.swap_lock.read().await;
        let provider = self.ctx.table_provider(table).await?;
        Ok(provider
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arrow::scalar_i64;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn batch(ids: Vec<i64>) -> RecordBatch {
        let names: Vec<String> = ids.iter().map(|id| format!("row-{}", id)).collect();
        let schema = Schema::new(vec![
            Field::new("ID_Fila", DataType::Int64, false),
            Field::new("Nombre", DataType::Utf8, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_table() {
        let store = DataFusionStore::new();
        store.bulk_replace("demo", batch(vec![1, 2, 3])).await.unwrap();
        store.bulk_replace("demo", batch(vec![7])).await.unwrap();

        let result = store
            .query(r#"SELECT COUNT(*) AS n, MAX("ID_Fila") AS top FROM demo"#)
            .await
            .unwrap();
        assert_eq!(scalar_i64(&result, "n").unwrap(), Some(1));
        assert_eq!(scalar_i64(&result, "top").unwrap(), Some(7));
    }

    #[tokio::test]
    async fn reports_columns_in_schema_order() {
        let store = DataFusionStore::new();
        store.bulk_replace("demo", batch(vec![1])).await.unwrap();
        assert_eq!(
            store.table_columns("demo").await.unwrap(),
            vec!["ID_Fila".to_string(), "Nombre".to_string()]
        );
    }

    #[tokio::test]
    async fn rejects_unsafe_table_names() {
        let store = DataFusionStore::new();
        for name in ["", "Demo", "demo; DROP", "1demo", "a.b"] {
            assert!(matches!(
                store.bulk_replace(name, batch(vec![1])).await,
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn unknown_tables_fail_queries() {
        let store = DataFusionStore::new();
        assert!(store.query("SELECT * FROM nowhere").await.is_err());
        assert!(store.table_columns("nowhere").await.is_err());
    }
}
