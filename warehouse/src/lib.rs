pub mod pipeline;
pub mod processor;
pub mod schema;
pub mod storage;
pub mod store;
pub mod utils;

use common::Result;
use common::config::Settings;
use notification::{LogNotifier, Notifier, RunSummary};
use pipeline::{PipelineContext, run_pipeline};
use std::sync::Arc;
use storage::build_storage;
use store::{AnalyticalStore, DataFusionStore, ParquetSnapshotWriter};
use tracing::info;

/// The DataFusion store, snapshotting to `snapshot_bucket` when one is configured.
pub async fn build_store(settings: &Settings) -> Result<Arc<dyn AnalyticalStore>> {
    let store = match &settings.storage.snapshot_bucket {
        Some(bucket) => {
            let storage = build_storage(&settings.storage, bucket).await?;
            info!(bucket = %bucket, "Parquet snapshots enabled");
            DataFusionStore::new().with_snapshots(ParquetSnapshotWriter::new(
                storage,
                &settings.warehouse.dataset_id,
            ))
        }
        None => DataFusionStore::new(),
    };
    Ok(Arc::new(store))
}

/// Runs the complete warehouse pipeline with already-loaded settings.
pub async fn run_with_settings(
    settings: Settings,
    notifier: Arc<dyn Notifier>,
) -> Result<RunSummary> {
    let source = build_storage(&settings.storage, &settings.source.bucket).await?;
    let store = build_store(&settings).await?;
    let ctx = Arc::new(PipelineContext::new(settings, source, store, notifier));
    run_pipeline(ctx).await
}

/// Runs the complete warehouse pipeline
pub async fn run_warehouse_pipeline(config_path: &str) -> Result<RunSummary> {
    let settings = Settings::new(config_path)?;
    info!(
        project = %settings.warehouse.project_id,
        dataset = %settings.warehouse.dataset_id,
        "Loaded configuration from {}",
        config_path
    );
    run_with_settings(settings, Arc::new(LogNotifier)).await
}
