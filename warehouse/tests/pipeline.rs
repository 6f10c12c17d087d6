use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::NaiveDate;
use common::Result;
use common::config::Settings;
use notification::{Notifier, RunStatus, RunSummary, StageStatus};
use object_store::memory::InMemory;
use std::sync::Arc;
use tokio::sync::Mutex;
use warehouse::pipeline::{PipelineContext, run_pipeline};
use warehouse::schema::{FACT_TABLE, LOCATION_TABLE, TIME_TABLE};
use warehouse::storage::{ObjectStorage, ObjectStoreStorage};
use warehouse::store::{AnalyticalStore, DataFusionStore, ParquetSnapshotWriter};
use warehouse::utils::arrow::{f64_values, i64_values, scalar_i64, string_values};

#[derive(Default)]
struct RecordingNotifier {
    summaries: Mutex<Vec<RunSummary>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &RunSummary) -> Result<()> {
        self.summaries.lock().await.push(summary.clone());
        Ok(())
    }
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.pipeline.max_retries = 0;
    settings.pipeline.retry_delay_secs = 0;
    settings.pipeline.fallback_date = NaiveDate::from_ymd_opt(2024, 6, 1);
    settings
}

async fn source_with(csv: &str) -> Arc<dyn ObjectStorage> {
    let storage = ObjectStoreStorage::new("sri-vehiculos-raw", Arc::new(InMemory::new()));
    storage
        .put_object("raw-data/sri_vehiculos.csv", csv.as_bytes())
        .await
        .unwrap();
    Arc::new(storage)
}

struct Harness {
    ctx: Arc<PipelineContext>,
    store: Arc<DataFusionStore>,
    notifier: Arc<RecordingNotifier>,
}

async fn harness(csv: Option<&str>, store: DataFusionStore) -> Harness {
    let source: Arc<dyn ObjectStorage> = match csv {
        Some(csv) => source_with(csv).await,
        None => Arc::new(ObjectStoreStorage::new(
            "sri-vehiculos-raw",
            Arc::new(InMemory::new()),
        )),
    };
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = Arc::new(PipelineContext::new(
        settings(),
        source,
        store.clone(),
        notifier.clone(),
    ));
    Harness {
        ctx,
        store,
        notifier,
    }
}

fn merged(batches: &[RecordBatch]) -> RecordBatch {
    concat_batches(&batches[0].schema(), batches).unwrap()
}

const STAGE_ORDER: [&str; 11] = [
    "start",
    "dim_time",
    "dim_vehicle",
    "dim_transaction",
    "dim_location",
    "dimension_barrier",
    "fact",
    "validate",
    "metrics",
    "notify",
    "finish",
];

async fn count(store: &DataFusionStore, table: &str) -> i64 {
    let batches = store
        .query(&format!("SELECT COUNT(*) AS n FROM {}", table))
        .await
        .unwrap();
    scalar_i64(&batches, "n").unwrap().unwrap()
}

const THREE_ROWS: &str = "\
CÓDIGO DE VEHÍCULO,MARCA,MODELO,TIPO TRANSACCIÓN,TIPO SERVICIO,CANTON,FECHA PROCESO,AVALUO
V1,toyota,corolla,INSCRIPCION,PARTICULAR,21101,2024-03-15,15000
V2,kia,rio,TRASPASO,PUBLICO,00000,not-a-date,9000
V3,ford,ranger,INSCRIPCION,PARTICULAR,20501,2024-03-16,
";

#[tokio::test]
async fn three_row_extract_produces_two_facts() {
    let h = harness(Some(THREE_ROWS), DataFusionStore::new()).await;
    let summary = run_pipeline(h.ctx.clone()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Succeeded);
    let names: Vec<&str> = summary.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, STAGE_ORDER.to_vec());
    assert!(summary.source_digest.is_some());

    assert_eq!(count(&h.store, TIME_TABLE).await, 2192);
    assert_eq!(count(&h.store, FACT_TABLE).await, 2);
    assert_eq!(count(&h.store, LOCATION_TABLE).await, 3);

    let facts = h
        .store
        .query(&format!(
            "SELECT \"CantidadRegistros\", \"MontoAvaluo\" FROM {} ORDER BY \"ID_Registro\"",
            FACT_TABLE
        ))
        .await
        .unwrap();
    let facts = merged(&facts);
    assert_eq!(
        i64_values(&facts, "CantidadRegistros").unwrap(),
        vec![Some(1), Some(1)]
    );
    assert_eq!(
        f64_values(&facts, "MontoAvaluo").unwrap(),
        vec![Some(15000.0), Some(0.0)]
    );

    let validation = h.ctx.validation_report().unwrap();
    assert!(validation.referential_integrity_holds());
    assert_eq!(validation.rows_with_valid_keys, 2);

    let metrics = h.ctx.metrics_report().unwrap();
    assert_eq!(metrics.by_year[0].anio, 2024);
    assert_eq!(metrics.by_year[0].total_registros, 2);

    // Success is announced once, by the notify stage.
    let sent = h.notifier.summaries.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].status, RunStatus::Succeeded);
    assert_eq!(sent[0].table_rows[FACT_TABLE], 2);
}

#[tokio::test]
async fn extract_without_optional_columns_still_loads() {
    let h = harness(
        Some("MARCA,AVALUO\nkia,10\nford,abc\n"),
        DataFusionStore::new(),
    )
    .await;
    let summary = run_pipeline(h.ctx.clone()).await.unwrap();
    assert!(summary.succeeded());

    let facts = h.ctx.fact_table().unwrap();
    assert_eq!(facts.len(), 2);
    assert!(facts.stats.used_fallback_date);
    assert!(facts.rows.iter().all(|row| row.id_ubicacion == 1));

    let location = h
        .store
        .query(&format!(
            "SELECT \"CodigoCanton\", \"NombreCanton\" FROM {}",
            LOCATION_TABLE
        ))
        .await
        .unwrap();
    let location = merged(&location);
    assert_eq!(
        string_values(&location, "CodigoCanton").unwrap(),
        vec![Some("99999".to_string())]
    );
    assert_eq!(
        string_values(&location, "NombreCanton").unwrap(),
        vec![Some("NO_ESPECIFICADO".to_string())]
    );
}

#[tokio::test]
async fn all_null_canton_column_still_passes_validation() {
    let h = harness(
        Some("CANTON,MARCA,FECHA PROCESO,AVALUO\n,kia,2024-03-15,10\nNULL,ford,2024-03-16,20\n"),
        DataFusionStore::new(),
    )
    .await;
    let summary = run_pipeline(h.ctx.clone()).await.unwrap();
    assert!(summary.succeeded());

    assert_eq!(count(&h.store, LOCATION_TABLE).await, 1);
    let facts = h.ctx.fact_table().unwrap();
    assert_eq!(facts.len(), 2);
    assert!(facts.rows.iter().all(|row| row.id_ubicacion == 1));

    let validation = h.ctx.validation_report().unwrap();
    assert!(validation.referential_integrity_holds());
    assert_eq!(validation.rows_with_valid_keys, 2);
}

#[tokio::test]
async fn missing_extract_fails_start_and_skips_everything_else() {
    let h = harness(None, DataFusionStore::new()).await;
    let summary = run_pipeline(h.ctx.clone()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Failed);
    assert_eq!(summary.stages[0].name, "start");
    assert_eq!(summary.stages[0].status, StageStatus::Failed);
    assert!(
        summary.stages[1..]
            .iter()
            .all(|stage| stage.status == StageStatus::Skipped)
    );
    assert!(h.store.query("SELECT * FROM dim_tiempo").await.is_err());

    let sent = h.notifier.summaries.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].status, RunStatus::Failed);
}

#[tokio::test]
async fn snapshots_are_written_for_every_table() {
    let snapshots = ObjectStoreStorage::new("snapshots", Arc::new(InMemory::new()));
    let snapshots: Arc<dyn ObjectStorage> = Arc::new(snapshots);
    let store = DataFusionStore::new()
        .with_snapshots(ParquetSnapshotWriter::new(snapshots.clone(), "dw_test"));

    let h = harness(Some(THREE_ROWS), store).await;
    assert!(run_pipeline(h.ctx.clone()).await.unwrap().succeeded());

    for table in [
        "dim_tiempo",
        "dim_vehiculo",
        "dim_transaccion",
        "dim_ubicacion",
        "fact_registro_vehiculos",
    ] {
        let key = format!("dw_test/{}/{}.parquet", table, table);
        assert!(!snapshots.get_object(&key).await.unwrap().is_empty());
    }
}
