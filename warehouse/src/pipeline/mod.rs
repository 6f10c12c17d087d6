//! The warehouse run: one extract, four parallel dimension loads, then the
//! fact load, validation, metrics and the completion notice.

pub mod dag;

pub use dag::{GraphRun, RetryPolicy, TaskGraph, TaskOutcome, TaskStatus};

use crate::processor::{
    DimensionSet, MetricsReport, MetricsReporter, QualityValidator, ValidationReport,
    WarehouseProcessor,
};
use crate::schema::{FACT_TABLE, LOCATION_TABLE, TIME_TABLE, TRANSACTION_TABLE, VEHICLE_TABLE};
use crate::storage::ObjectStorage;
use crate::store::AnalyticalStore;
use chrono::{DateTime, Local, NaiveDate, Utc};
use common::config::Settings;
use common::{Error, Result};
use dag::RunJournal;
use etl::models::{LocationDimension, TimeDimension, TransactionDimension, VehicleDimension};
use etl::{FactTable, RawTable};
use notification::{Notifier, RunSummary, StageReport, StageStatus};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

pub const PIPELINE_NAME: &str = "sri_vehiculos_etl";

fn set_once<T>(cell: &OnceCell<T>, value: T, what: &str) -> Result<()> {
    cell.set(value)
        .map_err(|_| Error::Other(format!("{} was already produced in this run", what)))
}

fn produced<'a, T>(cell: &'a OnceCell<T>, what: &str) -> Result<&'a T> {
    cell.get()
        .ok_or_else(|| Error::Other(format!("{} has not been produced yet", what)))
}

/// Everything one run shares between stages. Each slot is written once by
/// the stage that produces it and read by its dependents.
pub struct PipelineContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    settings: Settings,
    source: Arc<dyn ObjectStorage>,
    processor: WarehouseProcessor,
    notifier: Arc<dyn Notifier>,
    raw: OnceCell<RawTable>,
    time: OnceCell<TimeDimension>,
    vehicle: OnceCell<VehicleDimension>,
    transaction: OnceCell<TransactionDimension>,
    location: OnceCell<LocationDimension>,
    facts: OnceCell<FactTable>,
    validation: OnceCell<ValidationReport>,
    metrics: OnceCell<MetricsReport>,
}

impl PipelineContext {
    pub fn new(
        settings: Settings,
        source: Arc<dyn ObjectStorage>,
        store: Arc<dyn AnalyticalStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            settings,
            source,
            processor: WarehouseProcessor::new(store),
            notifier,
            raw: OnceCell::new(),
            time: OnceCell::new(),
            vehicle: OnceCell::new(),
            transaction: OnceCell::new(),
            location: OnceCell::new(),
            facts: OnceCell::new(),
            validation: OnceCell::new(),
            metrics: OnceCell::new(),
        }
    }

    fn raw(&self) -> Result<&RawTable> {
        produced(&self.raw, "Raw extract")
    }

    pub fn fallback_date(&self) -> NaiveDate {
        self.settings
            .pipeline
            .fallback_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub async fn extract(&self) -> Result<()> {
        if self.raw.get().is_some() {
            return Ok(());
        }
        let path = &self.settings.source.object_path;
        info!(
            run_id = %self.run_id,
            bucket = self.source.bucket(),
            path = %path,
            "Reading raw extract"
        );
        let text = self.source.read_text(path).await?;
        set_once(&self.raw, RawTable::from_csv(&text)?, "Raw extract")
    }

    pub async fn load_time(&self) -> Result<()> {
        let dimension = self.processor.load_time_dimension().await?;
        set_once(&self.time, dimension, "Time dimension")
    }

    pub async fn load_vehicle(&self) -> Result<()> {
        let dimension = self.processor.load_vehicle_dimension(self.raw()?).await?;
        set_once(&self.vehicle, dimension, "Vehicle dimension")
    }

    pub async fn load_transaction(&self) -> Result<()> {
        let dimension = self
            .processor
            .load_transaction_dimension(self.raw()?)
            .await?;
        set_once(&self.transaction, dimension, "Transaction dimension")
    }

    pub async fn load_location(&self) -> Result<()> {
        let dimension = self.processor.load_location_dimension(self.raw()?).await?;
        set_once(&self.location, dimension, "Location dimension")
    }

    /// Fan-in point: the fact stage only starts once this holds.
    pub async fn dimension_barrier(&self) -> Result<()> {
        let dimensions = self.dimensions()?;
        info!(
            time = dimensions.time.len(),
            vehicle = dimensions.vehicle.len(),
            transaction = dimensions.transaction.len(),
            location = dimensions.location.len(),
            "All dimensions loaded"
        );
        Ok(())
    }

    fn dimensions(&self) -> Result<DimensionSet<'_>> {
        Ok(DimensionSet {
            time: produced(&self.time, "Time dimension")?,
            vehicle: produced(&self.vehicle, "Vehicle dimension")?,
            transaction: produced(&self.transaction, "Transaction dimension")?,
            location: produced(&self.location, "Location dimension")?,
        })
    }

    pub async fn load_facts(&self) -> Result<()> {
        let facts = self
            .processor
            .load_fact_table(self.raw()?, self.dimensions()?, self.fallback_date())
            .await?;
        set_once(&self.facts, facts, "Fact table")
    }

    pub async fn validate(&self) -> Result<()> {
        let report = QualityValidator::new(Arc::clone(self.processor.store()))
            .validate()
            .await?;
        set_once(&self.validation, report, "Validation report")
    }

    pub async fn report_metrics(&self) -> Result<()> {
        let report = MetricsReporter::new(Arc::clone(self.processor.store()))
            .report()
            .await?;
        set_once(&self.metrics, report, "Metrics report")
    }

    pub async fn notify(&self, journal: &RunJournal) -> Result<()> {
        let outcomes = journal.lock().await.clone();
        let summary = self.summarize(&outcomes);
        self.notifier.notify(&summary).await
    }

    pub fn validation_report(&self) -> Option<&ValidationReport> {
        self.validation.get()
    }

    pub fn metrics_report(&self) -> Option<&MetricsReport> {
        self.metrics.get()
    }

    pub fn fact_table(&self) -> Option<&FactTable> {
        self.facts.get()
    }

    /// Row counts of the tables this run produced.
    pub fn table_rows(&self) -> BTreeMap<String, usize> {
        let mut rows = BTreeMap::new();
        if let Some(time) = self.time.get() {
            rows.insert(TIME_TABLE.to_string(), time.len());
        }
        if let Some(vehicle) = self.vehicle.get() {
            rows.insert(VEHICLE_TABLE.to_string(), vehicle.len());
        }
        if let Some(transaction) = self.transaction.get() {
            rows.insert(TRANSACTION_TABLE.to_string(), transaction.len());
        }
        if let Some(location) = self.location.get() {
            rows.insert(LOCATION_TABLE.to_string(), location.len());
        }
        if let Some(facts) = self.facts.get() {
            rows.insert(FACT_TABLE.to_string(), facts.len());
        }
        rows
    }

    pub fn summarize(&self, outcomes: &[TaskOutcome]) -> RunSummary {
        let stages = outcomes.iter().map(stage_report).collect();
        RunSummary::new(self.run_id, PIPELINE_NAME, self.started_at, stages)
            .with_source_digest(self.raw.get().map(|raw| raw.digest.clone()))
            .with_table_rows(self.table_rows())
    }
}

fn stage_report(outcome: &TaskOutcome) -> StageReport {
    let (status, error) = match &outcome.status {
        TaskStatus::Succeeded => (StageStatus::Succeeded, None),
        TaskStatus::Failed(message) => (StageStatus::Failed, Some(message.clone())),
        TaskStatus::Skipped => (StageStatus::Skipped, None),
    };
    StageReport {
        name: outcome.name.clone(),
        status,
        attempts: outcome.attempts,
        duration_ms: outcome.duration.as_millis() as u64,
        error,
    }
}

/// Wires the run graph:
/// `start → {dim_*} → dimension_barrier → fact → validate → metrics → notify → finish`.
pub fn build_warehouse_graph(ctx: &Arc<PipelineContext>, policy: RetryPolicy) -> TaskGraph {
    let mut graph = TaskGraph::new(policy);
    let journal = graph.journal();
    let dimensions = ["dim_time", "dim_vehicle", "dim_transaction", "dim_location"];

    let c = Arc::clone(ctx);
    graph.add_task("start", &[], move || {
        let c = Arc::clone(&c);
        async move { c.extract().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("dim_time", &["start"], move || {
        let c = Arc::clone(&c);
        async move { c.load_time().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("dim_vehicle", &["start"], move || {
        let c = Arc::clone(&c);
        async move { c.load_vehicle().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("dim_transaction", &["start"], move || {
        let c = Arc::clone(&c);
        async move { c.load_transaction().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("dim_location", &["start"], move || {
        let c = Arc::clone(&c);
        async move { c.load_location().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("dimension_barrier", &dimensions, move || {
        let c = Arc::clone(&c);
        async move { c.dimension_barrier().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("fact", &["dimension_barrier"], move || {
        let c = Arc::clone(&c);
        async move { c.load_facts().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("validate", &["fact"], move || {
        let c = Arc::clone(&c);
        async move { c.validate().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("metrics", &["validate"], move || {
        let c = Arc::clone(&c);
        async move { c.report_metrics().await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("notify", &["metrics"], move || {
        let c = Arc::clone(&c);
        let journal = Arc::clone(&journal);
        async move { c.notify(&journal).await }
    });

    let c = Arc::clone(ctx);
    graph.add_task("finish", &["notify"], move || {
        let c = Arc::clone(&c);
        async move {
            info!(run_id = %c.run_id, tables = ?c.table_rows(), "Warehouse run complete");
            Ok(())
        }
    });

    graph
}

/// Runs the full graph and returns the summary of every stage. A failed run
/// is reported through the notifier here, since its own notify stage was
/// skipped.
pub async fn run_pipeline(ctx: Arc<PipelineContext>) -> Result<RunSummary> {
    let policy = RetryPolicy::new(
        ctx.settings.pipeline.max_retries,
        Duration::from_secs(ctx.settings.pipeline.retry_delay_secs),
    );
    info!(
        run_id = %ctx.run_id,
        pipeline = PIPELINE_NAME,
        max_retries = policy.max_retries,
        "Starting warehouse run"
    );

    let graph = build_warehouse_graph(&ctx, policy);
    let run = graph.run().await?;
    let summary = ctx.summarize(&run.outcomes);

    if let Some(failure) = run.first_failure() {
        error!(run_id = %ctx.run_id, error = %failure, "Warehouse run failed");
        ctx.notifier.notify(&summary).await?;
    }
    Ok(summary)
}
