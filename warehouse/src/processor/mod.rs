//! Stage bodies: build a table with the `etl` core, convert it, load it.

pub mod metrics;
pub mod quality;

pub use metrics::{BrandMetric, MetricsReport, MetricsReporter, ProvinceMetric, YearMetric};
pub use quality::{QualityValidator, TableSummary, ValidationReport};

use crate::schema::{
    FACT_TABLE, LOCATION_TABLE, TIME_TABLE, TRANSACTION_TABLE, VEHICLE_TABLE, fact_batch,
    location_dimension_batch, time_dimension_batch, transaction_dimension_batch,
    vehicle_dimension_batch,
};
use crate::store::AnalyticalStore;
use chrono::NaiveDate;
use common::Result;
use etl::models::{LocationDimension, TimeDimension, TransactionDimension, VehicleDimension};
use etl::{
    FactBuilder, FactTable, RawTable, build_location_dimension, build_time_dimension,
    build_transaction_dimension, build_vehicle_dimension,
};
use std::sync::Arc;
use tracing::info;

/// The four dimensions a fact load resolves its keys against.
pub struct DimensionSet<'a> {
    pub time: &'a TimeDimension,
    pub vehicle: &'a VehicleDimension,
    pub transaction: &'a TransactionDimension,
    pub location: &'a LocationDimension,
}

#[derive(Clone)]
pub struct WarehouseProcessor {
    store: Arc<dyn AnalyticalStore>,
}

impl WarehouseProcessor {
    pub fn new(store: Arc<dyn AnalyticalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AnalyticalStore> {
        &self.store
    }

    pub async fn load_time_dimension(&self) -> Result<TimeDimension> {
        let dimension = build_time_dimension()?;
        self.store
            .bulk_replace(TIME_TABLE, time_dimension_batch(&dimension)?)
            .await?;
        Ok(dimension)
    }

    pub async fn load_vehicle_dimension(&self, raw: &RawTable) -> Result<VehicleDimension> {
        let dimension = build_vehicle_dimension(raw);
        self.store
            .bulk_replace(VEHICLE_TABLE, vehicle_dimension_batch(&dimension)?)
            .await?;
        Ok(dimension)
    }

    pub async fn load_transaction_dimension(&self, raw: &RawTable) -> Result<TransactionDimension> {
        let dimension = build_transaction_dimension(raw);
        self.store
            .bulk_replace(TRANSACTION_TABLE, transaction_dimension_batch(&dimension)?)
            .await?;
        Ok(dimension)
    }

    pub async fn load_location_dimension(&self, raw: &RawTable) -> Result<LocationDimension> {
        let dimension = build_location_dimension(raw);
        self.store
            .bulk_replace(LOCATION_TABLE, location_dimension_batch(&dimension)?)
            .await?;
        Ok(dimension)
    }

    pub async fn load_fact_table(
        &self,
        raw: &RawTable,
        dimensions: DimensionSet<'_>,
        fallback_date: NaiveDate,
    ) -> Result<FactTable> {
        let facts = FactBuilder::new(
            dimensions.time,
            dimensions.vehicle,
            dimensions.transaction,
            dimensions.location,
            fallback_date,
        )
        .build(raw);

        self.store
            .bulk_replace(FACT_TABLE, fact_batch(&facts.rows)?)
            .await?;
        info!(stats = ?facts.stats, "Loaded fact table");
        Ok(facts)
    }
}
