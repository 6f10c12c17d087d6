use crate::schema::{FACT_TABLE, LOCATION_TABLE, TIME_TABLE, VEHICLE_TABLE};
use crate::store::AnalyticalStore;
use crate::utils::arrow::{f64_values, i64_values, string_values};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use common::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const YEARS_REPORTED: usize = 5;
const TOP_RANKING: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMetric {
    pub anio: i64,
    pub total_registros: i64,
    pub monto_total_avaluo: f64,
    pub monto_promedio_avaluo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandMetric {
    pub marca: Option<String>,
    pub total_registros: i64,
    pub avaluo_promedio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceMetric {
    pub provincia: String,
    pub region: String,
    pub total_registros: i64,
    pub monto_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub by_year: Vec<YearMetric>,
    pub by_brand: Vec<BrandMetric>,
    pub by_province: Vec<ProvinceMetric>,
    pub generated_at: DateTime<Utc>,
}

/// Business aggregates over the loaded star schema.
pub struct MetricsReporter {
    store: Arc<dyn AnalyticalStore>,
}

impl MetricsReporter {
    pub fn new(store: Arc<dyn AnalyticalStore>) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> Result<MetricsReport> {
        let report = MetricsReport {
            by_year: self.by_year().await?,
            by_brand: self.by_brand().await?,
            by_province: self.by_province().await?,
            generated_at: Utc::now(),
        };

        for metric in &report.by_year {
            info!(
                anio = metric.anio,
                registros = metric.total_registros,
                avaluo_total = %format!("{:.2}", metric.monto_total_avaluo),
                "Metrics by year"
            );
        }
        for metric in &report.by_brand {
            info!(
                marca = metric.marca.as_deref().unwrap_or("NULL"),
                registros = metric.total_registros,
                avaluo_promedio = %format!("{:.2}", metric.avaluo_promedio),
                "Top brand"
            );
        }
        for metric in &report.by_province {
            info!(
                provincia = %metric.provincia,
                region = %metric.region,
                registros = metric.total_registros,
                "Top province"
            );
        }

        Ok(report)
    }

    async fn by_year(&self) -> Result<Vec<YearMetric>> {
        let sql = format!(
            "SELECT t.\"Anio\" AS anio, COUNT(*) AS total_registros, \
             SUM(f.\"MontoAvaluo\") AS monto_total, AVG(f.\"MontoAvaluo\") AS monto_promedio \
             FROM {} f INNER JOIN {} t ON f.\"ID_Tiempo\" = t.\"ID_Tiempo\" \
             GROUP BY t.\"Anio\" ORDER BY anio DESC LIMIT {}",
            FACT_TABLE, TIME_TABLE, YEARS_REPORTED
        );
        let batches = self.store.query(&sql).await?;

        let mut metrics = Vec::new();
        for batch in &batches {
            let years = i64_values(batch, "anio")?;
            let totals = i64_values(batch, "total_registros")?;
            let sums = f64_values(batch, "monto_total")?;
            let averages = f64_values(batch, "monto_promedio")?;
            for row in 0..batch.num_rows() {
                metrics.push(YearMetric {
                    anio: years[row].unwrap_or_default(),
                    total_registros: totals[row].unwrap_or_default(),
                    monto_total_avaluo: sums[row].unwrap_or_default(),
                    monto_promedio_avaluo: averages[row].unwrap_or_default(),
                });
            }
        }
        Ok(metrics)
    }

    async fn by_brand(&self) -> Result<Vec<BrandMetric>> {
        let columns = self.store.table_columns(VEHICLE_TABLE).await?;
        if !columns.iter().any(|column| column == "Marca") {
            warn!("Vehicle dimension has no brand column, skipping brand metrics");
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT v.\"Marca\" AS marca, COUNT(*) AS total_registros, \
             AVG(f.\"MontoAvaluo\") AS avaluo_promedio \
             FROM {} f INNER JOIN {} v ON f.\"ID_Vehiculo\" = v.\"ID_Vehiculo\" \
             GROUP BY v.\"Marca\" ORDER BY total_registros DESC, marca ASC LIMIT {}",
            FACT_TABLE, VEHICLE_TABLE, TOP_RANKING
        );
        let batches = self.store.query(&sql).await?;

        let mut metrics = Vec::new();
        for batch in &batches {
            let brands = string_values(batch, "marca")?;
            let totals = i64_values(batch, "total_registros")?;
            let averages = f64_values(batch, "avaluo_promedio")?;
            for (row, brand) in brands.into_iter().enumerate() {
                metrics.push(BrandMetric {
                    marca: brand,
                    total_registros: totals[row].unwrap_or_default(),
                    avaluo_promedio: averages[row].unwrap_or_default(),
                });
            }
        }
        Ok(metrics)
    }

    async fn by_province(&self) -> Result<Vec<ProvinceMetric>> {
        let sql = format!(
            "SELECT u.\"Provincia\" AS provincia, u.\"Region\" AS region, \
             COUNT(*) AS total_registros, SUM(f.\"MontoAvaluo\") AS monto_total \
             FROM {} f INNER JOIN {} u ON f.\"ID_Ubicacion\" = u.\"ID_Ubicacion\" \
             GROUP BY u.\"Provincia\", u.\"Region\" \
             ORDER BY total_registros DESC, provincia ASC LIMIT {}",
            FACT_TABLE, LOCATION_TABLE, TOP_RANKING
        );
        let batches = self.store.query(&sql).await?;
        province_metrics(&batches)
    }
}

fn province_metrics(batches: &[RecordBatch]) -> Result<Vec<ProvinceMetric>> {
    let mut metrics = Vec::new();
    for batch in batches {
        let provinces = string_values(batch, "provincia")?;
        let regions = string_values(batch, "region")?;
        let totals = i64_values(batch, "total_registros")?;
        let sums = f64_values(batch, "monto_total")?;
        for (row, province) in provinces.into_iter().enumerate() {
            metrics.push(ProvinceMetric {
                provincia: province.unwrap_or_default(),
                region: regions[row].clone().unwrap_or_default(),
                total_registros: totals[row].unwrap_or_default(),
                monto_total: sums[row].unwrap_or_default(),
            });
        }
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{DimensionSet, WarehouseProcessor};
    use crate::store::DataFusionStore;
    use chrono::NaiveDate;
    use etl::RawTable;

    async fn loaded(csv: &str) -> Arc<DataFusionStore> {
        let store = Arc::new(DataFusionStore::new());
        let processor = WarehouseProcessor::new(store.clone());
        let raw = RawTable::from_csv(csv).unwrap();
        let time = processor.load_time_dimension().await.unwrap();
        let vehicle = processor.load_vehicle_dimension(&raw).await.unwrap();
        let transaction = processor.load_transaction_dimension(&raw).await.unwrap();
        let location = processor.load_location_dimension(&raw).await.unwrap();
        processor
            .load_fact_table(
                &raw,
                DimensionSet {
                    time: &time,
                    vehicle: &vehicle,
                    transaction: &transaction,
                    location: &location,
                },
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn aggregates_by_year_brand_and_province() {
        let store = loaded(
            "CÓDIGO DE VEHÍCULO,MARCA,CANTON,FECHA PROCESO,AVALUO\n\
             V1,KIA,21101,2023-05-01,100\n\
             V2,KIA,21101,2024-05-01,300\n\
             V3,FORD,20501,2024-06-01,50\n",
        )
        .await;
        let report = MetricsReporter::new(store).report().await.unwrap();

        assert_eq!(report.by_year.len(), 2);
        assert_eq!(report.by_year[0].anio, 2024);
        assert_eq!(report.by_year[0].total_registros, 2);
        assert_eq!(report.by_year[0].monto_total_avaluo, 350.0);
        assert_eq!(report.by_year[1].anio, 2023);
        assert_eq!(report.by_year[1].monto_promedio_avaluo, 100.0);

        assert_eq!(report.by_brand[0].marca.as_deref(), Some("KIA"));
        assert_eq!(report.by_brand[0].total_registros, 2);
        assert_eq!(report.by_brand[0].avaluo_promedio, 200.0);

        assert_eq!(report.by_province[0].provincia, "GUAYAS");
        assert_eq!(report.by_province[0].region, "COSTA");
        assert_eq!(report.by_province[0].monto_total, 400.0);
        assert_eq!(report.by_province[1].provincia, "PICHINCHA");
    }

    #[tokio::test]
    async fn brand_metrics_are_skipped_without_a_brand_column() {
        let store = loaded("CANTON,AVALUO\n21101,10\n").await;
        let report = MetricsReporter::new(store).report().await.unwrap();
        assert!(report.by_brand.is_empty());
        assert_eq!(report.by_year.len(), 1);
        assert_eq!(report.by_year[0].anio, 2024);
    }
}
