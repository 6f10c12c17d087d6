use crate::schema::{FACT_TABLE, LOCATION_TABLE, TIME_TABLE, TRANSACTION_TABLE, VEHICLE_TABLE};
use crate::store::AnalyticalStore;
use crate::utils::arrow::{scalar_f64, scalar_i64, scalar_string};
use common::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Counts and ranges gathered for one table; absent columns are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub rows: i64,
    pub distinct: BTreeMap<String, i64>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FactSummary {
    pub rows: i64,
    pub total_quantity: i64,
    pub average_appraisal: Option<f64>,
    pub null_keys: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub dimensions: Vec<TableSummary>,
    pub fact: FactSummary,
    /// Fact rows whose four keys all resolve through inner joins.
    pub rows_with_valid_keys: i64,
}

impl ValidationReport {
    pub fn referential_integrity_holds(&self) -> bool {
        self.rows_with_valid_keys == self.fact.rows
    }
}

const FACT_KEYS: [&str; 4] = ["ID_Tiempo", "ID_Vehiculo", "ID_Transaccion", "ID_Ubicacion"];

/// Post-load consistency checks across the five tables.
pub struct QualityValidator {
    store: Arc<dyn AnalyticalStore>,
}

impl QualityValidator {
    pub fn new(store: Arc<dyn AnalyticalStore>) -> Self {
        Self { store }
    }

    /// Fails with [`Error::DataValidation`] when some fact key has no dimension row.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let dimensions = vec![
            self.summarize(TIME_TABLE, &["Anio"], Some("FechaCompleta"))
                .await?,
            self.summarize(VEHICLE_TABLE, &["Marca", "Clase"], None)
                .await?,
            self.summarize(TRANSACTION_TABLE, &["TipoTransaccion"], None)
                .await?,
            self.summarize(LOCATION_TABLE, &["Provincia", "Region"], None)
                .await?,
        ];
        for summary in &dimensions {
            info!(
                table = %summary.table,
                rows = summary.rows,
                distinct = ?summary.distinct,
                min_date = ?summary.min_date,
                max_date = ?summary.max_date,
                "Table summary"
            );
        }

        let fact = self.summarize_fact().await?;
        info!(
            table = FACT_TABLE,
            rows = fact.rows,
            total_quantity = fact.total_quantity,
            average_appraisal = ?fact.average_appraisal,
            null_keys = ?fact.null_keys,
            "Fact summary"
        );

        let rows_with_valid_keys = self.joined_row_count().await?;
        let report = ValidationReport {
            dimensions,
            fact,
            rows_with_valid_keys,
        };

        if !report.referential_integrity_holds() {
            error!(
                fact_rows = report.fact.rows,
                rows_with_valid_keys,
                "Referential integrity check failed"
            );
            return Err(Error::DataValidation(format!(
                "{} of {} fact rows reference missing dimension keys",
                report.fact.rows - rows_with_valid_keys,
                report.fact.rows
            )));
        }

        info!(rows_with_valid_keys, "Referential integrity check passed");
        Ok(report)
    }

    async fn summarize(
        &self,
        table: &str,
        distinct_columns: &[&str],
        date_column: Option<&str>,
    ) -> Result<TableSummary> {
        let columns = self.store.table_columns(table).await?;
        let present: Vec<&str> = distinct_columns
            .iter()
            .copied()
            .filter(|column| columns.iter().any(|c| c == column))
            .collect();

        let mut select = vec!["COUNT(*) AS total_rows".to_string()];
        for (position, column) in present.iter().enumerate() {
            select.push(format!(
                "COUNT(DISTINCT \"{}\") AS distinct_{}",
                column, position
            ));
        }
        if let Some(date) = date_column {
            select.push(format!("MIN(\"{}\") AS min_date", date));
            select.push(format!("MAX(\"{}\") AS max_date", date));
        }

        let sql = format!("SELECT {} FROM {}", select.join(", "), table);
        let batches = self.store.query(&sql).await?;

        let mut distinct = BTreeMap::new();
        for (position, column) in present.iter().enumerate() {
            let count = scalar_i64(&batches, &format!("distinct_{}", position))?.unwrap_or(0);
            distinct.insert(column.to_string(), count);
        }

        let (min_date, max_date) = match date_column {
            Some(_) => (
                scalar_string(&batches, "min_date")?,
                scalar_string(&batches, "max_date")?,
            ),
            None => (None, None),
        };

        Ok(TableSummary {
            table: table.to_string(),
            rows: scalar_i64(&batches, "total_rows")?.unwrap_or(0),
            distinct,
            min_date,
            max_date,
        })
    }

    async fn summarize_fact(&self) -> Result<FactSummary> {
        let mut select = vec![
            "COUNT(*) AS total_rows".to_string(),
            "SUM(\"CantidadRegistros\") AS total_quantity".to_string(),
            "AVG(\"MontoAvaluo\") AS average_appraisal".to_string(),
        ];
        for (position, key) in FACT_KEYS.iter().enumerate() {
            select.push(format!(
                "COUNT(CASE WHEN \"{}\" IS NULL THEN 1 END) AS null_key_{}",
                key, position
            ));
        }

        let sql = format!("SELECT {} FROM {}", select.join(", "), FACT_TABLE);
        let batches = self.store.query(&sql).await?;

        let mut null_keys = BTreeMap::new();
        for (position, key) in FACT_KEYS.iter().enumerate() {
            let count = scalar_i64(&batches, &format!("null_key_{}", position))?.unwrap_or(0);
            null_keys.insert(key.to_string(), count);
        }

        Ok(FactSummary {
            rows: scalar_i64(&batches, "total_rows")?.unwrap_or(0),
            total_quantity: scalar_i64(&batches, "total_quantity")?.unwrap_or(0),
            average_appraisal: scalar_f64(&batches, "average_appraisal")?,
            null_keys,
        })
    }

    async fn joined_row_count(&self) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS valid_rows \
             FROM {fact} f \
             INNER JOIN {time} t ON f.\"ID_Tiempo\" = t.\"ID_Tiempo\" \
             INNER JOIN {vehicle} v ON f.\"ID_Vehiculo\" = v.\"ID_Vehiculo\" \
             INNER JOIN {transaction} tr ON f.\"ID_Transaccion\" = tr.\"ID_Transaccion\" \
             INNER JOIN {location} u ON f.\"ID_Ubicacion\" = u.\"ID_Ubicacion\"",
            fact = FACT_TABLE,
            time = TIME_TABLE,
            vehicle = VEHICLE_TABLE,
            transaction = TRANSACTION_TABLE,
            location = LOCATION_TABLE,
        );
        let batches = self.store.query(&sql).await?;
        Ok(scalar_i64(&batches, "valid_rows")?.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{fact_batch, location_dimension_batch, time_dimension_batch};
    use crate::store::DataFusionStore;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use etl::models::{FactRow, LocationDimension, LocationDimensionRow};
    use etl::build_time_dimension;

    fn id_only(key: &str, ids: Vec<i64>) -> RecordBatch {
        let schema = Schema::new(vec![Field::new(key, DataType::Int64, false)]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(Int64Array::from(ids))]).unwrap()
    }

    fn fact(id: i64, id_ubicacion: i64) -> FactRow {
        FactRow {
            id_registro: id,
            id_tiempo: 1,
            id_vehiculo: 1,
            id_transaccion: 1,
            id_ubicacion,
            cantidad_registros: 1,
            monto_avaluo: 10.0,
        }
    }

    async fn seeded_store(facts: &[FactRow]) -> Arc<DataFusionStore> {
        let store = Arc::new(DataFusionStore::new());
        store
            .bulk_replace(
                TIME_TABLE,
                time_dimension_batch(&build_time_dimension().unwrap()).unwrap(),
            )
            .await
            .unwrap();

        let vehicle_schema = Schema::new(vec![
            Field::new("ID_Vehiculo", DataType::Int64, false),
            Field::new("Marca", DataType::Utf8, true),
        ]);
        let vehicles = RecordBatch::try_new(
            Arc::new(vehicle_schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["KIA", "FORD"])),
            ],
        )
        .unwrap();
        store.bulk_replace(VEHICLE_TABLE, vehicles).await.unwrap();
        store
            .bulk_replace(TRANSACTION_TABLE, id_only("ID_Transaccion", vec![1]))
            .await
            .unwrap();

        let location = LocationDimension {
            rows: vec![LocationDimensionRow {
                id_ubicacion: 1,
                codigo_canton: "21101".into(),
                nombre_canton: "GUAYAQUIL".into(),
                provincia: "GUAYAS".into(),
                region: "COSTA".into(),
                pais: "ECUADOR".into(),
            }],
        };
        store
            .bulk_replace(LOCATION_TABLE, location_dimension_batch(&location).unwrap())
            .await
            .unwrap();
        store
            .bulk_replace(FACT_TABLE, fact_batch(facts).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn consistent_tables_pass_with_summaries() {
        let store = seeded_store(&[fact(1, 1), fact(2, 1)]).await;
        let report = QualityValidator::new(store).validate().await.unwrap();

        assert!(report.referential_integrity_holds());
        assert_eq!(report.fact.rows, 2);
        assert_eq!(report.fact.total_quantity, 2);
        assert_eq!(report.fact.average_appraisal, Some(10.0));
        assert_eq!(report.fact.null_keys["ID_Tiempo"], 0);

        let time = &report.dimensions[0];
        assert_eq!(time.rows, 2192);
        assert_eq!(time.distinct["Anio"], 6);
        assert_eq!(time.min_date.as_deref(), Some("2020-01-01"));
        assert_eq!(time.max_date.as_deref(), Some("2025-12-31"));

        let vehicle = &report.dimensions[1];
        assert_eq!(vehicle.distinct["Marca"], 2);
        assert!(!vehicle.distinct.contains_key("Clase"));

        let transaction = &report.dimensions[2];
        assert!(transaction.distinct.is_empty());
    }

    #[tokio::test]
    async fn dangling_keys_fail_validation() {
        let store = seeded_store(&[fact(1, 1), fact(2, 9)]).await;
        let err = QualityValidator::new(store).validate().await.unwrap_err();
        assert!(matches!(err, Error::DataValidation(_)));
    }
}
