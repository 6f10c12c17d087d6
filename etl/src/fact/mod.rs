//! Fact table construction: date resolution, dimension key lookups, measures.

mod dates;

pub use dates::parse_permissive_date;

use crate::DEFAULT_DIMENSION_KEY;
use crate::columns::SourceField;
use crate::extract::{RawRecord, RawTable};
use crate::models::{
    FactBuildStats, FactRow, LocationDimension, TimeDimension, TransactionDimension,
    VehicleDimension,
};
use crate::utils::text::upper_trim;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{info, warn};

/// Natural-key → surrogate-key index; the first row seen for a key wins.
#[derive(Debug, Default)]
struct KeyIndex {
    keys: HashMap<Vec<Option<String>>, i64>,
}

impl KeyIndex {
    fn insert(&mut self, key: Vec<Option<String>>, id: i64) {
        self.keys.entry(key).or_insert(id);
    }

    fn get(&self, key: &[Option<String>]) -> Option<i64> {
        self.keys.get(key).copied()
    }
}

/// How one dimension key is resolved for every raw record.
enum Lookup {
    /// The join column is absent; every row gets the default key.
    Constant,
    Join {
        fields: Vec<SourceField>,
        index: KeyIndex,
        normalize: fn(&str) -> String,
    },
}

impl Lookup {
    /// `None` on a miss.
    fn resolve(&self, raw: &RawTable, record: &RawRecord) -> Option<i64> {
        match self {
            Lookup::Constant => Some(DEFAULT_DIMENSION_KEY),
            Lookup::Join {
                fields,
                index,
                normalize,
            } => {
                let key: Vec<Option<String>> = fields
                    .iter()
                    .map(|field| raw.value(record, *field).map(*normalize))
                    .collect();
                index.get(&key)
            }
        }
    }
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// The fact table plus the data-quality counters gathered while building it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactTable {
    pub rows: Vec<FactRow>,
    pub stats: FactBuildStats,
}

impl FactTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolves the four dimension keys for every raw record.
pub struct FactBuilder<'a> {
    time: &'a TimeDimension,
    vehicle: &'a VehicleDimension,
    transaction: &'a TransactionDimension,
    location: &'a LocationDimension,
    fallback_date: NaiveDate,
}

impl<'a> FactBuilder<'a> {
    /// `fallback_date` stamps every row when the extract has no date column.
    pub fn new(
        time: &'a TimeDimension,
        vehicle: &'a VehicleDimension,
        transaction: &'a TransactionDimension,
        location: &'a LocationDimension,
        fallback_date: NaiveDate,
    ) -> Self {
        Self {
            time,
            vehicle,
            transaction,
            location,
            fallback_date,
        }
    }

    pub fn build(&self, raw: &RawTable) -> FactTable {
        let mut stats = FactBuildStats {
            input_rows: raw.len(),
            ..Default::default()
        };

        let vehicle_lookup = self.vehicle_lookup(raw);
        let transaction_lookup = self.transaction_lookup(raw);
        let location_lookup = self.location_lookup(raw);

        let date_column = raw.mapping.index(SourceField::ProcessDate);
        if date_column.is_none() {
            warn!(
                fallback_date = %self.fallback_date,
                "No process-date column found, stamping every row with the fallback date"
            );
            stats.used_fallback_date = true;
        }
        let appraisal_column = raw.mapping.contains(SourceField::Appraisal);

        let mut rows = Vec::with_capacity(raw.len());
        for record in &raw.records {
            let date = match date_column {
                None => self.fallback_date,
                Some(index) => match record.get(index).and_then(parse_permissive_date) {
                    Some(date) => date,
                    None => {
                        stats.dropped_invalid_dates += 1;
                        continue;
                    }
                },
            };

            let id_tiempo = self.time.key_for(date).unwrap_or_else(|| {
                stats.time_misses += 1;
                DEFAULT_DIMENSION_KEY
            });
            let id_vehiculo = vehicle_lookup.resolve(raw, record).unwrap_or_else(|| {
                stats.vehicle_misses += 1;
                DEFAULT_DIMENSION_KEY
            });
            let id_transaccion = transaction_lookup.resolve(raw, record).unwrap_or_else(|| {
                stats.transaction_misses += 1;
                DEFAULT_DIMENSION_KEY
            });
            let id_ubicacion = location_lookup.resolve(raw, record).unwrap_or_else(|| {
                stats.location_misses += 1;
                DEFAULT_DIMENSION_KEY
            });

            let amount = raw
                .value(record, SourceField::Appraisal)
                .and_then(parse_amount);
            if amount.is_none() && appraisal_column {
                stats.zero_filled_amounts += 1;
            }

            rows.push(FactRow {
                id_registro: rows.len() as i64 + 1,
                id_tiempo,
                id_vehiculo,
                id_transaccion,
                id_ubicacion,
                cantidad_registros: 1,
                monto_avaluo: amount.unwrap_or(0.0),
            });
        }

        if stats.dropped_invalid_dates > 0 {
            warn!(
                dropped = stats.dropped_invalid_dates,
                "Dropped rows with unparseable process dates"
            );
        }
        if stats.time_misses + stats.vehicle_misses + stats.transaction_misses + stats.location_misses
            > 0
        {
            warn!(
                time = stats.time_misses,
                vehicle = stats.vehicle_misses,
                transaction = stats.transaction_misses,
                location = stats.location_misses,
                "Dimension lookups missed, defaulted to key {}",
                DEFAULT_DIMENSION_KEY
            );
        }
        info!(
            rows = rows.len(),
            input_rows = stats.input_rows,
            zero_filled_amounts = stats.zero_filled_amounts,
            "Built fact table"
        );

        FactTable { rows, stats }
    }

    fn vehicle_lookup(&self, raw: &RawTable) -> Lookup {
        let field = SourceField::VehicleCode;
        if !raw.mapping.contains(field) || !self.vehicle.has_column(field) {
            warn!("No vehicle code column, every fact row gets the default vehicle");
            return Lookup::Constant;
        }

        let mut index = KeyIndex::default();
        for row in &self.vehicle.rows {
            index.insert(
                vec![row.attribute(field).map(str::to_string)],
                row.id_vehiculo,
            );
        }
        Lookup::Join {
            fields: vec![field],
            index,
            normalize: trimmed,
        }
    }

    fn transaction_lookup(&self, raw: &RawTable) -> Lookup {
        let fields: Vec<SourceField> = [SourceField::TransactionType, SourceField::ServiceType]
            .into_iter()
            .filter(|field| raw.mapping.contains(*field) && self.transaction.has_column(*field))
            .collect();
        if fields.is_empty() {
            warn!("No shared transaction columns, every fact row gets the default transaction");
            return Lookup::Constant;
        }

        let mut index = KeyIndex::default();
        for row in &self.transaction.rows {
            let key = fields
                .iter()
                .map(|field| row.attribute(*field).map(str::to_string))
                .collect();
            index.insert(key, row.id_transaccion);
        }
        Lookup::Join {
            fields,
            index,
            normalize: upper_trim,
        }
    }

    fn location_lookup(&self, raw: &RawTable) -> Lookup {
        if !raw.mapping.contains(SourceField::Canton) {
            warn!("No canton column, every fact row gets the default location");
            return Lookup::Constant;
        }

        let mut index = KeyIndex::default();
        for row in &self.location.rows {
            index.insert(vec![Some(row.codigo_canton.clone())], row.id_ubicacion);
        }
        Lookup::Join {
            fields: vec![SourceField::Canton],
            index,
            normalize: trimmed,
        }
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}
