use super::attributes::{Cleanup, distinct_attributes};
use crate::columns::{SourceField, VEHICLE_FIELDS};
use crate::extract::RawTable;
use crate::models::{VehicleDimension, VehicleDimensionRow};
use tracing::{info, warn};

/// Stored in `Color2` when the source leaves it empty.
pub const MISSING_COLOR: &str = "N/A";

fn cleanup(field: SourceField) -> Cleanup {
    match field {
        SourceField::Brand
        | SourceField::Model
        | SourceField::Country
        | SourceField::Class
        | SourceField::SubClass
        | SourceField::VehicleType
        | SourceField::FuelType => Cleanup::UpperTrim,
        SourceField::Color2 => Cleanup::FillNull(MISSING_COLOR),
        _ => Cleanup::Keep,
    }
}

/// Distinct vehicle attribute tuples with sequential `ID_Vehiculo` keys.
///
/// Missing attribute columns are logged and skipped; the remaining ones
/// keep their warehouse order whatever the order of the source headers.
pub fn build_vehicle_dimension(raw: &RawTable) -> VehicleDimension {
    let missing = raw.mapping.missing(&VEHICLE_FIELDS);
    if !missing.is_empty() {
        warn!(?missing, "Vehicle attribute columns not found, using the rest");
    }

    let distinct = distinct_attributes(raw, &VEHICLE_FIELDS, cleanup);
    let rows: Vec<VehicleDimensionRow> = distinct
        .tuples
        .into_iter()
        .enumerate()
        .map(|(position, tuple)| {
            let mut row = VehicleDimensionRow {
                id_vehiculo: position as i64 + 1,
                ..Default::default()
            };
            for (field, value) in distinct.columns.iter().zip(tuple) {
                row.set_attribute(*field, value);
            }
            row
        })
        .collect();

    info!(
        rows = rows.len(),
        source_rows = raw.len(),
        columns = distinct.columns.len(),
        "Built vehicle dimension"
    );

    VehicleDimension {
        columns: distinct.columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const CSV: &str = "\
CÓDIGO DE VEHÍCULO,MARCA,MODELO,COLOR 1,COLOR 2,AVALUO
V1,toyota ,corolla,BLANCO,,100
V1,TOYOTA,COROLLA,BLANCO,,200
V2,kia,rio,ROJO,NEGRO,300
V1,toyota,corolla,BLANCO,,400
";

    #[test]
    fn deduplicates_normalized_tuples_in_first_seen_order() {
        let raw = RawTable::from_csv(CSV).unwrap();
        let dim = build_vehicle_dimension(&raw);

        assert_eq!(dim.len(), 2);
        assert_eq!(dim.rows[0].id_vehiculo, 1);
        assert_eq!(dim.rows[0].codigo_vehiculo.as_deref(), Some("V1"));
        assert_eq!(dim.rows[0].marca.as_deref(), Some("TOYOTA"));
        assert_eq!(dim.rows[0].modelo.as_deref(), Some("COROLLA"));
        assert_eq!(dim.rows[0].color2.as_deref(), Some(MISSING_COLOR));
        assert_eq!(dim.rows[1].id_vehiculo, 2);
        assert_eq!(dim.rows[1].marca.as_deref(), Some("KIA"));
        assert_eq!(dim.rows[1].color2.as_deref(), Some("NEGRO"));
    }

    #[test]
    fn only_present_columns_are_selected_in_warehouse_order() {
        let raw = RawTable::from_csv(CSV).unwrap();
        let dim = build_vehicle_dimension(&raw);
        assert_eq!(
            dim.columns,
            vec![
                SourceField::VehicleCode,
                SourceField::Brand,
                SourceField::Model,
                SourceField::Color1,
                SourceField::Color2,
            ]
        );
        assert!(!dim.has_column(SourceField::Class));
        assert!(dim.rows.iter().all(|row| row.clase.is_none()));
    }

    #[test]
    fn rows_are_pairwise_distinct_and_rebuilds_are_identical() {
        let raw = RawTable::from_csv(CSV).unwrap();
        let first = build_vehicle_dimension(&raw);
        let second = build_vehicle_dimension(&raw);
        assert_eq!(first, second);

        let tuples: HashSet<_> = first
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.id_vehiculo = 0;
                row
            })
            .collect();
        assert_eq!(tuples.len(), first.len());
    }

    #[test]
    fn no_vehicle_columns_still_yields_the_default_row() {
        let raw = RawTable::from_csv("AVALUO\n1\n2\n").unwrap();
        let dim = build_vehicle_dimension(&raw);
        assert!(dim.columns.is_empty());
        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].id_vehiculo, 1);
    }
}
