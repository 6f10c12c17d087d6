use crate::columns::SourceField;
use crate::extract::RawTable;
use crate::models::{LocationDimension, LocationDimensionRow};
use crate::reference::{COUNTRY, lookup_canton};
use std::collections::HashSet;
use tracing::{info, warn};

/// Code of the single row emitted when the extract has no usable canton code.
pub const UNSPECIFIED_CANTON_CODE: &str = "99999";
const UNSPECIFIED_CANTON_NAME: &str = "NO_ESPECIFICADO";
const UNSPECIFIED_AREA: &str = "NO_ESPECIFICADA";
const UNIDENTIFIED_AREA: &str = "NO_IDENTIFICADA";

/// One row per distinct canton code of the extract, resolved against the
/// static reference table. Unknown codes are kept with placeholder names.
pub fn build_location_dimension(raw: &RawTable) -> LocationDimension {
    let Some(index) = raw.mapping.index(SourceField::Canton) else {
        warn!("No canton column found, using a generic location");
        return unspecified_location();
    };

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut unresolved = 0usize;

    for code in raw.records.iter().filter_map(|record| record.get(index)) {
        let code = code.trim();
        if !seen.insert(code.to_string()) {
            continue;
        }

        let id_ubicacion = rows.len() as i64 + 1;
        let row = match lookup_canton(code) {
            Some(info) => LocationDimensionRow {
                id_ubicacion,
                codigo_canton: code.to_string(),
                nombre_canton: info.canton.to_string(),
                provincia: info.province.to_string(),
                region: info.region.to_string(),
                pais: COUNTRY.to_string(),
            },
            None => {
                unresolved += 1;
                LocationDimensionRow {
                    id_ubicacion,
                    codigo_canton: code.to_string(),
                    nombre_canton: format!("CANTON_{}", code),
                    provincia: UNIDENTIFIED_AREA.to_string(),
                    region: UNIDENTIFIED_AREA.to_string(),
                    pais: COUNTRY.to_string(),
                }
            }
        };
        rows.push(row);
    }

    if rows.is_empty() {
        warn!("Canton column holds no codes, using a generic location");
        return unspecified_location();
    }

    if unresolved > 0 {
        warn!(unresolved, "Canton codes missing from the reference table");
    }
    info!(rows = rows.len(), "Built location dimension");

    LocationDimension { rows }
}

fn unspecified_location() -> LocationDimension {
    LocationDimension {
        rows: vec![LocationDimensionRow {
            id_ubicacion: 1,
            codigo_canton: UNSPECIFIED_CANTON_CODE.to_string(),
            nombre_canton: UNSPECIFIED_CANTON_NAME.to_string(),
            provincia: UNSPECIFIED_AREA.to_string(),
            region: UNSPECIFIED_AREA.to_string(),
            pais: COUNTRY.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_codes_both_produce_rows() {
        let raw = RawTable::from_csv("CANTON\n21101\n00000\n21101\n").unwrap();
        let dim = build_location_dimension(&raw);

        assert_eq!(dim.len(), 2);
        let known = &dim.rows[0];
        assert_eq!(known.id_ubicacion, 1);
        assert_eq!(known.nombre_canton, "GUAYAQUIL");
        assert_eq!(known.provincia, "GUAYAS");
        assert_eq!(known.region, "COSTA");
        assert_eq!(known.pais, "ECUADOR");

        let unknown = &dim.rows[1];
        assert_eq!(unknown.id_ubicacion, 2);
        assert_eq!(unknown.codigo_canton, "00000");
        assert_eq!(unknown.nombre_canton, "CANTON_00000");
        assert_eq!(unknown.provincia, "NO_IDENTIFICADA");
        assert_eq!(unknown.region, "NO_IDENTIFICADA");
    }

    #[test]
    fn missing_canton_column_yields_the_synthetic_row() {
        let raw = RawTable::from_csv("MARCA\nKIA\nFORD\n").unwrap();
        let dim = build_location_dimension(&raw);

        assert_eq!(dim.len(), 1);
        let row = &dim.rows[0];
        assert_eq!(row.id_ubicacion, 1);
        assert_eq!(row.codigo_canton, UNSPECIFIED_CANTON_CODE);
        assert_eq!(row.nombre_canton, "NO_ESPECIFICADO");
        assert_eq!(row.provincia, "NO_ESPECIFICADA");
    }

    #[test]
    fn alternate_header_and_null_codes() {
        let raw = RawTable::from_csv("cantón,MARCA\n,KIA\n20501,FORD\n").unwrap();
        let dim = build_location_dimension(&raw);
        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].nombre_canton, "QUITO");
        assert_eq!(dim.rows[0].id_ubicacion, 1);
    }

    #[test]
    fn all_null_canton_column_yields_the_synthetic_row() {
        let raw = RawTable::from_csv("CANTON,MARCA\n,kia\nNULL,ford\n").unwrap();
        let dim = build_location_dimension(&raw);

        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].id_ubicacion, 1);
        assert_eq!(dim.rows[0].codigo_canton, UNSPECIFIED_CANTON_CODE);
        assert_eq!(dim.rows[0].nombre_canton, "NO_ESPECIFICADO");
    }
}
