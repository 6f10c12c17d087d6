use super::attributes::{Cleanup, distinct_attributes};
use crate::columns::TRANSACTION_FIELDS;
use crate::extract::RawTable;
use crate::models::{TransactionDimension, TransactionDimensionRow};
use tracing::{info, warn};

/// Distinct transaction/service/person/category combinations.
pub fn build_transaction_dimension(raw: &RawTable) -> TransactionDimension {
    let missing = raw.mapping.missing(&TRANSACTION_FIELDS);
    if !missing.is_empty() {
        warn!(?missing, "Transaction columns not found, using the rest");
    }

    let distinct = distinct_attributes(raw, &TRANSACTION_FIELDS, |_| Cleanup::UpperTrim);
    let rows: Vec<TransactionDimensionRow> = distinct
        .tuples
        .into_iter()
        .enumerate()
        .map(|(position, tuple)| {
            let mut row = TransactionDimensionRow {
                id_transaccion: position as i64 + 1,
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
        columns = ?distinct.columns,
        "Built transaction dimension"
    );

    TransactionDimension {
        columns: distinct.columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::SourceField;

    #[test]
    fn combinations_are_uppercased_and_unique() {
        let raw = RawTable::from_csv(
            "TIPO TRANSACCIÓN,TIPO SERVICIO,CATEGORÍA\n\
             inscripción,particular,NUEVO\n\
             INSCRIPCIÓN ,PARTICULAR,nuevo\n\
             traspaso,publico,USADO\n",
        )
        .unwrap();
        let dim = build_transaction_dimension(&raw);

        assert_eq!(
            dim.columns,
            vec![
                SourceField::TransactionType,
                SourceField::ServiceType,
                SourceField::Category
            ]
        );
        assert_eq!(dim.len(), 2);
        assert_eq!(dim.rows[0].tipo_transaccion.as_deref(), Some("INSCRIPCIÓN"));
        assert_eq!(dim.rows[0].categoria.as_deref(), Some("NUEVO"));
        assert_eq!(dim.rows[1].id_transaccion, 2);
        assert_eq!(dim.rows[1].tipo_servicio.as_deref(), Some("PUBLICO"));
        assert!(dim.rows[1].persona_tipo.is_none());
    }

    #[test]
    fn null_values_are_part_of_the_tuple() {
        let raw = RawTable::from_csv("TIPO SERVICIO\nPARTICULAR\n\nPARTICULAR\n,\n").unwrap();
        let dim = build_transaction_dimension(&raw);
        assert_eq!(dim.len(), 2);
        assert!(dim.rows[1].tipo_servicio.is_none());
    }
}
