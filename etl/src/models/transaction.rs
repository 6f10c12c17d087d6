use crate::columns::SourceField;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionDimensionRow {
    pub id_transaccion: i64,
    pub tipo_transaccion: Option<String>,
    pub tipo_servicio: Option<String>,
    pub persona_tipo: Option<String>,
    pub categoria: Option<String>,
}

impl TransactionDimensionRow {
    pub fn attribute(&self, field: SourceField) -> Option<&str> {
        let value = match field {
            SourceField::TransactionType => &self.tipo_transaccion,
            SourceField::ServiceType => &self.tipo_servicio,
            SourceField::PersonType => &self.persona_tipo,
            SourceField::Category => &self.categoria,
            _ => return None,
        };
        value.as_deref()
    }

    /// Stores a transaction attribute; fields outside the transaction set are ignored.
    pub fn set_attribute(&mut self, field: SourceField, value: Option<String>) {
        let slot = match field {
            SourceField::TransactionType => &mut self.tipo_transaccion,
            SourceField::ServiceType => &mut self.tipo_servicio,
            SourceField::PersonType => &mut self.persona_tipo,
            SourceField::Category => &mut self.categoria,
            _ => return,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDimension {
    pub columns: Vec<SourceField>,
    pub rows: Vec<TransactionDimensionRow>,
}

impl TransactionDimension {
    pub fn has_column(&self, field: SourceField) -> bool {
        self.columns.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
