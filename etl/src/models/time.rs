use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeDimensionRow {
    pub id_tiempo: i64,
    pub fecha_completa: NaiveDate,
    pub anio: i32,
    pub trimestre: u32,
    pub mes: u32,
    pub dia: u32,
    pub nombre_mes: String,
    pub nombre_dia_semana: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeDimension {
    pub rows: Vec<TimeDimensionRow>,
    by_date: HashMap<NaiveDate, i64>,
}

impl TimeDimension {
    pub fn new(rows: Vec<TimeDimensionRow>) -> Self {
        let by_date = rows
            .iter()
            .map(|row| (row.fecha_completa, row.id_tiempo))
            .collect();
        Self { rows, by_date }
    }

    /// Surrogate key of the calendar day, if it lies inside the dimension.
    pub fn key_for(&self, date: NaiveDate) -> Option<i64> {
        self.by_date.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
