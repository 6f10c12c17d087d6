use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactRow {
    pub id_registro: i64,
    pub id_tiempo: i64,
    pub id_vehiculo: i64,
    pub id_transaccion: i64,
    pub id_ubicacion: i64,
    pub cantidad_registros: i64,
    pub monto_avaluo: f64,
}

/// Data-quality counters collected while building the fact table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactBuildStats {
    pub input_rows: usize,
    pub dropped_invalid_dates: usize,
    pub time_misses: usize,
    pub vehicle_misses: usize,
    pub transaction_misses: usize,
    pub location_misses: usize,
    pub zero_filled_amounts: usize,
    pub used_fallback_date: bool,
}
