use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationDimensionRow {
    pub id_ubicacion: i64,
    pub codigo_canton: String,
    pub nombre_canton: String,
    pub provincia: String,
    pub region: String,
    pub pais: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDimension {
    pub rows: Vec<LocationDimensionRow>,
}

impl LocationDimension {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
