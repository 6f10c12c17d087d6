use crate::columns::SourceField;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct VehicleDimensionRow {
    pub id_vehiculo: i64,
    pub codigo_vehiculo: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub pais: Option<String>,
    pub anio_modelo: Option<String>,
    pub clase: Option<String>,
    pub sub_clase: Option<String>,
    pub tipo: Option<String>,
    pub cilindraje: Option<String>,
    pub tipo_combustible: Option<String>,
    pub color1: Option<String>,
    pub color2: Option<String>,
}

impl VehicleDimensionRow {
    fn slot_mut(&mut self, field: SourceField) -> Option<&mut Option<String>> {
        match field {
            SourceField::VehicleCode => Some(&mut self.codigo_vehiculo),
            SourceField::Brand => Some(&mut self.marca),
            SourceField::Model => Some(&mut self.modelo),
            SourceField::Country => Some(&mut self.pais),
            SourceField::ModelYear => Some(&mut self.anio_modelo),
            SourceField::Class => Some(&mut self.clase),
            SourceField::SubClass => Some(&mut self.sub_clase),
            SourceField::VehicleType => Some(&mut self.tipo),
            SourceField::Displacement => Some(&mut self.cilindraje),
            SourceField::FuelType => Some(&mut self.tipo_combustible),
            SourceField::Color1 => Some(&mut self.color1),
            SourceField::Color2 => Some(&mut self.color2),
            _ => None,
        }
    }

    pub fn attribute(&self, field: SourceField) -> Option<&str> {
        let value = match field {
            SourceField::VehicleCode => &self.codigo_vehiculo,
            SourceField::Brand => &self.marca,
            SourceField::Model => &self.modelo,
            SourceField::Country => &self.pais,
            SourceField::ModelYear => &self.anio_modelo,
            SourceField::Class => &self.clase,
            SourceField::SubClass => &self.sub_clase,
            SourceField::VehicleType => &self.tipo,
            SourceField::Displacement => &self.cilindraje,
            SourceField::FuelType => &self.tipo_combustible,
            SourceField::Color1 => &self.color1,
            SourceField::Color2 => &self.color2,
            _ => return None,
        };
        value.as_deref()
    }

    /// Stores a vehicle attribute; fields outside the vehicle set are ignored.
    pub fn set_attribute(&mut self, field: SourceField, value: Option<String>) {
        if let Some(slot) = self.slot_mut(field) {
            *slot = value;
        }
    }
}

/// Vehicle attributes present in the extract plus the deduplicated rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleDimension {
    /// Present attribute columns, in warehouse order.
    pub columns: Vec<SourceField>,
    pub rows: Vec<VehicleDimensionRow>,
}

impl VehicleDimension {
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
