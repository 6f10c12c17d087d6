use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Logical source fields the warehouse knows how to read.
///
/// The extract has no fixed schema, so each field is probed through an
/// ordered list of exact header aliases; the first alias present wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceField {
    VehicleCode,
    Brand,
    Model,
    Country,
    ModelYear,
    Class,
    SubClass,
    VehicleType,
    Displacement,
    FuelType,
    Color1,
    Color2,
    TransactionType,
    ServiceType,
    PersonType,
    Category,
    Canton,
    ProcessDate,
    Appraisal,
}

/// Vehicle attributes in warehouse column order.
pub const VEHICLE_FIELDS: [SourceField; 12] = [
    SourceField::VehicleCode,
    SourceField::Brand,
    SourceField::Model,
    SourceField::Country,
    SourceField::ModelYear,
    SourceField::Class,
    SourceField::SubClass,
    SourceField::VehicleType,
    SourceField::Displacement,
    SourceField::FuelType,
    SourceField::Color1,
    SourceField::Color2,
];

/// Transaction attributes in warehouse column order.
pub const TRANSACTION_FIELDS: [SourceField; 4] = [
    SourceField::TransactionType,
    SourceField::ServiceType,
    SourceField::PersonType,
    SourceField::Category,
];

impl SourceField {
    pub const ALL: [SourceField; 19] = [
        SourceField::VehicleCode,
        SourceField::Brand,
        SourceField::Model,
        SourceField::Country,
        SourceField::ModelYear,
        SourceField::Class,
        SourceField::SubClass,
        SourceField::VehicleType,
        SourceField::Displacement,
        SourceField::FuelType,
        SourceField::Color1,
        SourceField::Color2,
        SourceField::TransactionType,
        SourceField::ServiceType,
        SourceField::PersonType,
        SourceField::Category,
        SourceField::Canton,
        SourceField::ProcessDate,
        SourceField::Appraisal,
    ];

    /// Header names probed for this field, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::VehicleCode => &[
                "CÓDIGO DE VEHÍCULO",
                "CODIGO DE VEHICULO",
                "CODIGO_VEHICULO",
                "codigo_vehiculo",
            ],
            Self::Brand => &["MARCA"],
            Self::Model => &["MODELO"],
            Self::Country => &["PAÍS", "PAIS"],
            Self::ModelYear => &["AÑO MODELO", "ANIO MODELO"],
            Self::Class => &["CLASE"],
            Self::SubClass => &["SUB CLASE"],
            Self::VehicleType => &["TIPO"],
            Self::Displacement => &["CILINDRAJE"],
            Self::FuelType => &["TIPO COMBUSTIBLE"],
            Self::Color1 => &["COLOR 1"],
            Self::Color2 => &["COLOR 2"],
            Self::TransactionType => &["TIPO TRANSACCIÓN", "TIPO TRANSACCION"],
            Self::ServiceType => &["TIPO SERVICIO"],
            Self::PersonType => &["PERSONA NATURAL - JURÍDICA", "PERSONA NATURAL - JURIDICA"],
            Self::Category => &["CATEGORÍA", "CATEGORIA"],
            Self::Canton => &["CANTON", "CANTÓN", "canton", "cantón"],
            Self::ProcessDate => &["FECHA PROCESO", "FECHA_PROCESO", "fecha_proceso", "FECHA"],
            Self::Appraisal => &["AVALUO", "AVALÚO", "avaluo", "avalúo"],
        }
    }

    /// Column name used for this field in the warehouse tables.
    pub fn warehouse_name(self) -> &'static str {
        match self {
            Self::VehicleCode => "CodigoVehiculo",
            Self::Brand => "Marca",
            Self::Model => "Modelo",
            Self::Country => "Pais",
            Self::ModelYear => "AnioModelo",
            Self::Class => "Clase",
            Self::SubClass => "SubClase",
            Self::VehicleType => "Tipo",
            Self::Displacement => "Cilindraje",
            Self::FuelType => "TipoCombustible",
            Self::Color1 => "Color1",
            Self::Color2 => "Color2",
            Self::TransactionType => "TipoTransaccion",
            Self::ServiceType => "TipoServicio",
            Self::PersonType => "PersonaTipo",
            Self::Category => "Categoria",
            Self::Canton => "CodigoCanton",
            Self::ProcessDate => "FechaProceso",
            Self::Appraisal => "MontoAvaluo",
        }
    }
}

/// Where a resolved field lives in the extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Logical field → source column, resolved once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    resolved: BTreeMap<SourceField, ResolvedColumn>,
}

impl ColumnMapping {
    pub fn resolve(headers: &[String]) -> Self {
        // First occurrence wins when a header is repeated.
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            positions.entry(header.as_str()).or_insert(index);
        }

        let mut resolved = BTreeMap::new();
        for field in SourceField::ALL {
            let hit = field
                .aliases()
                .iter()
                .find_map(|alias| positions.get(alias).map(|index| (*index, *alias)));

            if let Some((index, alias)) = hit {
                debug!(?field, header = alias, index, "Resolved source column");
                resolved.insert(
                    field,
                    ResolvedColumn {
                        index,
                        header: alias.to_string(),
                    },
                );
            }
        }

        Self { resolved }
    }

    pub fn index(&self, field: SourceField) -> Option<usize> {
        self.resolved.get(&field).map(|column| column.index)
    }

    pub fn header(&self, field: SourceField) -> Option<&str> {
        self.resolved.get(&field).map(|column| column.header.as_str())
    }

    pub fn contains(&self, field: SourceField) -> bool {
        self.resolved.contains_key(&field)
    }

    /// The subset of `fields` found in the extract, in the given order.
    pub fn present(&self, fields: &[SourceField]) -> Vec<SourceField> {
        fields
            .iter()
            .copied()
            .filter(|field| self.contains(*field))
            .collect()
    }

    pub fn missing(&self, fields: &[SourceField]) -> Vec<SourceField> {
        fields
            .iter()
            .copied()
            .filter(|field| !self.contains(*field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn first_alias_in_priority_order_wins() {
        let mapping = ColumnMapping::resolve(&headers(&["FECHA", "fecha_proceso", "MARCA"]));
        assert_eq!(mapping.header(SourceField::ProcessDate), Some("fecha_proceso"));
        assert_eq!(mapping.index(SourceField::ProcessDate), Some(1));
        assert_eq!(mapping.index(SourceField::Brand), Some(2));
    }

    #[test]
    fn aliases_are_exact_matches() {
        let mapping = ColumnMapping::resolve(&headers(&["Canton ", "MARCA_X"]));
        assert!(!mapping.contains(SourceField::Canton));
        assert!(!mapping.contains(SourceField::Brand));
    }

    #[test]
    fn repeated_header_resolves_to_first_position() {
        let mapping = ColumnMapping::resolve(&headers(&["MARCA", "MODELO", "MARCA"]));
        assert_eq!(mapping.index(SourceField::Brand), Some(0));
    }

    #[test]
    fn present_preserves_requested_order_regardless_of_header_order() {
        let a = ColumnMapping::resolve(&headers(&["COLOR 1", "MARCA", "CÓDIGO DE VEHÍCULO"]));
        let b = ColumnMapping::resolve(&headers(&["CÓDIGO DE VEHÍCULO", "COLOR 1", "MARCA"]));
        let expected = vec![SourceField::VehicleCode, SourceField::Brand, SourceField::Color1];
        assert_eq!(a.present(&VEHICLE_FIELDS), expected);
        assert_eq!(b.present(&VEHICLE_FIELDS), expected);
        assert_eq!(a.missing(&VEHICLE_FIELDS).len(), 9);
    }
}
