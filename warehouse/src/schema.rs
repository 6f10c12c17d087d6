//! Arrow layouts of the five warehouse tables and the row → batch conversions.

use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use common::Result;
use etl::SourceField;
use etl::models::{
    FactRow, LocationDimension, TimeDimension, TransactionDimension, VehicleDimension,
};
use lazy_static::lazy_static;
use std::sync::Arc;

pub const TIME_TABLE: &str = "dim_tiempo";
pub const VEHICLE_TABLE: &str = "dim_vehiculo";
pub const TRANSACTION_TABLE: &str = "dim_transaccion";
pub const LOCATION_TABLE: &str = "dim_ubicacion";
pub const FACT_TABLE: &str = "fact_registro_vehiculos";

pub fn time_dimension_schema() -> Schema {
    Schema::new(vec![
        Field::new("ID_Tiempo", DataType::Int64, false),
        Field::new("FechaCompleta", DataType::Date32, false),
        Field::new("Anio", DataType::Int64, false),
        Field::new("Trimestre", DataType::Int64, false),
        Field::new("Mes", DataType::Int64, false),
        Field::new("Dia", DataType::Int64, false),
        Field::new("NombreMes", DataType::Utf8, false),
        Field::new("NombreDiaSemana", DataType::Utf8, false),
    ])
}

pub fn location_dimension_schema() -> Schema {
    Schema::new(vec![
        Field::new("ID_Ubicacion", DataType::Int64, false),
        Field::new("CodigoCanton", DataType::Utf8, false),
        Field::new("NombreCanton", DataType::Utf8, false),
        Field::new("Provincia", DataType::Utf8, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Pais", DataType::Utf8, false),
    ])
}

pub fn fact_schema() -> Schema {
    Schema::new(vec![
        Field::new("ID_Registro", DataType::Int64, false),
        Field::new("ID_Tiempo", DataType::Int64, false),
        Field::new("ID_Vehiculo", DataType::Int64, false),
        Field::new("ID_Transaccion", DataType::Int64, false),
        Field::new("ID_Ubicacion", DataType::Int64, false),
        Field::new("CantidadRegistros", DataType::Int64, false),
        Field::new("MontoAvaluo", DataType::Float64, false),
    ])
}

/// Attribute dimensions only carry the columns the extract provided.
pub fn attribute_dimension_schema(key: &str, columns: &[SourceField]) -> Schema {
    let mut fields = vec![Field::new(key, DataType::Int64, false)];
    fields.extend(
        columns
            .iter()
            .map(|column| Field::new(column.warehouse_name(), DataType::Utf8, true)),
    );
    Schema::new(fields)
}

lazy_static! {
    static ref TIME_DIMENSION_SCHEMA: SchemaRef = Arc::new(time_dimension_schema());
    static ref LOCATION_DIMENSION_SCHEMA: SchemaRef = Arc::new(location_dimension_schema());
    static ref FACT_SCHEMA: SchemaRef = Arc::new(fact_schema());
}

fn int64<I: IntoIterator<Item = i64>>(values: I) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(values))
}

fn text<'a, I: IntoIterator<Item = &'a str>>(values: I) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

pub fn time_dimension_batch(dimension: &TimeDimension) -> Result<RecordBatch> {
    let rows = &dimension.rows;
    let columns: Vec<ArrayRef> = vec![
        int64(rows.iter().map(|r| r.id_tiempo)),
        Arc::new(Date32Array::from_iter_values(
            rows.iter()
                .map(|r| Date32Type::from_naive_date(r.fecha_completa)),
        )),
        int64(rows.iter().map(|r| i64::from(r.anio))),
        int64(rows.iter().map(|r| i64::from(r.trimestre))),
        int64(rows.iter().map(|r| i64::from(r.mes))),
        int64(rows.iter().map(|r| i64::from(r.dia))),
        text(rows.iter().map(|r| r.nombre_mes.as_str())),
        text(rows.iter().map(|r| r.nombre_dia_semana.as_str())),
    ];
    Ok(RecordBatch::try_new(TIME_DIMENSION_SCHEMA.clone(), columns)?)
}

pub fn vehicle_dimension_batch(dimension: &VehicleDimension) -> Result<RecordBatch> {
    let schema = attribute_dimension_schema("ID_Vehiculo", &dimension.columns);
    let mut columns: Vec<ArrayRef> = vec![int64(dimension.rows.iter().map(|r| r.id_vehiculo))];
    for field in &dimension.columns {
        let values: StringArray = dimension
            .rows
            .iter()
            .map(|row| row.attribute(*field))
            .collect();
        columns.push(Arc::new(values));
    }
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub fn transaction_dimension_batch(dimension: &TransactionDimension) -> Result<RecordBatch> {
    let schema = attribute_dimension_schema("ID_Transaccion", &dimension.columns);
    let mut columns: Vec<ArrayRef> =
        vec![int64(dimension.rows.iter().map(|r| r.id_transaccion))];
    for field in &dimension.columns {
        let values: StringArray = dimension
            .rows
            .iter()
            .map(|row| row.attribute(*field))
            .collect();
        columns.push(Arc::new(values));
    }
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

pub fn location_dimension_batch(dimension: &LocationDimension) -> Result<RecordBatch> {
    let rows = &dimension.rows;
    let columns: Vec<ArrayRef> = vec![
        int64(rows.iter().map(|r| r.id_ubicacion)),
        text(rows.iter().map(|r| r.codigo_canton.as_str())),
        text(rows.iter().map(|r| r.nombre_canton.as_str())),
        text(rows.iter().map(|r| r.provincia.as_str())),
        text(rows.iter().map(|r| r.region.as_str())),
        text(rows.iter().map(|r| r.pais.as_str())),
    ];
    Ok(RecordBatch::try_new(
        LOCATION_DIMENSION_SCHEMA.clone(),
        columns,
    )?)
}

pub fn fact_batch(rows: &[FactRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        int64(rows.iter().map(|r| r.id_registro)),
        int64(rows.iter().map(|r| r.id_tiempo)),
        int64(rows.iter().map(|r| r.id_vehiculo)),
        int64(rows.iter().map(|r| r.id_transaccion)),
        int64(rows.iter().map(|r| r.id_ubicacion)),
        int64(rows.iter().map(|r| r.cantidad_registros)),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.monto_avaluo),
        )),
    ];
    Ok(RecordBatch::try_new(FACT_SCHEMA.clone(), columns)?)
}
