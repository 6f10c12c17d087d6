use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use common::{Error, Result};

fn downcast<'a, T: 'static>(array: &'a dyn Array, type_name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::Other(format!("Failed to downcast to {}", type_name)))
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        Error::SchemaValidation(format!("Result set has no column '{}'", name))
    })
}

/// Reads a numeric result column as `i64`, whatever integer type the engine chose.
pub fn i64_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<i64>>> {
    let casted = cast(column(batch, name)?, &DataType::Int64)?;
    let array = downcast::<Int64Array>(casted.as_ref(), "Int64Array")?;
    Ok(array.iter().collect())
}

pub fn f64_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = cast(column(batch, name)?, &DataType::Float64)?;
    let array = downcast::<Float64Array>(casted.as_ref(), "Float64Array")?;
    Ok(array.iter().collect())
}

pub fn string_values(batch: &RecordBatch, name: &str) -> Result<Vec<Option<String>>> {
    let casted = cast(column(batch, name)?, &DataType::Utf8)?;
    let array = downcast::<StringArray>(casted.as_ref(), "StringArray")?;
    Ok(array.iter().map(|value| value.map(str::to_string)).collect())
}

/// First-row scalar of a single-row aggregate result.
pub fn scalar_i64(batches: &[RecordBatch], name: &str) -> Result<Option<i64>> {
    match batches.iter().find(|batch| batch.num_rows() > 0) {
        Some(batch) => Ok(i64_values(batch, name)?.into_iter().next().flatten()),
        None => Ok(None),
    }
}

pub fn scalar_f64(batches: &[RecordBatch], name: &str) -> Result<Option<f64>> {
    match batches.iter().find(|batch| batch.num_rows() > 0) {
        Some(batch) => Ok(f64_values(batch, name)?.into_iter().next().flatten()),
        None => Ok(None),
    }
}

pub fn scalar_string(batches: &[RecordBatch], name: &str) -> Result<Option<String>> {
    match batches.iter().find(|batch| batch.num_rows() > 0) {
        Some(batch) => Ok(string_values(batch, name)?.into_iter().next().flatten()),
        None => Ok(None),
    }
}
