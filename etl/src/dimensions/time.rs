use crate::models::{TimeDimension, TimeDimensionRow};
use crate::reference::{localized_month, localized_weekday};
use chrono::{Datelike, NaiveDate};
use common::{Error, Result};
use tracing::info;

/// First calendar day covered by the time dimension.
pub const TIME_RANGE_START: (i32, u32, u32) = (2020, 1, 1);
/// Last calendar day covered by the time dimension (inclusive).
pub const TIME_RANGE_END: (i32, u32, u32) = (2025, 12, 31);

/// Builds the fixed 2020-01-01..=2025-12-31 calendar.
pub fn build_time_dimension() -> Result<TimeDimension> {
    let start = ymd(TIME_RANGE_START)?;
    let end = ymd(TIME_RANGE_END)?;
    build_time_dimension_between(start, end)
}

/// One row per day in `start..=end`, keyed 1.. in date order.
pub fn build_time_dimension_between(start: NaiveDate, end: NaiveDate) -> Result<TimeDimension> {
    if end < start {
        return Err(Error::InvalidInput(format!(
            "Time dimension range is empty: {} > {}",
            start, end
        )));
    }

    let mut rows = Vec::new();
    for (offset, date) in start.iter_days().take_while(|date| *date <= end).enumerate() {
        let month_name = date.format("%B").to_string();
        let weekday_name = date.format("%A").to_string();

        rows.push(TimeDimensionRow {
            id_tiempo: offset as i64 + 1,
            fecha_completa: date,
            anio: date.year(),
            trimestre: (date.month() - 1) / 3 + 1,
            mes: date.month(),
            dia: date.day(),
            nombre_mes: localized_month(&month_name)?.to_string(),
            nombre_dia_semana: localized_weekday(&weekday_name)?.to_string(),
        });
    }

    info!(rows = rows.len(), %start, %end, "Built time dimension");
    Ok(TimeDimension::new(rows))
}

fn ymd((year, month, day): (i32, u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::InvalidInput(format!("Invalid date {}-{}-{}", year, month, day)))
}
