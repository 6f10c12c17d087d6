use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
// Month-first wins for ambiguous slash/dash dates; day-first only when that fails.
const NUMERIC_FORMATS: [&str; 4] = ["%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Coerces a process-date cell into a calendar day, discarding any time part.
///
/// Returns `None` for anything that does not look like a date; the caller
/// drops such rows.
pub fn parse_permissive_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        return compact_date(value);
    }

    DATE_FORMATS
        .iter()
        .chain(NUMERIC_FORMATS.iter())
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn compact_date(value: &str) -> Option<NaiveDate> {
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn accepts_common_layouts() {
        assert_eq!(parse_permissive_date("2024-03-15"), date(2024, 3, 15));
        assert_eq!(parse_permissive_date(" 2024/03/15 "), date(2024, 3, 15));
        assert_eq!(parse_permissive_date("20240315"), date(2024, 3, 15));
        assert_eq!(parse_permissive_date("2024-03-15 10:22:01"), date(2024, 3, 15));
        assert_eq!(parse_permissive_date("2024-03-15T10:22:01.250"), date(2024, 3, 15));
        assert_eq!(parse_permissive_date("2024-03-15T10:22:01Z"), date(2024, 3, 15));
    }

    #[test]
    fn ambiguous_slash_dates_are_month_first() {
        assert_eq!(parse_permissive_date("05/03/2024"), date(2024, 5, 3));
        assert_eq!(parse_permissive_date("05-03-2024"), date(2024, 5, 3));
        assert_eq!(parse_permissive_date("12/25/2024"), date(2024, 12, 25));
    }

    #[test]
    fn day_first_is_the_fallback_when_month_first_is_impossible() {
        assert_eq!(parse_permissive_date("25/12/2024"), date(2024, 12, 25));
        assert_eq!(parse_permissive_date("31-01-2024"), date(2024, 1, 31));
        assert_eq!(parse_permissive_date("13/13/2024"), None);
    }

    #[test]
    fn rejects_garbage_and_impossible_days() {
        assert_eq!(parse_permissive_date("not-a-date"), None);
        assert_eq!(parse_permissive_date("2024-02-30"), None);
        assert_eq!(parse_permissive_date("20241301"), None);
        assert_eq!(parse_permissive_date(""), None);
    }
}
