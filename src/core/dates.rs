//! Date coercion and day arithmetic for the disbursement column.
//!
//! Coercion never fails: anything that cannot be read as a date becomes
//! [`CellValue::Empty`] so the row survives with an undefined ageing.

use crate::error::{AgeingError, AgeingResult};
use crate::types::CellValue;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Datetime layouts tried before the date-only ones.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Month-first like the spreadsheets this tool receives; `%d/%m/%Y` is
/// deliberately absent because it is ambiguous with `%m/%d/%Y`.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parse a `YYYY-MM-DD` reference date; no value means today.
pub fn parse_reference_date(date: Option<&str>) -> AgeingResult<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| AgeingError::InvalidReferenceDate(s.to_string())),
        None => Ok(Local::now().date_naive()),
    }
}

/// Coerce one cell of the disbursement column to a datetime, or `Empty`.
pub fn coerce_date(value: &CellValue) -> CellValue {
    let parsed = match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(serial) => excel_serial_to_datetime(*serial),
        CellValue::Integer(serial) => excel_serial_to_datetime(*serial as f64),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Boolean(_) | CellValue::Empty => None,
    };
    parsed.map_or(CellValue::Empty, CellValue::DateTime)
}

/// Parse a textual date or datetime using the accepted layouts.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    // Compact YYYYMMDD
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN));
    }

    None
}

/// Convert an Excel 1900-system serial (days since 1899-12-30, with the
/// phantom 1900-02-29) to a datetime. Serials below 1 are rejected.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Serials before the phantom leap day are shifted by one.
    let serial = if serial >= 60.0 { serial } else { serial + 1.0 };
    let seconds = (serial * SECONDS_PER_DAY as f64).round();
    if seconds > i64::MAX as f64 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    epoch.checked_add_signed(Duration::try_seconds(seconds as i64)?)
}

/// Inverse of [`excel_serial_to_datetime`]; `None` before 1900-01-01.
pub fn datetime_to_excel_serial(dt: NaiveDateTime) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let serial = (dt - epoch).num_milliseconds() as f64 / (SECONDS_PER_DAY * 1000) as f64;
    if serial < 2.0 {
        return None;
    }
    Some(if serial < 61.0 { serial - 1.0 } else { serial })
}

/// Whole days from `disbursed` to `reference`, floored.
///
/// A disbursement later than the reference date yields a negative count; a
/// disbursement at noon on the reference date yields `-1`.
pub fn days_between(reference: NaiveDate, disbursed: NaiveDateTime) -> i64 {
    let elapsed = reference.and_time(NaiveTime::MIN) - disbursed;
    elapsed.num_seconds().div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_parse_reference_date_explicit() {
        assert_eq!(parse_reference_date(Some("2022-03-02")).unwrap(), date(2022, 3, 2));
        assert_eq!(parse_reference_date(Some(" 2024-02-29 ")).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_parse_reference_date_invalid() {
        let err = parse_reference_date(Some("02/03/2022")).unwrap_err();
        assert!(matches!(err, AgeingError::InvalidReferenceDate(_)));
        assert!(parse_reference_date(Some("2023-02-29")).is_err());
    }

    #[test]
    fn test_parse_reference_date_defaults_to_today() {
        assert_eq!(parse_reference_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_iso_and_slashed() {
        assert_eq!(parse_date_text("2023-01-01"), Some(midnight(2023, 1, 1)));
        assert_eq!(parse_date_text(" 2023/01/31 "), Some(midnight(2023, 1, 31)));
        assert_eq!(parse_date_text("01/02/2023"), Some(midnight(2023, 1, 2)));
    }

    #[test]
    fn test_parse_month_names() {
        assert_eq!(parse_date_text("05-Jan-2023"), Some(midnight(2023, 1, 5)));
        assert_eq!(parse_date_text("5 March 2023"), Some(midnight(2023, 3, 5)));
        assert_eq!(parse_date_text("Mar 5, 2023"), Some(midnight(2023, 3, 5)));
    }

    #[test]
    fn test_parse_datetime_and_compact() {
        let expected = date(2023, 1, 1).and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(parse_date_text("2023-01-01 12:30:00"), Some(expected));
        assert_eq!(parse_date_text("2023-01-01T12:30:00"), Some(expected));
        assert_eq!(parse_date_text("20230101"), Some(midnight(2023, 1, 1)));
        assert_eq!(parse_date_text("20231301"), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("not a date"), None);
        assert_eq!(parse_date_text("2023-02-30"), None);
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_datetime(44927.0), Some(midnight(2023, 1, 1)));
        assert_eq!(excel_serial_to_datetime(1.0), Some(midnight(1900, 1, 1)));
        assert_eq!(excel_serial_to_datetime(61.0), Some(midnight(1900, 3, 1)));
        assert_eq!(
            excel_serial_to_datetime(44927.5),
            Some(date(2023, 1, 1).and_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(excel_serial_to_datetime(0.0), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_datetime_to_excel_serial() {
        assert_eq!(datetime_to_excel_serial(midnight(2023, 1, 1)), Some(44927.0));
        assert_eq!(datetime_to_excel_serial(midnight(1900, 1, 1)), Some(1.0));
        assert_eq!(datetime_to_excel_serial(midnight(1900, 3, 1)), Some(61.0));
        assert_eq!(datetime_to_excel_serial(midnight(1899, 6, 1)), None);
        let noon = date(2023, 1, 1).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(datetime_to_excel_serial(noon), Some(44927.5));
    }

    #[test]
    fn test_coerce_date_variants() {
        assert_eq!(
            coerce_date(&CellValue::text("2022-01-01")),
            CellValue::DateTime(midnight(2022, 1, 1))
        );
        assert_eq!(
            coerce_date(&CellValue::Integer(44927)),
            CellValue::DateTime(midnight(2023, 1, 1))
        );
        assert_eq!(coerce_date(&CellValue::Boolean(true)), CellValue::Empty);
        assert_eq!(coerce_date(&CellValue::text("soon")), CellValue::Empty);
        assert_eq!(coerce_date(&CellValue::Empty), CellValue::Empty);
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2023, 3, 2), midnight(2023, 1, 1)), 60);
        assert_eq!(days_between(date(2023, 1, 1), midnight(2023, 1, 11)), -10);
        assert_eq!(days_between(date(2024, 3, 1), midnight(2024, 2, 1)), 29);
    }

    #[test]
    fn test_days_between_floors_partial_days() {
        let noon = date(2023, 1, 1).and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(days_between(date(2023, 1, 1), noon), -1);
        assert_eq!(days_between(date(2023, 1, 3), noon), 1);
    }
}
