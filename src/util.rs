use crate::error::{RepopulseError, Result};
use crate::model::DateRange;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// UTC calendar day of a timestamp, zero-padded so that lexicographic order
/// equals chronological order.
pub fn day_key(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

pub fn hours_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> f64 {
    (*end - *start).num_seconds() as f64 / 3600.0
}

/// Parse an RFC3339 timestamp, a `YYYY-MM-DD` date, or a humantime-style
/// "<duration> ago" expression into a UTC instant.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(DateTime::from_naive_utc_and_offset(
            date.and_time(NaiveTime::MIN),
            Utc,
        ));
    }
    if let Some(stripped) = input.strip_suffix("ago") {
        if let Ok(duration) = humantime::parse_duration(stripped.trim()) {
            let offset = chrono::Duration::from_std(duration)
                .map_err(|e| RepopulseError::InvalidDate(e.to_string()))?;
            return Ok(Utc::now() - offset);
        }
    }
    Err(RepopulseError::InvalidDate(format!(
        "Unrecognized date: {input}"
    )))
}

pub fn resolve_range(since: Option<&str>, until: Option<&str>) -> Result<DateRange> {
    let mut range = DateRange::new();

    let since_dt = since.map(parse_date).transpose()?;
    let until_dt = until.map(parse_date).transpose()?;

    if let (Some(s), Some(u)) = (since_dt, until_dt) {
        if s > u {
            return Err(RepopulseError::InvalidDate(format!(
                "Invalid range: since ({}) is after until ({})",
                s, u
            )));
        }
    }

    if let Some(s) = since_dt {
        range = range.with_since(s);
    }
    if let Some(u) = until_dt {
        range = range.with_until(u);
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_key_truncates_in_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 0).unwrap();
        assert_eq!(day_key(&ts), "2024-03-05");
    }

    #[test]
    fn parse_date_accepts_plain_days() {
        let dt = parse_date("2024-03-05").unwrap();
        assert_eq!(day_key(&dt), "2024-03-05");
    }

    #[test]
    fn resolve_range_rejects_inverted_bounds() {
        assert!(resolve_range(Some("2024-06-01"), Some("2024-01-01")).is_err());
    }

    #[test]
    fn resolve_range_contains_inclusive_bounds() {
        let range = resolve_range(Some("2024-01-01"), Some("2024-02-01")).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert!(range.contains(&inside));
        assert!(!range.contains(&before));
    }
}
