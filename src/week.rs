use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::errors::ScoreboardError;

/// ISO-8601 week label for a date, e.g. `2024-W01`.
///
/// Weeks start on Monday and the year is attributed by the week's Thursday,
/// so a date in late December can land in week 1 of the next ISO year and a
/// date in early January in week 52 or 53 of the previous one. Records are
/// stamped with this label at submission time and every query buckets by
/// it, so recomputation has to be bit-identical across call sites.
pub fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Parse a `YYYY-MM-DD` date. Unparseable input is an `InvalidDate`
/// sentinel, never a panic.
pub fn parse_date(input: &str) -> Result<NaiveDate, ScoreboardError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ScoreboardError::InvalidDate(input.to_string()))
}

/// Monday of the week named by a label such as `2024-W01`.
pub fn week_start(label: &str) -> Result<NaiveDate, ScoreboardError> {
    let invalid = || ScoreboardError::InvalidWeek(label.to_string());
    let (year, week) = label.split_once("-W").ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let week: u32 = week.parse().map_err(|_| invalid())?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(invalid)
}

/// Shift a week label by a signed number of weeks, crossing ISO year
/// boundaries where needed (one step back from `2024-W01` is `2023-W52`).
pub fn shift_week(label: &str, delta_weeks: i64) -> Result<String, ScoreboardError> {
    let start = week_start(label)?;
    let shifted = delta_weeks
        .checked_mul(7)
        .and_then(Duration::try_days)
        .and_then(|days| start.checked_add_signed(days))
        .ok_or_else(|| {
            ScoreboardError::InvalidWeek(format!("{label} {delta_weeks:+} weeks"))
        })?;
    Ok(week_label(shifted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_matches_iso_boundary_vectors() {
        let cases = [
            ((2005, 1, 1), "2004-W53"),
            ((1995, 1, 1), "1994-W52"),
            ((2024, 1, 1), "2024-W01"),
        ];
        for ((y, m, d), expected) in cases {
            let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            assert_eq!(week_label(date), expected);
        }
    }

    #[test]
    fn late_december_can_land_in_next_iso_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_label(date), "2025-W01");
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("not-a-date"),
            Err(ScoreboardError::InvalidDate(_))
        ));
        assert!(parse_date("2026-02-30").is_err());
        assert_eq!(
            parse_date("2026-02-02").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
        );
    }

    #[test]
    fn week_start_is_the_monday() {
        let start = week_start("2024-W01").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(week_label(start), "2024-W01");
    }

    #[test]
    fn shift_week_crosses_year_boundaries() {
        assert_eq!(shift_week("2024-W01", -1).unwrap(), "2023-W52");
        assert_eq!(shift_week("2023-W52", 1).unwrap(), "2024-W01");
        assert_eq!(shift_week("2026-W06", 0).unwrap(), "2026-W06");
    }

    #[test]
    fn shift_week_refuses_absurd_deltas_instead_of_panicking() {
        assert!(matches!(
            shift_week("2024-W01", i64::MAX),
            Err(ScoreboardError::InvalidWeek(_))
        ));
        assert!(shift_week("2024-W01", i64::MIN).is_err());
        assert!(shift_week("2024-W01", 1_000_000_000_000).is_err());
    }

    #[test]
    fn shift_week_rejects_malformed_labels() {
        assert!(shift_week("2024W01", 1).is_err());
        assert!(shift_week("2024-W99", 1).is_err());
        assert!(shift_week("", 1).is_err());
    }
}
