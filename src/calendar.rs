//! Working-day arithmetic for leave requests.
//!
//! Counting is synchronous and pure; the async entry point only exists
//! because holiday dates come from a collaborator.  Implement
//! [`HolidayProvider`] to plug in another source.

use crate::error::{PayrollError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// True for Monday to Friday dates that are not holidays.
pub fn is_working_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// Counts working days from `start` to `end`, both inclusive.
///
/// A reversed range (`start > end`) counts zero days; the bounds are not
/// swapped.
pub fn count_working_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    if start > end {
        return 0;
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day, holidays))
        .count() as u32
}

/// Source of public holiday dates.
#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// Holidays falling between `start` and `end` inclusive.  Returning
    /// dates outside the range is allowed; they are simply never matched.
    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> Result<HashSet<NaiveDate>>;
}

/// Fetches holidays from `provider` and counts working days between
/// `start` and `end` inclusive.  A reversed range returns 0 without
/// contacting the provider.
pub async fn calculate_working_days(
    start: NaiveDate,
    end: NaiveDate,
    provider: &dyn HolidayProvider,
) -> Result<u32> {
    if start > end {
        return Ok(0);
    }
    let holidays = provider.holidays(start, end).await?;
    Ok(count_working_days(start, end, &holidays))
}

/// A fixed, in-memory holiday set.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays {
    dates: HashSet<NaiveDate>,
}

impl StaticHolidays {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

#[async_trait]
impl HolidayProvider for StaticHolidays {
    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> Result<HashSet<NaiveDate>> {
        Ok(self
            .dates
            .iter()
            .copied()
            .filter(|d| *d >= start && *d <= end)
            .collect())
    }
}

/// A holiday entry as stored in the holidays file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(deserialize_with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
}

/// Accepts `YYYY-MM-DD` or a date-time and keeps only the calendar date.
fn calendar_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

fn parse_calendar_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(format!("unrecognised holiday date {raw:?}"))
}

/// Reads holidays from a JSON file holding an array of
/// `{"date": ..., "name": ...}` entries.  The file is read on every
/// request so edits are picked up without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileHolidays {
    path: PathBuf,
}

impl JsonFileHolidays {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HolidayProvider for JsonFileHolidays {
    async fn holidays(&self, start: NaiveDate, end: NaiveDate) -> Result<HashSet<NaiveDate>> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            PayrollError::Holidays(format!("{}: {err}", self.path.display()))
        })?;
        let entries: Vec<Holiday> = serde_json::from_str(&data).map_err(|err| {
            PayrollError::Holidays(format!("{}: {err}", self.path.display()))
        })?;
        Ok(entries
            .into_iter()
            .map(|h| h.date)
            .filter(|d| *d >= start && *d <= end)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_weekday_counts_once() {
        // 2026-10-19 is a Monday
        let monday = date(2026, 10, 19);
        assert_eq!(count_working_days(monday, monday, &HashSet::new()), 1);
    }

    #[test]
    fn weekend_days_count_zero() {
        let saturday = date(2026, 10, 24);
        let sunday = date(2026, 10, 25);
        assert_eq!(count_working_days(saturday, saturday, &HashSet::new()), 0);
        assert_eq!(count_working_days(sunday, sunday, &HashSet::new()), 0);
        assert_eq!(count_working_days(saturday, sunday, &HashSet::new()), 0);
    }

    #[test]
    fn reversed_range_counts_zero() {
        assert_eq!(
            count_working_days(date(2026, 10, 23), date(2026, 10, 19), &HashSet::new()),
            0
        );
    }

    #[test]
    fn two_weeks_with_a_holiday() {
        let holidays = HashSet::from([date(2026, 10, 21), date(2026, 10, 25)]);
        // Mon 19th to Sun 1st Nov: 10 weekdays, one of them a holiday,
        // the Sunday holiday changes nothing
        assert_eq!(
            count_working_days(date(2026, 10, 19), date(2026, 11, 1), &holidays),
            9
        );
    }

    #[tokio::test]
    async fn reversed_range_skips_the_provider() {
        struct Failing;

        #[async_trait]
        impl HolidayProvider for Failing {
            async fn holidays(&self, _: NaiveDate, _: NaiveDate) -> Result<HashSet<NaiveDate>> {
                Err(PayrollError::Holidays("unreachable".into()))
            }
        }

        let days = calculate_working_days(date(2026, 10, 23), date(2026, 10, 19), &Failing)
            .await
            .unwrap();
        assert_eq!(days, 0);

        let err = calculate_working_days(date(2026, 10, 19), date(2026, 10, 23), &Failing)
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::Holidays(_)));
    }

    #[tokio::test]
    async fn static_holidays_are_excluded() {
        let provider = StaticHolidays::new([date(2026, 12, 25), date(2026, 12, 28)]);
        let days = calculate_working_days(date(2026, 12, 21), date(2026, 12, 31), &provider)
            .await
            .unwrap();
        // 9 weekdays minus two holidays
        assert_eq!(days, 7);
    }

    #[tokio::test]
    async fn file_holidays_ignore_time_of_day() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"date": "2026-01-01", "name": "New Year"}},
                {{"date": "2026-01-02T15:30:00Z"}},
                {{"date": "2026-01-05T08:00:00"}}
            ]"#
        )
        .unwrap();
        let provider = JsonFileHolidays::new(file.path());
        let holidays = provider
            .holidays(date(2026, 1, 1), date(2026, 1, 31))
            .await
            .unwrap();
        assert_eq!(
            holidays,
            HashSet::from([date(2026, 1, 1), date(2026, 1, 2), date(2026, 1, 5)])
        );
        // Thu 1st to Tue 6th: four weekdays, three holidays
        let days = calculate_working_days(date(2026, 1, 1), date(2026, 1, 6), &provider)
            .await
            .unwrap();
        assert_eq!(days, 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_holiday_error() {
        let provider = JsonFileHolidays::new("/nonexistent/holidays.json");
        let err = provider
            .holidays(date(2026, 1, 1), date(2026, 1, 31))
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::Holidays(_)));
    }

    #[test]
    fn rejects_unparseable_dates() {
        assert!(parse_calendar_date("31/12/2026").is_err());
        assert_eq!(parse_calendar_date(" 2026-12-31 ").unwrap(), date(2026, 12, 31));
    }
}
