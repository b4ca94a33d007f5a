//! Availability calendar: per-day appointment counts measured against a campground's
//! daily capacity, for a rolling window or a calendar month.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campground_types::CampgroundError;

/// Length of the rolling window used when no month is requested
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// Years a calendar month may be requested for
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// Query parameters accepted by the availability endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    /// Calendar month, 1 to 12
    pub month: Option<u32>,
    /// Calendar year, defaults to the current one when a month is given
    pub year: Option<i32>,
}

/// Half-open range of calendar days `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
    /// First day of the range
    pub start: NaiveDate,
    /// Day after the last day of the range
    pub end: NaiveDate,
}

impl CalendarRange {
    /// Resolves the requested range relative to `today`
    pub fn resolve(query: &AvailabilityQuery, today: NaiveDate) -> Result<Self, CampgroundError> {
        match (query.month, query.year) {
            (None, None) => Ok(Self::rolling(today, DEFAULT_WINDOW_DAYS)),
            (None, Some(_)) => Err(CampgroundError::InvalidQuery(
                "year requires a month".to_string(),
            )),
            (Some(month), year) => Self::month(year.unwrap_or_else(|| today.year()), month),
        }
    }

    /// `days` consecutive days starting at `start`
    pub fn rolling(start: NaiveDate, days: u64) -> Self {
        let end = start
            .checked_add_days(chrono::Days::new(days))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    /// Every day of the given calendar month
    pub fn month(year: i32, month: u32) -> Result<Self, CampgroundError> {
        if !YEAR_RANGE.contains(&year) {
            return Err(CampgroundError::InvalidQuery(format!(
                "year must be between {} and {}",
                YEAR_RANGE.start(),
                YEAR_RANGE.end()
            )));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            CampgroundError::InvalidQuery(format!("invalid month {} of year {}", month, year))
        })?;
        let end = start.checked_add_months(Months::new(1)).ok_or_else(|| {
            CampgroundError::InvalidQuery(format!("year {} is out of range", year))
        })?;
        Ok(Self { start, end })
    }

    /// Start of the range as a UTC instant
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// End of the range (exclusive) as a UTC instant
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }

    /// Iterates over the days of the range in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day < self.end)
    }
}

/// Bookings on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    /// The day, formatted `YYYY-MM-DD`
    pub date: NaiveDate,
    /// Appointments on the day
    pub booked: i64,
    /// Places left, never negative
    pub available: i64,
    /// Whether the day reached capacity
    pub is_full: bool,
}

/// Response body of the availability endpoint
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Always true for this response
    pub success: bool,
    /// Campground name
    pub campground: String,
    /// One entry per day of the requested range
    pub availability: Vec<DayAvailability>,
}

/// Counts appointment days and lays them out over `range`.
///
/// Days outside the range are ignored.
pub fn build_calendar<I>(range: &CalendarRange, booked_days: I, capacity: i32) -> Vec<DayAvailability>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut counts: HashMap<NaiveDate, i64> = HashMap::new();
    for day in booked_days {
        *counts.entry(day).or_insert(0) += 1;
    }

    let capacity = i64::from(capacity);
    range
        .days()
        .map(|date| {
            let booked = counts.get(&date).copied().unwrap_or(0);
            DayAvailability {
                date,
                booked,
                available: (capacity - booked).max(0),
                is_full: booked >= capacity,
            }
        })
        .collect()
}
