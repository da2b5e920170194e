//! Calendar helpers: the "YYYY-MM" month type used to scope budgets and
//! reports, half-open month windows, and lenient parsing of request dates.

use std::{cmp::Ordering, fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{
    Date, Duration, Month, OffsetDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, timezone::local_today};

const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
/// e.g. "Jan 24".
const WINDOW_NAME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[month repr:short] [year repr:last_two]");
/// e.g. "Jan".
const MONTH_NAME_FORMAT: &[BorrowedFormatItem] = format_description!("[month repr:short]");

/// A calendar month, written as "YYYY-MM".
///
/// Budgets are scoped to a single `MonthYear`, and reports bucket
/// transactions by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthYear {
    first_day: Date,
}

impl MonthYear {
    /// The month that contains `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            first_day: date - Duration::days(i64::from(date.day()) - 1),
        }
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The following month.
    ///
    /// Saturates at the last representable month.
    pub fn next(self) -> Self {
        // Every month has at most 31 days, so this always lands in the next month.
        self.first_day
            .checked_add(Duration::days(31))
            .map(Self::from_date)
            .unwrap_or(self)
    }

    /// The preceding month.
    ///
    /// Saturates at the first representable month.
    pub fn previous(self) -> Self {
        self.first_day
            .previous_day()
            .map(Self::from_date)
            .unwrap_or(self)
    }

    /// The month `count` months before this one.
    ///
    /// Saturates at the first representable month.
    pub fn minus_months(self, count: u32) -> Self {
        let months_since_year_zero =
            i64::from(self.year()) * 12 + i64::from(u8::from(self.month())) - 1;
        let target = months_since_year_zero - i64::from(count);

        i32::try_from(target.div_euclid(12))
            .ok()
            .zip(u8::try_from(target.rem_euclid(12) + 1).ok())
            .and_then(|(year, month)| {
                let month = Month::try_from(month).ok()?;
                Date::from_calendar_date(year, month, 1).ok()
            })
            .map(|first_day| Self { first_day })
            .unwrap_or_else(|| Self::from_date(Date::MIN))
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.next()
            .first_day
            .previous_day()
            .unwrap_or(self.first_day)
    }

    /// The half-open date window covering this month.
    pub fn window(self) -> MonthWindow {
        MonthWindow {
            name: self.short_label(),
            start: self.first_day,
            end: self.next().first_day,
        }
    }

    /// A short label such as "Jan 24".
    pub fn short_label(&self) -> String {
        self.first_day
            .format(WINDOW_NAME_FORMAT)
            .unwrap_or_else(|_| self.to_string())
    }

    /// The abbreviated month name, e.g. "Jan".
    pub fn month_name(&self) -> String {
        self.first_day
            .format(MONTH_NAME_FORMAT)
            .unwrap_or_else(|_| self.to_string())
    }
}

impl PartialOrd for MonthYear {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthYear {
    fn cmp(&self, other: &Self) -> Ordering {
        self.first_day.cmp(&other.first_day)
    }
}

impl Display for MonthYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), u8::from(self.month()))
    }
}

impl FromStr for MonthYear {
    type Err = Error;

    /// Parse a string of the form "YYYY-MM".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonthYear(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        let first_day = Date::from_calendar_date(year, month, 1).map_err(|_| invalid())?;

        Ok(Self { first_day })
    }
}

impl Serialize for MonthYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for MonthYear {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for MonthYear {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The month containing today's date in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a known timezone.
pub fn current_month(canonical_timezone: &str) -> Result<MonthYear, Error> {
    local_today(canonical_timezone).map(MonthYear::from_date)
}

/// A named, half-open date range `[start, end)` covering one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    /// Display name, e.g. "Jan 24".
    pub name: String,
    /// The first day of the window.
    pub start: Date,
    /// The first day after the window.
    pub end: Date,
}

impl MonthWindow {
    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }
}

/// `count` consecutive month windows ending with the month `anchor`, oldest first.
pub fn trailing_month_windows(anchor: MonthYear, count: u32) -> Vec<MonthWindow> {
    (0..count)
        .rev()
        .map(|offset| anchor.minus_months(offset).window())
        .collect()
}

/// The same day `count` calendar months before `date`.
///
/// The day is clamped to the length of the target month, e.g. 31 March minus
/// one month is 28 (or 29) February.
pub fn subtract_months(date: Date, count: u32) -> Date {
    let month = MonthYear::from_date(date).minus_months(count);
    let last_day = month.last_day();

    month
        .first_day()
        .replace_day(date.day().min(last_day.day()))
        .unwrap_or(last_day)
}

/// Parse a date sent by a client.
///
/// Accepts "YYYY-MM-DD" or an RFC 3339 date-time such as
/// "2024-01-15T00:00:00.000Z", in which case the calendar date is used.
pub fn parse_request_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();

    Date::parse(raw, ISO_DATE_FORMAT)
        .ok()
        .or_else(|| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .ok()
                .map(|date_time| date_time.date())
        })
}

#[cfg(test)]
mod month_year_tests {
    use time::{Date, Month, macros::date};

    use crate::Error;

    use super::{MonthYear, parse_request_date, subtract_months, trailing_month_windows};

    #[test]
    fn parses_and_displays() {
        let month: MonthYear = "2024-03".parse().unwrap();

        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), Month::March);
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(month.first_day(), date!(2024 - 03 - 01));
    }

    #[test]
    fn rejects_malformed_strings() {
        for raw in ["", "2024", "2024-3", "2024-13", "24-03", "2024-03-01", "abcd-ef"] {
            assert_eq!(
                raw.parse::<MonthYear>(),
                Err(Error::InvalidMonthYear(raw.to_owned())),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn next_and_previous_cross_year_boundaries() {
        let december: MonthYear = "2023-12".parse().unwrap();
        let january: MonthYear = "2024-01".parse().unwrap();

        assert_eq!(december.next(), january);
        assert_eq!(january.previous(), december);
    }

    #[test]
    fn minus_months_counts_back() {
        let month: MonthYear = "2024-02".parse().unwrap();

        assert_eq!(month.minus_months(0), month);
        assert_eq!(month.minus_months(5).to_string(), "2023-09");
        assert_eq!(month.minus_months(26).to_string(), "2021-12");
    }

    #[test]
    fn minus_months_saturates_at_earliest_month() {
        let month: MonthYear = "2024-02".parse().unwrap();
        let earliest = MonthYear::from_date(Date::MIN);

        assert_eq!(month.minus_months(u32::MAX), earliest);
        assert_eq!(
            subtract_months(date!(2024 - 03 - 31), u32::MAX),
            Date::MIN.replace_day(31).unwrap()
        );
        assert_eq!(earliest.minus_months(1), earliest);
    }

    #[test]
    fn window_is_half_open() {
        let window = MonthYear::from_date(date!(2024 - 02 - 17)).window();

        assert_eq!(window.name, "Feb 24");
        assert_eq!(window.start, date!(2024 - 02 - 01));
        assert_eq!(window.end, date!(2024 - 03 - 01));
        assert!(window.contains(date!(2024 - 02 - 29)));
        assert!(!window.contains(date!(2024 - 03 - 01)));
    }

    #[test]
    fn trailing_windows_are_oldest_first() {
        let anchor: MonthYear = "2024-03".parse().unwrap();

        let names: Vec<_> = trailing_month_windows(anchor, 6)
            .into_iter()
            .map(|window| window.name)
            .collect();

        assert_eq!(
            names,
            ["Oct 23", "Nov 23", "Dec 23", "Jan 24", "Feb 24", "Mar 24"]
        );
    }

    #[test]
    fn subtract_months_clamps_day() {
        assert_eq!(subtract_months(date!(2024 - 03 - 31), 1), date!(2024 - 02 - 29));
        assert_eq!(subtract_months(date!(2024 - 05 - 15), 3), date!(2024 - 02 - 15));
    }

    #[test]
    fn parses_iso_dates_and_date_times() {
        assert_eq!(parse_request_date("2024-01-15"), Some(date!(2024 - 01 - 15)));
        assert_eq!(
            parse_request_date("2024-01-15T10:30:00.000Z"),
            Some(date!(2024 - 01 - 15))
        );
        assert_eq!(parse_request_date("15/01/2024"), None);
    }

    #[test]
    fn serializes_as_string() {
        let month: MonthYear = "2024-07".parse().unwrap();

        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2024-07\"");
        assert_eq!(
            serde_json::from_str::<MonthYear>("\"2024-07\"").unwrap(),
            month
        );
    }
}
