//! Query string types shared by the report handlers.

use serde::Deserialize;
use time::{Date, macros::date};

use crate::{Error, month::parse_request_date, timezone::local_today};

/// The earliest date a report covers when no start date is given.
const EPOCH: Date = date!(1970 - 01 - 01);

/// The number of months covered by the trends report when no period is given.
pub(crate) const DEFAULT_TREND_MONTHS: u32 = 3;

/// The longest period the trends report accepts, one hundred years.
pub(crate) const MAX_TREND_MONTHS: u32 = 1200;

/// An inclusive date range given as `startDate` and `endDate` query parameters.
///
/// Each date may be "YYYY-MM-DD" or an RFC 3339 date-time.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// The first day to include, defaults to 1970-01-01.
    pub start_date: Option<String>,
    /// The last day to include, defaults to today.
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Resolve the range to concrete dates, using today in `local_timezone` as
    /// the default end date.
    ///
    /// A start date after the end date is not an error, it just matches nothing.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if either date cannot be parsed, or
    /// [Error::InvalidTimezoneError] if `local_timezone` is unknown.
    pub fn resolve(&self, local_timezone: &str) -> Result<(Date, Date), Error> {
        let start = match non_empty(&self.start_date) {
            Some(raw) => parse_request_date(raw).ok_or(Error::InvalidDateRange)?,
            None => EPOCH,
        };

        let end = match non_empty(&self.end_date) {
            Some(raw) => parse_request_date(raw).ok_or(Error::InvalidDateRange)?,
            None => local_today(local_timezone)?,
        };

        Ok((start, end))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// The query string for the trends report.
#[derive(Debug, Default, Deserialize)]
pub struct TrendsQuery {
    /// How far back to look, e.g. "6months".
    pub period: Option<String>,
}

impl TrendsQuery {
    /// The number of months to look back.
    ///
    /// Accepts "Nmonths" or a bare number.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriod] if the period is not a whole number of
    /// months or is longer than [MAX_TREND_MONTHS].
    pub fn months(&self) -> Result<u32, Error> {
        let Some(raw) = non_empty(&self.period) else {
            return Ok(DEFAULT_TREND_MONTHS);
        };

        let trimmed = raw.trim();
        trimmed
            .strip_suffix("months")
            .unwrap_or(trimmed)
            .parse()
            .ok()
            .filter(|months| *months <= MAX_TREND_MONTHS)
            .ok_or_else(|| Error::InvalidPeriod(raw.to_owned()))
    }
}

/// The query string for the transactions report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsReportQuery {
    /// The inclusive date range.
    #[serde(flatten)]
    pub range: DateRangeQuery,
    /// "all", "income" or "expense", defaults to "all".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}
