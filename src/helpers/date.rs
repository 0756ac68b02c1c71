//! Publication date parsing and display formatting

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use chrono_tz::Tz;

/// Parse a CMS timestamp such as `2021-03-15T19:25:28+0000`
///
/// RFC 3339 (`+00:00`, `Z`) is accepted as well.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

/// Formats dates as `d MMM yyyy` (e.g. `15 mar 2021`) in a fixed timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    tz: Tz,
    months: [String; 12],
}

impl DateFormatter {
    /// Create a formatter from twelve abbreviated month names
    pub fn new(tz: Tz, months: [String; 12]) -> Self {
        Self { tz, months }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Format a timestamp as a short date in the configured timezone
    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        let local = date.with_timezone(&self.tz);
        format!(
            "{} {} {:04}",
            local.day(),
            self.months[local.month0() as usize],
            local.year()
        )
    }

    /// Parse and format a raw CMS timestamp in one step
    pub fn format_timestamp(&self, value: &str) -> Option<String> {
        parse_timestamp(value).map(|date| self.format(&date))
    }

    /// Read a date produced by [`DateFormatter::format`] back into a calendar day
    pub fn parse(&self, display: &str) -> Option<NaiveDate> {
        let mut parts = display.split_whitespace();
        let day: u32 = parts.next()?.parse().ok()?;
        let month = parts.next()?;
        let year: i32 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        let month = month.to_lowercase();
        let month0 = self.months.iter().position(|m| m.to_lowercase() == month)?;
        NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day)
    }
}
