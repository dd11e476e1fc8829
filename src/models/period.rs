use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const WEEK_FORMAT: &str = "%Y-%m-%d";
pub const EARLIEST_REPORT_YEAR: i32 = 2020;

/// Monday-to-Sunday window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn weeks_ago(today: NaiveDate, weeks: u32) -> Self {
        Self::containing(today - Duration::weeks(i64::from(weeks)))
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.start - Duration::days(7))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn week_id(&self) -> String {
        self.start.format(WEEK_FORMAT).to_string()
    }
}

/// True while `today` falls within `[week_start, week_start + 6 days]`.
pub fn is_current_week(week_start: NaiveDate, today: NaiveDate) -> bool {
    today >= week_start && today <= week_start + Duration::days(6)
}

/// Parse a `YYYY-MM-DD` week identifier; it must name a Monday.
pub fn parse_week_start(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    let well_formed = trimmed.len() == 10
        && trimmed.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(format!("Invalid week identifier '{raw}': expected YYYY-MM-DD"));
    }

    let date = NaiveDate::parse_from_str(trimmed, WEEK_FORMAT)
        .map_err(|e| format!("Invalid week identifier '{raw}': {e}"))?;
    if date.weekday().num_days_from_monday() != 0 {
        return Err(format!("Week identifier '{raw}' is not a Monday"));
    }
    Ok(date)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthId {
    pub year: i32,
    pub month: u32,
}

impl MonthId {
    /// Accepts `YYYY-MM` or `YYYY/MM`; the year must lie in `[2020, current_year + 1]`.
    pub fn parse(raw: &str, current_year: i32) -> Result<Self, String> {
        let raw = raw.trim();
        let separator = if raw.contains('-') {
            '-'
        } else if raw.contains('/') {
            '/'
        } else {
            return Err(format!("Unrecognised month identifier '{raw}'"));
        };

        let parts: Vec<&str> = raw.split(separator).collect();
        let [year, month] = parts.as_slice() else {
            return Err(format!("Unrecognised month identifier '{raw}'"));
        };

        let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(*year, 4) || !all_digits(*month, 2) {
            return Err(format!("Unrecognised month identifier '{raw}'"));
        }

        let year: i32 = year.parse().map_err(|_| format!("Invalid year in '{raw}'"))?;
        let month: u32 = month.parse().map_err(|_| format!("Invalid month in '{raw}'"))?;

        if !(1..=12).contains(&month) {
            return Err(format!("Month {month} out of range"));
        }
        if year < EARLIEST_REPORT_YEAR || year > current_year + 1 {
            return Err(format!("Year {year} out of range"));
        }

        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
