use chrono::NaiveDate;

use crate::statement::date::{format_iso_date, parse_iso_date};
use crate::{ClientError, ClientResult};

/// Inclusive reporting window; `start` is always strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ClientResult<Self> {
        if start >= end {
            return Err(ClientError::invalid_date_range(
                &format_iso_date(&start),
                &format_iso_date(&end),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        *date >= self.start && *date <= self.end
    }
}

/// Parses caller-supplied `YYYY-MM-DD` bounds and validates their order.
pub fn build_range(from: &str, to: &str, command: &str) -> ClientResult<DateRange> {
    let start = parse_bound(from, "from", command)?;
    let end = parse_bound(to, "to", command)?;
    DateRange::new(start, end)
}

fn parse_bound(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    parse_iso_date(value).ok_or_else(|| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        )
    })
}
