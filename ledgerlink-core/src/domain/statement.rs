//! Statement records and the row normalizer
//!
//! A raw statement row is an ordered list of strings. The normalizer turns it
//! into a [`StatementRecord`] using the configured [`ColumnLayout`], or says
//! why the row has to be skipped.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::config::ColumnLayout;

/// Marker that introduces the real transaction date inside a description,
/// e.g. `CARD PAYMENT TO COFFEE ON 04 MAR`
const DATE_HINT_MARKER: &str = " ON ";

/// One row as read from the statement source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row number in the source
    pub row: usize,
    pub fields: Vec<String>,
}

/// Canonical form of one statement row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    pub row: usize,
    /// Date column text as it appeared in the statement
    pub raw_date: String,
    /// Date used for matching
    pub date: NaiveDate,
    pub process_date: NaiveDate,
    pub payment_date: NaiveDate,
    /// Date from the date column, before any description hint
    pub posted_date: NaiveDate,
    pub description: String,
    /// Unsigned magnitude
    pub amount: Decimal,
    /// True when money left the tracked account
    pub is_payment: bool,
}

impl StatementRecord {
    /// Alternate date to search when nothing is found at `date`
    ///
    /// Statements sometimes post under the settlement date rather than the
    /// transaction date, so a differing payment date is tried first, then
    /// the date the row was posted under.
    pub fn fallback_date(&self) -> Option<NaiveDate> {
        if self.payment_date != self.date {
            Some(self.payment_date)
        } else if self.posted_date != self.date {
            Some(self.posted_date)
        } else {
            None
        }
    }

    /// Short one-line summary used in prompt titles and logs
    pub fn title(&self) -> String {
        format!(
            "{} {} {:?} {} {}",
            self.row,
            self.raw_date,
            self.description,
            if self.is_payment { "out" } else { "in" },
            self.amount
        )
    }
}

/// Why a row could not be normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingColumn { column: usize, fields: usize },
    InvalidDate { value: String, reason: String },
    InvalidAmount { value: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingColumn { column, fields } => {
                write!(f, "column {} missing, row has {} fields", column, fields)
            }
            SkipReason::InvalidDate { value, reason } => {
                write!(f, "invalid date {:?}: {}", value, reason)
            }
            SkipReason::InvalidAmount { value } => write!(f, "invalid amount {:?}", value),
        }
    }
}

/// Normalize one raw row
pub fn normalize(raw: &RawRow, layout: &ColumnLayout) -> Result<StatementRecord, SkipReason> {
    let raw_date = field(raw, layout.date)?.trim();
    let description = field(raw, layout.description)?;

    let posted_date = NaiveDate::parse_from_str(raw_date, &layout.date_format).map_err(|e| {
        SkipReason::InvalidDate {
            value: raw_date.to_string(),
            reason: e.to_string(),
        }
    })?;

    let (amount, is_payment) = amount_and_direction(raw, layout)?;

    let date = date_hint(description, posted_date.year()).unwrap_or(posted_date);

    Ok(StatementRecord {
        row: raw.row,
        raw_date: raw_date.to_string(),
        date,
        process_date: date,
        payment_date: date,
        posted_date,
        description: description.to_string(),
        amount,
        is_payment,
    })
}

/// Fetch a 1-based column from the row
fn field(raw: &RawRow, column: usize) -> Result<&str, SkipReason> {
    column
        .checked_sub(1)
        .and_then(|i| raw.fields.get(i))
        .map(String::as_str)
        .ok_or(SkipReason::MissingColumn {
            column,
            fields: raw.fields.len(),
        })
}

/// Pick the amount column and decide the direction
///
/// A non-empty withdrawal column wins and always means a payment. Otherwise
/// the amount column is signed: a leading minus is a payment.
fn amount_and_direction(raw: &RawRow, layout: &ColumnLayout) -> Result<(Decimal, bool), SkipReason> {
    if let Some(column) = layout.withdrawal {
        let value = field(raw, column)?.trim();
        if !value.is_empty() {
            let amount = parse_amount(value.trim_start_matches('-'))
                .ok_or_else(|| SkipReason::InvalidAmount { value: value.to_string() })?;
            return Ok((amount, true));
        }
    }

    let value = field(raw, layout.amount)?.trim();
    let (is_payment, magnitude) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let amount = parse_amount(magnitude)
        .ok_or_else(|| SkipReason::InvalidAmount { value: value.to_string() })?;
    Ok((amount, is_payment))
}

/// Parse an unsigned amount, dropping currency symbols and separators
fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok().map(|d| d.abs())
}

/// Parse a `<day> <month>` hint following the marker, in the given year
fn date_hint(description: &str, year: i32) -> Option<NaiveDate> {
    let (_, rest) = description.split_once(DATE_HINT_MARKER)?;
    let mut tokens = rest.split_whitespace();
    let day = tokens.next()?;
    // Statements shout (`MAR`); the month names chrono knows are `Mar`
    let month: String = tokens
        .next()?
        .chars()
        .enumerate()
        .map(|(i, c)| if i == 0 { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
        .collect();
    NaiveDate::parse_from_str(&format!("{} {} {}", day, month, year), "%d %b %Y").ok()
}
