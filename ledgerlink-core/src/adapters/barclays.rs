//! Barclays statement export converter
//!
//! Barclays exports statements as pipe-delimited text. Transaction lines have
//! seven fields (`details | payments | receipts | date | balance | | `);
//! everything else is page furniture, except that the sort code and account
//! number are printed on those lines. A transaction whose details wrap onto a
//! separate line shows up as a line with no amounts, which is prefixed onto
//! the next transaction's description.

use std::io::{Read, Write};

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::result::{Error, Result};

/// Fields on a transaction line
const FIELDS_PER_LINE: usize = 7;

/// Columns written by the statement converters
pub const STATEMENT_HEADER: [&str; 6] = [
    "Account",
    "Date",
    "Description",
    "Payments",
    "Receipts",
    "Running",
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub written: usize,
    pub dropped: usize,
}

struct Matchers {
    sort_code: Regex,
    account_number: Regex,
}

impl Matchers {
    fn new() -> Result<Self> {
        let compile =
            |p: &str| Regex::new(p).map_err(|e| Error::config(format!("bad pattern {}: {}", p, e)));
        Ok(Self {
            sort_code: compile(r"\d{6}")?,
            account_number: compile(r"\d{4}-\d{4}")?,
        })
    }
}

/// Write the statement header row
pub fn write_header<W: Write>(out: &mut csv::Writer<W>) -> Result<()> {
    out.write_record(STATEMENT_HEADER)?;
    Ok(())
}

/// Convert one Barclays export, appending rows to `out`
pub fn convert<R: Read, W: Write>(input: R, out: &mut csv::Writer<W>) -> Result<ConvertSummary> {
    let matchers = Matchers::new()?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut sort_code: Option<u32> = None;
    let mut account_number: Option<u32> = None;
    let mut pending_details = String::new();
    let mut summary = ConvertSummary::default();

    for result in reader.records() {
        let record = result?;

        if record.len() != FIELDS_PER_LINE {
            let line = record.get(0).unwrap_or("");
            if sort_code.is_none() {
                if let Some(m) = matchers.sort_code.find(line) {
                    sort_code = m.as_str().parse().ok();
                }
            }
            if account_number.is_none() {
                if let Some(m) = matchers.account_number.find(line) {
                    account_number = m.as_str().replace('-', "").parse().ok();
                }
            }
            continue;
        }

        let (sort_code, account_number) = match (sort_code, account_number) {
            (Some(s), Some(a)) => (s, a),
            _ => {
                return Err(Error::config(format!(
                    "sort code {:?} or account number {:?} not found",
                    sort_code, account_number
                )))
            }
        };
        let account = format!("{:06} {:08}", sort_code, account_number);

        let details = record.get(0).unwrap_or("");
        let payments = record.get(1).unwrap_or("");
        let receipts = record
            .get(2)
            .unwrap_or("")
            .trim_end_matches(&['C', ' '][..]);
        let date = record.get(3).unwrap_or("");
        let running = record.get(4).unwrap_or("");

        if payments.is_empty() && receipts.is_empty() {
            pending_details = details.to_string();
            continue;
        }
        if !is_amount(payments) || !is_amount(receipts) {
            debug!(details, payments, receipts, "dropping line with non-numeric amount");
            summary.dropped += 1;
            continue;
        }

        let description = if pending_details.is_empty() {
            details.to_string()
        } else {
            format!("{} {}", pending_details, details)
        };
        out.write_record([
            account.as_str(),
            date,
            description.as_str(),
            payments,
            receipts,
            running,
        ])?;
        summary.written += 1;
        pending_details.clear();
    }

    Ok(summary)
}

/// Empty, or a plain decimal number
fn is_amount(s: &str) -> bool {
    s.is_empty() || s.parse::<Decimal>().is_ok()
}
