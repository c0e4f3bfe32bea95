//! Firefly export re-formatter
//!
//! Turns a Firefly III CSV export back into the six-column statement layout
//! (`Account,Date,Description,Payments,Receipts,Running`), so a ledger export
//! can be fed through the matcher like any bank statement.

use std::io::{Read, Write};

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;

/// Export columns used (0-based)
const COL_AMOUNT: usize = 8;
const COL_DESCRIPTION: usize = 14;
const COL_DATE: usize = 15;
const MIN_FIELDS: usize = 20;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReexportSummary {
    pub written: usize,
    /// Per-line problems; those lines were left out
    pub errors: Vec<String>,
}

/// Re-format one export, appending rows to `out`
///
/// Bad lines do not stop the conversion; they are reported in the summary.
pub fn convert<R: Read, W: Write>(
    input: R,
    account: &str,
    out: &mut csv::Writer<W>,
) -> Result<ReexportSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut summary = ReexportSummary::default();
    let mut running = Decimal::ZERO;

    for (index, result) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = result?;
        if record.len() < MIN_FIELDS {
            summary.errors.push(format!(
                "line {}: expected at least {} fields, found {}",
                line,
                MIN_FIELDS,
                record.len()
            ));
            continue;
        }

        let date = match DateTime::parse_from_rfc3339(&record[COL_DATE]) {
            Ok(date) => date,
            Err(e) => {
                summary
                    .errors
                    .push(format!("line {}: failed to parse time: {}", line, e));
                continue;
            }
        };
        let amount: Decimal = match record[COL_AMOUNT].trim().parse() {
            Ok(amount) => amount,
            Err(e) => {
                summary
                    .errors
                    .push(format!("line {}: failed to parse amount: {}", line, e));
                continue;
            }
        };

        let magnitude = format!("{:.2}", amount.abs());
        let (payments, receipts) = if amount < Decimal::ZERO {
            (magnitude, String::new())
        } else {
            (String::new(), magnitude)
        };
        running += amount;

        let date = date.format("%d %b %Y").to_string().to_uppercase();
        let running_text = format!("{:.2}", running);
        out.write_record([
            account,
            date.as_str(),
            &record[COL_DESCRIPTION],
            payments.as_str(),
            receipts.as_str(),
            running_text.as_str(),
        ])?;
        summary.written += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an export line with the interesting columns filled in
    fn export_line(amount: &str, description: &str, date: &str) -> String {
        let mut fields = vec![String::new(); 53];
        fields[COL_AMOUNT] = amount.to_string();
        fields[COL_DESCRIPTION] = description.to_string();
        fields[COL_DATE] = date.to_string();
        fields.join(",")
    }

    fn export(lines: &[String]) -> String {
        let header = vec!["h"; 53].join(",");
        let mut out = header;
        for line in lines {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_reexport_with_running_balance() {
        let input = export(&[
            export_line("1000.00", "SALARY", "2024-01-01T00:00:00+00:00"),
            export_line("-12.5", "TESCO", "2024-01-02T00:00:00+00:00"),
        ]);
        let mut out = csv::Writer::from_writer(Vec::new());
        let summary = convert(input.as_bytes(), "7", &mut out).unwrap();
        assert_eq!(summary.written, 2);
        assert!(summary.errors.is_empty());

        let text = String::from_utf8(out.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "7,01 JAN 2024,SALARY,,1000.00,1000.00");
        assert_eq!(lines[1], "7,02 JAN 2024,TESCO,12.50,,987.50");
    }

    #[test]
    fn test_bad_lines_are_reported_and_skipped() {
        let input = export(&[
            "too,short".to_string(),
            export_line("abc", "BROKEN", "2024-01-01T00:00:00+00:00"),
            export_line("1.00", "BAD DATE", "yesterday"),
            export_line("2.00", "OK", "2024-01-03T00:00:00+00:00"),
        ]);
        let mut out = csv::Writer::from_writer(Vec::new());
        let summary = convert(input.as_bytes(), "7", &mut out).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.errors.len(), 3);
        assert!(summary.errors[0].starts_with("line 2:"));
        assert!(summary.errors[1].contains("amount"));
        assert!(summary.errors[2].contains("time"));
    }
}
