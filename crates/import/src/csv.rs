use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use tally_core::{Money, Transaction};

const DATE_COLUMN: &str = "Date";
const NARRATIVE_COLUMN: &str = "Narrative";
const DEBIT_COLUMN: &str = "Debit Amount";
const CREDIT_COLUMN: &str = "Credit Amount";

/// Export dates are day-first; the rest are fallbacks for hand-edited files.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y"];

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("No data rows")]
    NoDataRows,
}

struct ExportColumns {
    date: usize,
    narrative: usize,
    debit: usize,
    credit: usize,
}

impl ExportColumns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, CsvError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
        };
        Ok(ExportColumns {
            date: find(DATE_COLUMN)?,
            narrative: find(NARRATIVE_COLUMN)?,
            debit: find(DEBIT_COLUMN)?,
            credit: find(CREDIT_COLUMN)?,
        })
    }
}

/// Loads a delimited bank export into transaction records.
///
/// Malformed fields degrade instead of aborting the batch: an unparsable
/// date loads as `None` and a non-numeric amount as zero. Only structural
/// problems (unreadable input, missing columns, no rows at all) error.
pub fn load_export<R: Read>(data: R) -> Result<Vec<Transaction>, CsvError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(data);
    let columns = ExportColumns::locate(reader.headers()?)?;

    let mut transactions = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.is_empty() {
            continue;
        }

        let date = record.get(columns.date).and_then(parse_date);
        let narrative = record
            .get(columns.narrative)
            .unwrap_or_default()
            .to_string();
        let debit = record.get(columns.debit).map_or(Money::zero(), parse_amount);
        let credit = record
            .get(columns.credit)
            .map_or(Money::zero(), parse_amount);

        transactions.push(Transaction::new(date, narrative, debit, credit));
    }

    if transactions.is_empty() {
        return Err(CsvError::NoDataRows);
    }

    tracing::info!("Loaded {} transactions from export", transactions.len());
    Ok(transactions)
}

pub fn load_export_file(path: &Path) -> Result<Vec<Transaction>, CsvError> {
    load_export(File::open(path)?)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Coerces an export amount field to money, zero on anything unparsable.
fn parse_amount(s: &str) -> Money {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s = s.replace([',', '$', ' '], "");
    match Decimal::from_str(&s) {
        Ok(dec) => Money::from_decimal(if negative { -dec } else { dec }),
        Err(_) => Money::zero(),
    }
}
