//! Functions to parse transactions from CSV bank statements.
//!
//! Statements from different banks name their columns differently, so columns
//! are found by header name rather than position.

use csv::{ReaderBuilder, StringRecord, Trim};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, month::check_year};

const DATE_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day]"),
    format_description!("[year]/[month]/[day]"),
    format_description!("[month]/[day]/[year]"),
];

/// A transaction read from a CSV statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// The date the transaction occurred.
    pub date: Date,
    /// The transaction description, e.g. the payee.
    pub description: String,
    /// Positive for money in, negative for money out.
    pub amount: f64,
    /// The category named in the file, if the file has a category column.
    pub category: Option<String>,
}

/// Where the amount of a row comes from.
enum AmountColumns {
    Amount(usize),
    DebitCredit { debit: usize, credit: usize },
}

/// The positions of the columns needed to build an [ImportRow].
struct Columns {
    date: usize,
    description: usize,
    amount: AmountColumns,
    category: Option<usize>,
}

impl Columns {
    /// Find the columns in `header`, matching names case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an [Error::MissingColumns] naming every required column that was not found.
    fn find(header: &StringRecord) -> Result<Self, Error> {
        let names: Vec<String> = header.iter().map(|name| name.to_lowercase()).collect();
        let position = |aliases: &[&str]| {
            names
                .iter()
                .position(|name| aliases.contains(&name.as_str()))
        };

        let date = position(&["date", "transaction date", "posting date"]);
        let description = position(&["description"]);
        let amount = match (position(&["amount"]), position(&["debit"]), position(&["credit"])) {
            (Some(amount), _, _) => Some(AmountColumns::Amount(amount)),
            (None, Some(debit), Some(credit)) => Some(AmountColumns::DebitCredit { debit, credit }),
            _ => None,
        };

        match (date, description, amount) {
            (Some(date), Some(description), Some(amount)) => Ok(Self {
                date,
                description,
                amount,
                category: position(&["category"]),
            }),
            (date, description, amount) => {
                let missing = [
                    ("date", date.is_none()),
                    ("description", description.is_none()),
                    ("amount", amount.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then(|| name.to_owned()))
                .collect();

                Err(Error::MissingColumns(missing))
            }
        }
    }
}

/// Parse the transactions in a CSV statement.
///
/// Expects `text` to start with a header row. Trailing commas are removed from
/// each line first since some banks end every line with one.
/// Rows missing a date, description or amount are skipped.
///
/// # Errors
///
/// Returns an:
/// - [Error::MissingColumns] if the header does not have the date, description and amount columns,
/// - [Error::InvalidCSV] if the text is not valid CSV, or a date or amount cannot be parsed.
pub fn parse_csv(text: &str) -> Result<Vec<ImportRow>, Error> {
    let text = text
        .lines()
        .map(|line| line.trim_end().trim_end_matches(','))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .clone();
    let columns = Columns::find(&header)?;

    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // The header is line 1.
        let line_number = index + 2;
        let record = record.map_err(|error| Error::InvalidCSV(error.to_string()))?;

        match parse_row(&record, &columns, line_number)? {
            Some(row) => rows.push(row),
            None => tracing::warn!("Skipping CSV line {line_number} with an empty required field"),
        }
    }

    Ok(rows)
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    line_number: usize,
) -> Result<Option<ImportRow>, Error> {
    let field = |index: usize| record.get(index).unwrap_or_default();

    let date = field(columns.date);
    let description = field(columns.description);
    if date.is_empty() || description.is_empty() {
        return Ok(None);
    }

    let amount = match columns.amount {
        AmountColumns::Amount(index) if field(index).is_empty() => return Ok(None),
        AmountColumns::Amount(index) => parse_amount(field(index), line_number)?,
        AmountColumns::DebitCredit { debit, credit }
            if field(debit).is_empty() && field(credit).is_empty() =>
        {
            return Ok(None);
        }
        AmountColumns::DebitCredit { debit, credit } => {
            let debit = parse_optional_amount(field(debit), line_number)?;
            let credit = parse_optional_amount(field(credit), line_number)?;
            credit.abs() - debit.abs()
        }
    };

    let category = columns
        .category
        .map(field)
        .filter(|category| !category.is_empty())
        .map(str::to_owned);

    Ok(Some(ImportRow {
        date: parse_date(date, line_number)?,
        description: description.to_owned(),
        amount,
        category,
    }))
}

fn parse_date(text: &str, line_number: usize) -> Result<Date, Error> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| Date::parse(text, format).ok())
        .ok_or_else(|| {
            Error::InvalidCSV(format!(
                "could not parse \"{text}\" as a date on line {line_number}, \
                expected YYYY-MM-DD, YYYY/MM/DD or MM/DD/YYYY"
            ))
        })?;

    check_year(date.year()).map_err(|error| {
        Error::InvalidCSV(format!("the date \"{text}\" on line {line_number}: {error}"))
    })?;

    Ok(date)
}

fn parse_amount(text: &str, line_number: usize) -> Result<f64, Error> {
    let amount: f64 = text.replace(['$', ','], "").parse().map_err(|error| {
        Error::InvalidCSV(format!(
            "could not parse \"{text}\" as an amount on line {line_number}: {error}"
        ))
    })?;

    if !amount.is_finite() {
        return Err(Error::InvalidCSV(format!(
            "\"{text}\" on line {line_number} is not a finite amount"
        )));
    }

    Ok(amount)
}

fn parse_optional_amount(text: &str, line_number: usize) -> Result<f64, Error> {
    if text.is_empty() {
        Ok(0.0)
    } else {
        parse_amount(text, line_number)
    }
}
