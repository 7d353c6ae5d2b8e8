//! CSV parsing for long-format tables.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use twoway_core::{Dataset, Factor, Observation, SchemaError};

use super::DataError;
use crate::config::ColumnSchema;

/// Load a long-format CSV file into a [`Dataset`].
///
/// # Arguments
/// * `path` - Path to the CSV file (header row required)
/// * `schema` - Column names and optional level catalogues
///
/// # Errors
/// Returns `Io` if the file cannot be opened, `Csv` if it is not valid CSV,
/// and `Schema` if a column is missing, an outcome is not numeric, a label is
/// not a declared level, or the rows do not form a valid dataset.
pub fn load_long_csv(path: impl AsRef<Path>, schema: &ColumnSchema) -> Result<Dataset, DataError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), "loading long-format CSV");
    read_long_csv(file, schema)
}

/// Parse long-format CSV from any reader.
///
/// Surrounding whitespace is trimmed from every field. Data rows are numbered
/// from 1 in error messages, header excluded.
pub fn read_long_csv<R: Read>(reader: R, schema: &ColumnSchema) -> Result<Dataset, DataError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    let [subject_col, condition_col, time_col, value_col] = schema
        .columns()
        .map(|name| column_index(&headers, name));
    let subject_col = subject_col?;
    let condition_col = condition_col?;
    let time_col = time_col?;
    let value_col = value_col?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let raw = field(&record, value_col);
        let value: f64 = raw.parse().map_err(|_| SchemaError::NonNumericValue {
            row,
            column: schema.value.clone(),
            value: raw.to_string(),
        })?;
        rows.push(RawRow {
            subject: field(&record, subject_col).to_string(),
            condition: field(&record, condition_col).to_string(),
            time: field(&record, time_col).to_string(),
            value,
        });
    }

    let conditions = catalogue(
        &schema.condition,
        schema.condition_levels.as_deref(),
        rows.iter().map(|r| r.condition.as_str()),
        false,
    )?;
    let times = catalogue(
        &schema.time,
        schema.time_levels.as_deref(),
        rows.iter().map(|r| r.time.as_str()),
        true,
    )?;

    let observations = rows
        .into_iter()
        .map(|r| -> Result<Observation, SchemaError> {
            Ok(Observation::new(
                r.subject,
                conditions.parse(&r.condition)?,
                times.parse(&r.time)?,
                r.value,
            ))
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;

    debug!(
        observations = observations.len(),
        conditions = conditions.len(),
        times = times.len(),
        "parsed long-format table"
    );
    Ok(Dataset::new(conditions, times, observations)?)
}

struct RawRow {
    subject: String,
    condition: String,
    time: String,
    value: f64,
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, SchemaError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SchemaError::MissingColumn {
            column: name.to_string(),
        })
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Build a factor from declared levels, or from the labels seen in the data.
///
/// Undeclared levels keep first-appearance order; with `numeric_order`, labels
/// that all parse as finite numbers are sorted by value instead.
fn catalogue<'a>(
    name: &str,
    declared: Option<&[String]>,
    labels: impl Iterator<Item = &'a str>,
    numeric_order: bool,
) -> Result<Factor, SchemaError> {
    if let Some(levels) = declared {
        return Factor::new(name, levels.iter().cloned());
    }

    let mut seen = HashSet::new();
    let mut levels: Vec<&str> = labels.filter(|l| seen.insert(*l)).collect();

    if numeric_order {
        let numeric: Option<Vec<f64>> = levels
            .iter()
            .map(|l| l.parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        if let Some(values) = numeric {
            let mut keyed: Vec<(f64, &str)> = values.into_iter().zip(levels).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            levels = keyed.into_iter().map(|(_, l)| l).collect();
        }
    }

    Factor::new(name, levels)
}
