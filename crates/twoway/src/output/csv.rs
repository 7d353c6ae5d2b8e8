//! CSV export of flat result tables.

use std::io::Write;
use std::path::Path;

use ::csv::WriterBuilder;
use twoway_core::Table;

/// Write a table as CSV with a header row.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_csv<W: Write, T: Table + ?Sized>(writer: W, table: &T) -> Result<(), ::csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a table to a CSV file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv_file<T: Table + ?Sized>(path: impl AsRef<Path>, table: &T) -> Result<(), ::csv::Error> {
    let file = std::fs::File::create(path)?;
    write_csv(file, table)
}
