// Primitives for reading CSV files.

use crate::recon::{io_common::*, *};

/// Reads a whole CSV file. The first record is the header.
///
/// Records may have fewer fields than the header; missing fields read as empty.
pub fn read_csv_table(path: &str) -> ReconResult<Table> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut rows: Vec<Vec<TableCell>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let cells: Vec<TableCell> = line
            .iter()
            .map(|s| {
                if s.trim().is_empty() {
                    TableCell::Empty
                } else {
                    TableCell::Text(s.to_string())
                }
            })
            .collect();
        rows.push(cells);
    }
    debug!("read_csv_table: {}: {} records", path, rows.len());
    Table::from_rows(path, rows)
}
