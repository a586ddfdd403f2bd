use std::path::Path;

use label_matching::{LabeledValue, Side};

use crate::recon::*;

/// A cell as read by one of the table readers.
#[derive(PartialEq, Debug, Clone)]
pub enum TableCell {
    Text(String),
    Number(f64),
    Empty,
}

impl TableCell {
    fn as_header(&self) -> String {
        match self {
            TableCell::Text(s) => clean_header(s),
            TableCell::Number(x) => x.to_string(),
            TableCell::Empty => "".to_string(),
        }
    }
}

/// A table with its header row split out.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub header: Vec<String>,
    /// The data rows with their line number in the file (header is line 1).
    pub rows: Vec<(usize, Vec<TableCell>)>,
}

impl Table {
    /// Builds a table from all the rows of a file, the first one being the header.
    pub fn from_rows(path: &str, mut rows: Vec<Vec<TableCell>>) -> ReconResult<Table> {
        if rows.is_empty() {
            return MissingHeaderSnafu { path }.fail();
        }
        let header: Vec<String> = rows.remove(0).iter().map(|c| c.as_header()).collect();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, r)| (idx + 2, r))
            .collect();
        Ok(Table { header, rows })
    }
}

/// Which columns hold the question, the mean and the count.
/// Each entry lists the accepted names, the first one present wins.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableLayout {
    pub side: Side,
    pub text_columns: Vec<String>,
    pub mean_columns: Vec<String>,
    pub count_columns: Option<Vec<String>>,
}

fn names(l: &[&str]) -> Vec<String> {
    l.iter().map(|s| s.to_string()).collect()
}

impl TableLayout {
    pub fn backend_default() -> TableLayout {
        TableLayout {
            side: Side::Backend,
            text_columns: names(&["Original_Column"]),
            mean_columns: names(&["Mean"]),
            count_columns: Some(names(&["N"])),
        }
    }

    pub fn teacher_default() -> TableLayout {
        TableLayout {
            side: Side::Teacher,
            text_columns: names(&["問題", "Original_Column"]),
            mean_columns: names(&["學校平均值", "Mean_Teacher"]),
            count_columns: None,
        }
    }
}

pub fn clean_header(s: &str) -> String {
    s.trim_start_matches('\u{feff}').trim().to_string()
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

fn find_column(header: &[String], candidates: &[String], path: &str) -> ReconResult<usize> {
    for c in candidates.iter() {
        if let Some(idx) = header.iter().position(|h| h == c) {
            return Ok(idx);
        }
    }
    MissingColumnSnafu {
        path,
        column: candidates.join(" or "),
    }
    .fail()
}

/// Numeric coercion: numbers and numeric strings pass, anything else is missing.
pub fn coerce_mean(cell: Option<&TableCell>) -> Option<f64> {
    let x = match cell {
        Some(TableCell::Number(x)) => Some(*x),
        Some(TableCell::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    x.filter(|x| x.is_finite())
}

/// Sample counts: integers, or numbers with no fractional part.
pub fn coerce_count(cell: Option<&TableCell>) -> Option<u64> {
    let x = match cell {
        Some(TableCell::Number(x)) => *x,
        Some(TableCell::Text(s)) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<u64>() {
                return Some(n);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 {
        Some(x as u64)
    } else {
        None
    }
}

fn is_blank_row(row: &[TableCell]) -> bool {
    row.iter().all(|c| match c {
        TableCell::Empty => true,
        TableCell::Text(s) => s.trim().is_empty(),
        TableCell::Number(_) => false,
    })
}

/// Turns the rows of a table into records.
///
/// Rows whose mean cannot be coerced to a number are dropped with a warning.
/// It is an error if the table has data rows but none of them survives.
pub fn read_values(table: &Table, layout: &TableLayout, path: &str) -> ReconResult<Vec<LabeledValue>> {
    let text_idx = find_column(&table.header, &layout.text_columns, path)?;
    let mean_idx = find_column(&table.header, &layout.mean_columns, path)?;
    let count_idx = match &layout.count_columns {
        Some(cols) => Some(find_column(&table.header, cols, path)?),
        None => None,
    };
    debug!(
        "read_values: {} columns: text {} mean {} count {:?}",
        path, text_idx, mean_idx, count_idx
    );

    let mut res: Vec<LabeledValue> = Vec::new();
    let mut data_rows: usize = 0;
    let mut dropped: usize = 0;
    for (lineno, row) in table.rows.iter() {
        if is_blank_row(row) {
            debug!("read_values: {}: skipping blank line {}", path, lineno);
            continue;
        }
        data_rows += 1;
        let mean = match coerce_mean(row.get(mean_idx)) {
            Some(x) => x,
            None => {
                warn!(
                    "{}: line {}: dropping row, mean {:?} is not a number",
                    path,
                    lineno,
                    row.get(mean_idx).unwrap_or(&TableCell::Empty)
                );
                dropped += 1;
                continue;
            }
        };
        let text: Option<&str> = match row.get(text_idx) {
            Some(TableCell::Text(s)) => Some(s.as_str()),
            other => {
                warn!(
                    "{}: line {}: question {:?} is not text, it will not be matched",
                    path, lineno, other
                );
                None
            }
        };
        let n = match count_idx {
            Some(idx) => {
                let n = coerce_count(row.get(idx));
                if n.is_none() {
                    debug!("{}: line {}: no sample count", path, lineno);
                }
                n
            }
            None => None,
        };
        res.push(LabeledValue::from_cell(layout.side, text, mean, n));
    }

    if dropped > 0 {
        warn!(
            "{}: dropped {} of {} rows without a numeric mean",
            path, dropped, data_rows
        );
    }
    if data_rows > 0 && res.is_empty() {
        return NoNumericValuesSnafu {
            path,
            column: table.header[mean_idx].clone(),
        }
        .fail();
    }
    Ok(res)
}
