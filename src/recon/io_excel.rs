use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::recon::{io_common::*, *};

fn read_cell(cell: &DataType) -> TableCell {
    match cell {
        DataType::String(s) if s.trim().is_empty() => TableCell::Empty,
        DataType::String(s) => TableCell::Text(s.clone()),
        DataType::Float(f) => TableCell::Number(*f),
        DataType::Int(i) => TableCell::Number(*i as f64),
        DataType::Bool(b) => TableCell::Text(b.to_string()),
        DataType::Empty => TableCell::Empty,
        // Dates and error cells carry no question text and no mean.
        _ => {
            debug!("read_cell: ignoring cell {:?}", cell);
            TableCell::Empty
        }
    }
}

/// Reads a worksheet of an Excel file, by name or the first one.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> ReconResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    debug!(
        "read_excel_table: {} worksheet {:?}: {:?}",
        path,
        worksheet_name,
        wrange.get_size()
    );

    let rows: Vec<Vec<TableCell>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    Table::from_rows(path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_teacher_workbook(path: &std::path::Path) {
        let mut workbook = Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("notes").unwrap();
        notes.write_string(0, 0, "not the data").unwrap();
        let ws = workbook.add_worksheet();
        ws.set_name("mean").unwrap();
        ws.write_string(0, 0, "問題").unwrap();
        ws.write_string(0, 1, "學校平均值").unwrap();
        ws.write_string(1, 0, "我喜歡這份工作！").unwrap();
        ws.write_number(1, 1, 4.0).unwrap();
        ws.write_string(2, 0, "溝通不佳").unwrap();
        ws.write_string(2, 1, "-").unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_named_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("teacher.xlsx");
        write_teacher_workbook(&p);
        let t = read_excel_table(&p.display().to_string(), Some("mean")).unwrap();
        assert_eq!(t.header, vec!["問題", "學校平均值"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].1[1], TableCell::Number(4.0));
        assert_eq!(t.rows[1].1[1], TableCell::Text("-".to_string()));

        let values = read_values(
            &t,
            &TableLayout::teacher_default(),
            &p.display().to_string(),
        )
        .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].normalized_key(), "我喜歡這份工作");
    }

    #[test]
    fn first_worksheet_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("teacher.xlsx");
        write_teacher_workbook(&p);
        let t = read_excel_table(&p.display().to_string(), None).unwrap();
        assert_eq!(t.header, vec!["not the data"]);
    }

    #[test]
    fn unknown_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("teacher.xlsx");
        write_teacher_workbook(&p);
        let res = read_excel_table(&p.display().to_string(), Some("Sheet9"));
        assert!(matches!(res, Err(ReconError::MissingWorksheet { .. })));
    }
}
