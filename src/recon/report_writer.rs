use label_matching::{Cell, ReportBundle, ReportSection};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::recon::*;

const TEXT_COLUMN_WIDTH: f64 = 50.0;
const VALUE_COLUMN_WIDTH: f64 = 16.0;

fn is_text_column(name: &str) -> bool {
    name.contains("Original_Column") || name.contains("Question") || name == "normalized_key"
}

fn write_section(
    worksheet: &mut Worksheet,
    section: &ReportSection,
    header_format: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name(&section.name)?;
    for (col, name) in section.columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *name, header_format)?;
        let width = if is_text_column(name) {
            TEXT_COLUMN_WIDTH
        } else {
            VALUE_COLUMN_WIDTH
        };
        worksheet.set_column_width(col, width)?;
    }
    for (idx, row) in section.rows.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Number(x) => {
                    worksheet.write_number(row_num, col, *x)?;
                }
                Cell::Integer(n) => {
                    worksheet.write_number(row_num, col, *n as f64)?;
                }
                // Missing values stay blank.
                Cell::Empty => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Writes every section of the report as a worksheet of one Excel file.
pub fn write_report(bundle: &ReportBundle, path: &str) -> ReconResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    for section in bundle.sections.iter() {
        debug!(
            "write_report: sheet {:?}: {} rows",
            section.name,
            section.rows.len()
        );
        let worksheet = workbook.add_worksheet();
        write_section(worksheet, section, &header_format).context(WritingReportSnafu { path })?;
    }
    workbook.save(path).context(WritingReportSnafu { path })?;
    Ok(())
}
