use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::{Cell, Frame, ReportError};

/// Excel sheet names are capped at 31 characters.
fn sheet_name(title: &str) -> String {
    title.chars().take(31).collect()
}

pub fn write_excel(frame: &Frame, path: &Path) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(&frame.title))?;

    for (col, name) in frame.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (index, row) in frame.rows.iter().enumerate() {
        let excel_row = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(excel_row, col as u16, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(excel_row, col as u16, *value)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
