use calamine::{open_workbook_auto, DataType, Range, Reader};

use crate::pipeline::{
    io_common::{cell_to_string, Table},
    *,
};

/// Reads a worksheet whose first row is the header.
///
/// Without a worksheet name, the workbook must contain a single worksheet.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> AllocResult<Table> {
    let wrange = get_range(path, worksheet_name)?;
    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(row) => row.iter().map(cell_to_string).collect(),
        None => return EmptyExcelSnafu { path }.fail(),
    };
    debug!("read_excel_table: header: {:?}", header);

    let rows: Vec<Vec<String>> = iter
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>())
        .filter(|row| !row.iter().all(|s| s.is_empty()))
        .collect();
    Ok(Table { header, rows })
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> AllocResult<Range<DataType>> {
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;
    match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path }),
        None => {
            let mut worksheets = workbook.worksheets();
            match worksheets.len() {
                0 => EmptyExcelSnafu { path }.fail(),
                1 => {
                    let (name, wrange) = worksheets.remove(0);
                    debug!("get_range: using worksheet {:?}", name);
                    Ok(wrange)
                }
                _ => ExcelTooManyWorksheetsSnafu {
                    path,
                    names: worksheets
                        .iter()
                        .map(|(name, _)| name.clone())
                        .collect::<Vec<String>>(),
                }
                .fail(),
            }
        }
    }
}

/// Writes one worksheet per table, in order. Cells made of digits only are
/// stored as numbers.
pub fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) -> AllocResult<()> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for (name, table) in sheets.iter() {
        let sheet = whatever!(
            book.new_sheet(name.to_string()),
            "Cannot create the worksheet {}",
            name
        );
        for (col, h) in table.header.iter().enumerate() {
            sheet
                .get_cell_mut((col as u32 + 1, 1))
                .set_value(h.clone());
        }
        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, v) in row.iter().enumerate() {
                let cell = sheet.get_cell_mut((col as u32 + 1, row_idx as u32 + 2));
                match as_count(v) {
                    Some(x) => {
                        cell.set_value_number(x as f64);
                    }
                    None => {
                        cell.set_value(v.clone());
                    }
                }
            }
        }
        debug!(
            "write_workbook: worksheet {} with {} rows",
            name,
            table.rows.len()
        );
    }
    whatever!(
        umya_spreadsheet::writer::xlsx::write(&book, path),
        "Cannot write the workbook {}",
        path.display()
    );
    Ok(())
}

fn as_count(v: &str) -> Option<u64> {
    if v.is_empty() || v.len() > 15 || !v.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    v.parse::<u64>().ok()
}
