//! Grid reader: loads cell values and fill colors from an XLSX workbook.

use std::path::Path;

use tracing::debug;
use umya_spreadsheet::{Cell, Worksheet};

use crate::spec::{EnumCellValue, SpecGridCell, SpecSheetGrid, SpecWorkbookGrid, XlsxIoError};

/// Read every worksheet of `path_file_in` into dense grids.
pub fn read_workbook_grid<P: AsRef<Path>>(path_file_in: P) -> Result<SpecWorkbookGrid, XlsxIoError> {
    let path_file_in = path_file_in.as_ref();
    let book = umya_spreadsheet::reader::xlsx::read(path_file_in).map_err(|err| {
        XlsxIoError::Read {
            path: path_file_in.to_path_buf(),
            message: err.to_string(),
        }
    })?;

    let sheets = book
        .get_sheet_collection()
        .iter()
        .map(derive_sheet_grid)
        .collect::<Vec<_>>();

    debug!(
        path = %path_file_in.display(),
        n_sheets = sheets.len(),
        "loaded workbook grid"
    );
    Ok(SpecWorkbookGrid { sheets })
}

fn derive_sheet_grid(worksheet: &Worksheet) -> SpecSheetGrid {
    let (n_col_max, n_row_max) = worksheet.get_highest_column_and_row();

    let mut grid = SpecSheetGrid::new(worksheet.get_name());
    grid.rows = (1..=n_row_max)
        .map(|n_row| {
            (1..=n_col_max)
                .map(|n_col| {
                    worksheet
                        .get_cell((n_col, n_row))
                        .map(derive_grid_cell)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    grid
}

fn derive_grid_cell(cell: &Cell) -> SpecGridCell {
    let c_raw = cell.get_value();
    let value = if c_raw.is_empty() {
        EnumCellValue::None
    } else if let Some(n_value) = cell.get_value_number() {
        EnumCellValue::Number(n_value)
    } else {
        EnumCellValue::String(c_raw.to_string())
    };

    let fill_argb = cell
        .get_style()
        .get_background_color()
        .map(|color| color.get_argb().to_ascii_uppercase())
        .filter(|argb| !argb.is_empty());

    SpecGridCell { value, fill_argb }
}
