//! `xtabkit_io_xlsx` v1:
//! XLSX kernel for survey crosstab workbooks.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : grids/specs/errors
//! - `util`   : pure helper functions
//! - `reader` : value + fill-color grid reader
//! - `writer` : per-question survey sheet writer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL, derive_default_survey_formats};
pub use reader::read_workbook_grid;
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecGridCell, SpecQuestionSheet, SpecSheetEntry,
    SpecSheetGrid, SpecSurveyFormats, SpecWorkbookGrid, SpecXlsxReport, XlsxIoError,
};
pub use util::{
    generate_vertical_runs, plan_horizontal_merges, sanitize_sheet_name, select_number_format,
};
pub use writer::SurveyXlsxWriter;
