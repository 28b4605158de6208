//! Shared XLSX specification models.

use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification; `None` fields inherit from the base preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill as a workbook theme color index.
    pub bg_theme: Option<u8>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_theme: other.bg_theme.or(self.bg_theme),
        }
    }
}

/// Named format presets of one survey question sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSurveyFormats {
    /// Question title cell.
    pub title: SpecCellFormat,
    /// `bar` / `*Sort` marker cells.
    pub marker: SpecCellFormat,
    /// Category and column header rows.
    pub header: SpecCellFormat,
    /// `Base` label cell.
    pub base_label: SpecCellFormat,
    /// Statement/response index cells.
    pub index: SpecCellFormat,
    /// Body and base values.
    pub body: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value shared by reader, parser and writer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Whether the cell is blank (missing or whitespace-only text).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Display text; integral numbers render without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// One source cell: value plus first-layer fill color.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecGridCell {
    /// Cell value.
    pub value: EnumCellValue,
    /// Fill foreground color as `AARRGGBB`, when the cell is filled.
    pub fill_argb: Option<String>,
}

impl SpecGridCell {
    /// Unfilled cell holding `value`.
    pub fn from_value(value: EnumCellValue) -> Self {
        Self {
            value,
            fill_argb: None,
        }
    }
}

static CELL_VALUE_NONE: EnumCellValue = EnumCellValue::None;

/// Dense in-memory copy of one worksheet (zero-based rows/columns).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Source worksheet name.
    pub sheet_name: String,
    /// Row-major cells; rows may be ragged.
    pub rows: Vec<Vec<SpecGridCell>>,
}

impl SpecSheetGrid {
    /// Empty grid named `sheet_name`.
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row_idx: usize, col_idx: usize) -> Option<&SpecGridCell> {
        self.rows.get(row_idx).and_then(|row| row.get(col_idx))
    }

    /// Cell value, or [`EnumCellValue::None`] outside the grid.
    pub fn value(&self, row_idx: usize, col_idx: usize) -> &EnumCellValue {
        self.cell(row_idx, col_idx)
            .map_or(&CELL_VALUE_NONE, |cell| &cell.value)
    }

    pub fn fill_argb(&self, row_idx: usize, col_idx: usize) -> Option<&str> {
        self.cell(row_idx, col_idx)
            .and_then(|cell| cell.fill_argb.as_deref())
    }

    /// Values of `row_idx` from `col_start` to the grid width, padded with blanks.
    pub fn row_values_from(&self, row_idx: usize, col_start: usize) -> Vec<EnumCellValue> {
        (col_start..self.width())
            .map(|col_idx| self.value(row_idx, col_idx).clone())
            .collect()
    }
}

/// Ordered worksheets of one source workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbookGrid {
    /// Worksheets in workbook order.
    pub sheets: Vec<SpecSheetGrid>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region QuestionSheetSpecification

/// Layout of one output question sheet, apart from its body dataframe.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecQuestionSheet {
    /// Requested sheet name (sanitized and de-duplicated at write time).
    pub sheet_name: String,
    /// Title written on the first row.
    pub title: String,
    /// Column header rows (category, header, base); width equals body width.
    pub header_grid: Vec<Vec<EnumCellValue>>,
    /// Leading index columns of the body (1 = response, 2 = statement + response).
    pub n_cols_index: usize,
}

impl SpecQuestionSheet {
    /// Whether the body carries a statement level.
    pub fn is_multi_level(&self) -> bool {
        self.n_cols_index > 1
    }

    /// Zero-based row where body values start.
    pub fn idx_row_body_first(&self) -> usize {
        let n_spacer = if self.is_multi_level() { 1 } else { 0 };
        crate::conf::N_IDX_ROW_HEADER_FIRST + self.header_grid.len() + n_spacer
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One emitted worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetEntry {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Body rows written.
    pub n_rows: usize,
    /// Body columns written (index columns included).
    pub n_cols: usize,
}

/// Writer report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets in write order.
    pub sheets: Vec<SpecSheetEntry>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// XLSX read/write failures.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Source workbook could not be opened or parsed.
    #[error("failed to read workbook {}: {message}", path.display())]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying reader error text.
        message: String,
    },
    /// Workbook serialization failed.
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// Body dataframe could not be built or accessed.
    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
    /// Sheet content does not match its declared layout.
    #[error("invalid sheet layout: {0}")]
    InvalidLayout(String),
    /// Row/column index exceeds Excel addressing.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow {
        /// `row` or `column`.
        axis: &'static str,
        /// Offending zero-based index.
        value: usize,
    },
    /// Write attempted after the workbook was saved.
    #[error("cannot write after close()")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
