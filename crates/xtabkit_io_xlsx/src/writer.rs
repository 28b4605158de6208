//! Survey workbook writer: one styled sheet per question plus a contents sheet.

use std::collections::BTreeSet;
use std::path::PathBuf;

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::conf::{
    C_BASE_LABEL, C_CONTENTS_TITLE, N_HEIGHT_ROW, N_IDX_ROW_HEADER_FIRST, N_IDX_ROW_SORT_MARKER,
    N_IDX_ROW_TITLE, N_LEN_EXCEL_SHEET_NAME_MAX, N_THEME_BASE, N_THEME_SELECTION, N_THEME_TITLE,
    N_WIDTH_INDEX_COLUMN, TUP_SORT_MARKERS, derive_default_survey_formats,
};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecQuestionSheet, SpecSheetEntry, SpecSurveyFormats,
    SpecXlsxReport, XlsxIoError,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_horizontal_merge_tracker, derive_vertical_merge_tracker,
    generate_vertical_runs, plan_horizontal_merges, sanitize_sheet_name, select_number_format,
};

/// Stateful workbook writer.
pub struct SurveyXlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    formats: SpecSurveyFormats,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
    if_closed: bool,
}

impl SurveyXlsxWriter {
    /// Create writer bound to output path with the default format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Self {
        Self::with_formats(path_file_out, derive_default_survey_formats())
    }

    /// Create writer bound to output path and explicit format presets.
    pub fn with_formats(path_file_out: impl Into<PathBuf>, formats: SpecSurveyFormats) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            formats,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
            if_closed: false,
        }
    }

    /// Return snapshot of the sheets written so far.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook.save(&self.path_file_out)?;
        self.if_closed = true;
        debug!(path = %self.path_file_out.display(), "saved survey workbook");
        Ok(())
    }

    /// Write the contents sheet: a `Contents` header followed by
    /// `(sheet code, question)` rows.
    ///
    /// Sheets keep their creation order, so call this before any question sheet
    /// to place the contents first.
    pub fn write_contents_sheet(&mut self, entries: &[(String, String)]) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }

        let sheet_name_unique = self.derive_unique_sheet_name(C_CONTENTS_TITLE);
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;
        worksheet.write_string(0, 0, C_CONTENTS_TITLE)?;
        for (n_idx, (c_code, c_question)) in entries.iter().enumerate() {
            let n_row = cast_row_num(n_idx + 1)?;
            worksheet.write_string(n_row, 0, c_code)?;
            worksheet.write_string(n_row, 1, c_question)?;
        }

        self.report.sheets.push(SpecSheetEntry {
            sheet_name: sheet_name_unique,
            n_rows: entries.len(),
            n_cols: 2,
        });
        Ok(())
    }

    /// Write one question sheet.
    ///
    /// `df_body` holds the index columns (`sheet.n_cols_index` leading string
    /// columns) followed by one column per metric; its width must match every
    /// row of `sheet.header_grid`.
    pub fn write_question_sheet(
        &mut self,
        df_body: &DataFrame,
        sheet: &SpecQuestionSheet,
    ) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        validate_question_sheet(df_body, sheet)?;

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(&sheet.sheet_name, "_"));
        let painter = SpecSheetPainter::new(&self.formats, sheet, df_body.height());
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        write_title_block(worksheet, &painter, sheet)?;
        write_header(worksheet, &painter, sheet)?;
        write_body(worksheet, &painter, df_body, sheet)?;

        for n_idx_col in 0..sheet.n_cols_index {
            worksheet.set_column_width(cast_col_num(n_idx_col)?, N_WIDTH_INDEX_COLUMN)?;
        }
        worksheet.set_row_height(cast_row_num(N_IDX_ROW_HEADER_FIRST)?, N_HEIGHT_ROW)?;
        let n_idx_row_last = sheet.idx_row_body_first() + df_body.height();
        for n_idx_row in painter.idx_row_base..n_idx_row_last {
            worksheet.set_row_height(cast_row_num(n_idx_row)?, N_HEIGHT_ROW)?;
        }

        debug!(
            sheet = %sheet_name_unique,
            n_rows = df_body.height(),
            n_cols = df_body.width(),
            "wrote question sheet"
        );
        self.report.sheets.push(SpecSheetEntry {
            sheet_name: sheet_name_unique,
            n_rows: df_body.height(),
            n_cols: df_body.width(),
        });
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                self.report.warn(format!(
                    "Sheet name {name:?} already used; renamed to {candidate:?}."
                ));
                return candidate;
            }
            n_idx += 1;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region CellStyling

/// Resolves the final format of every cell of one question sheet.
struct SpecSheetPainter<'a> {
    formats: &'a SpecSurveyFormats,
    n_cols_index: usize,
    idx_row_base: usize,
    idx_row_body_first: usize,
    n_rows_body: usize,
}

impl<'a> SpecSheetPainter<'a> {
    fn new(formats: &'a SpecSurveyFormats, sheet: &SpecQuestionSheet, n_rows_body: usize) -> Self {
        Self {
            formats,
            n_cols_index: sheet.n_cols_index,
            idx_row_base: N_IDX_ROW_HEADER_FIRST + sheet.header_grid.len().saturating_sub(1),
            idx_row_body_first: sheet.idx_row_body_first(),
            n_rows_body,
        }
    }

    /// Theme fill pre-selecting the cells a downstream chart tool reads.
    fn derive_selection_theme(&self, row_idx: usize, col_idx: usize) -> Option<u8> {
        if row_idx == N_IDX_ROW_TITLE && col_idx == 0 {
            return Some(N_THEME_TITLE);
        }
        if row_idx == self.idx_row_base && col_idx == self.n_cols_index {
            return Some(N_THEME_BASE);
        }
        let (n_row_anchor, n_col_anchor) = if self.n_cols_index > 1 {
            (self.idx_row_body_first, 0)
        } else {
            (self.idx_row_base - 1, 1)
        };
        if row_idx == n_row_anchor && col_idx == n_col_anchor {
            return Some(N_THEME_SELECTION);
        }
        let if_in_selection = row_idx >= self.idx_row_body_first
            && row_idx < self.idx_row_body_first + self.n_rows_body
            && col_idx <= self.n_cols_index;
        if_in_selection.then_some(N_THEME_SELECTION)
    }

    fn derive(&self, base: &SpecCellFormat, row_idx: usize, col_idx: usize) -> Format {
        let fmt_spec = base.with_(SpecCellFormat {
            bg_theme: self.derive_selection_theme(row_idx, col_idx),
            ..Default::default()
        });
        derive_rust_xlsx_format(&fmt_spec)
    }

    fn derive_value(&self, value: &EnumCellValue, row_idx: usize, col_idx: usize) -> Format {
        let fmt_base = if col_idx < self.n_cols_index {
            self.formats.index.clone()
        } else if let Some(n_value) = value.as_number() {
            self.formats.body.with_(SpecCellFormat {
                num_format: Some(
                    select_number_format(n_value, row_idx == self.idx_row_base).to_string(),
                ),
                ..Default::default()
            })
        } else {
            self.formats.body.clone()
        };
        self.derive(&fmt_base, row_idx, col_idx)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSections

fn validate_question_sheet(df_body: &DataFrame, sheet: &SpecQuestionSheet) -> Result<(), XlsxIoError> {
    if sheet.n_cols_index == 0 || sheet.n_cols_index > 2 {
        return Err(XlsxIoError::InvalidLayout(format!(
            "n_cols_index must be 1 or 2, got {}.",
            sheet.n_cols_index
        )));
    }
    if df_body.width() < sheet.n_cols_index {
        return Err(XlsxIoError::InvalidLayout(
            "body is narrower than its index columns.".to_string(),
        ));
    }
    if sheet.header_grid.is_empty() {
        return Err(XlsxIoError::InvalidLayout(
            "header_grid must have >= 1 row.".to_string(),
        ));
    }
    if let Some(row) = sheet
        .header_grid
        .iter()
        .find(|row| row.len() != df_body.width())
    {
        return Err(XlsxIoError::InvalidLayout(format!(
            "header row width {} must equal body width {}.",
            row.len(),
            df_body.width()
        )));
    }
    Ok(())
}

fn write_title_block(
    worksheet: &mut Worksheet,
    painter: &SpecSheetPainter<'_>,
    sheet: &SpecQuestionSheet,
) -> Result<(), XlsxIoError> {
    worksheet.write_string_with_format(
        cast_row_num(N_IDX_ROW_TITLE)?,
        0,
        &sheet.title,
        &painter.derive(&painter.formats.title, N_IDX_ROW_TITLE, 0),
    )?;
    for (n_idx_col, c_marker) in TUP_SORT_MARKERS.iter().enumerate() {
        worksheet.write_string_with_format(
            cast_row_num(N_IDX_ROW_SORT_MARKER)?,
            cast_col_num(n_idx_col)?,
            *c_marker,
            &painter.derive(&painter.formats.marker, N_IDX_ROW_SORT_MARKER, n_idx_col),
        )?;
    }
    Ok(())
}

fn write_header(
    worksheet: &mut Worksheet,
    painter: &SpecSheetPainter<'_>,
    sheet: &SpecQuestionSheet,
) -> Result<(), XlsxIoError> {
    let n_idx_row_base_local = sheet.header_grid.len() - 1;

    for (n_idx_row_local, row_values) in sheet.header_grid.iter().enumerate() {
        let n_idx_row = N_IDX_ROW_HEADER_FIRST + n_idx_row_local;
        let if_is_base_row = n_idx_row_local == n_idx_row_base_local;

        let l_merges = if if_is_base_row {
            vec![]
        } else {
            let parent_row = n_idx_row_local
                .checked_sub(1)
                .map(|n_idx_parent| sheet.header_grid[n_idx_parent].as_slice());
            plan_horizontal_merges(row_values, parent_row, sheet.n_cols_index)
        };
        let l_merged_cols = derive_horizontal_merge_tracker(&l_merges);

        for (n_idx_col, value) in row_values.iter().enumerate() {
            if l_merged_cols.contains(&n_idx_col) {
                continue;
            }

            let format = if if_is_base_row && n_idx_col == sheet.n_cols_index - 1 {
                painter.derive(&painter.formats.base_label, n_idx_row, n_idx_col)
            } else if if_is_base_row {
                painter.derive_value(value, n_idx_row, usize::max(n_idx_col, sheet.n_cols_index))
            } else {
                painter.derive(&painter.formats.header, n_idx_row, n_idx_col)
            };

            let value = if if_is_base_row && n_idx_col == sheet.n_cols_index - 1 {
                EnumCellValue::String(C_BASE_LABEL.to_string())
            } else {
                value.clone()
            };
            write_cell_with_format(worksheet, n_idx_row, n_idx_col, &value, &format)?;
        }

        for merge in l_merges {
            worksheet.merge_range(
                cast_row_num(n_idx_row)?,
                cast_col_num(merge.col_idx_start)?,
                cast_row_num(n_idx_row)?,
                cast_col_num(merge.col_idx_end)?,
                &merge.text,
                &painter.derive(&painter.formats.header, n_idx_row, merge.col_idx_start),
            )?;
        }
    }

    Ok(())
}

fn write_body(
    worksheet: &mut Worksheet,
    painter: &SpecSheetPainter<'_>,
    df_body: &DataFrame,
    sheet: &SpecQuestionSheet,
) -> Result<(), XlsxIoError> {
    let n_idx_row_first = sheet.idx_row_body_first();
    let l_cols = df_body.get_columns();

    // Statement cells of matrix questions are merged per statement run.
    let l_statement_runs = if sheet.is_multi_level() {
        let l_statements = (0..df_body.height())
            .map(|n_row| -> Result<String, XlsxIoError> {
                Ok(derive_cell_value_from_any_value(l_cols[0].get(n_row)?).to_text())
            })
            .collect::<Result<Vec<_>, _>>()?;
        generate_vertical_runs(&l_statements)
    } else {
        vec![]
    };
    let dict_statement_covered = derive_vertical_merge_tracker(&l_statement_runs);

    for n_row_local in 0..df_body.height() {
        let n_idx_row = n_idx_row_first + n_row_local;
        for (n_idx_col, col) in l_cols.iter().enumerate() {
            if n_idx_col == 0 && dict_statement_covered.contains_key(&n_row_local) {
                continue;
            }
            let value = derive_cell_value_from_any_value(col.get(n_row_local)?);
            let format = painter.derive_value(&value, n_idx_row, n_idx_col);
            write_cell_with_format(worksheet, n_idx_row, n_idx_col, &value, &format)?;
        }
    }

    for (n_row_start, n_row_end, c_text) in l_statement_runs {
        let n_idx_row_start = n_idx_row_first + n_row_start;
        worksheet.merge_range(
            cast_row_num(n_idx_row_start)?,
            0,
            cast_row_num(n_idx_row_first + n_row_end)?,
            0,
            &c_text,
            &painter.derive(&painter.formats.index, n_idx_row_start, 0),
        )?;
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) if val.is_finite() => EnumCellValue::Number(val),
        AnyValue::Float64(_) => EnumCellValue::None,
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.bg_theme {
        format = format.set_background_color(Color::Theme(val, 0));
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
