//! Record -> sheet conversion and workbook output.

use std::path::Path;

use polars::prelude::{Column, DataFrame};
use tracing::debug;
use xtabkit_io_xlsx::{
    EnumCellValue, SpecQuestionSheet, SpecXlsxReport, SurveyXlsxWriter, XlsxIoError,
};

use crate::conf::{C_COLNAME_RESPONSE, C_COLNAME_STATEMENT, C_QUESTION_SHEET_PREFIX};
use crate::spec::{CrosstabError, QuestionFrame, QuestionRecord, SpecCrosstabBook};

/// Sheet code of the `n_idx`-th record (`T1`, `T2`, ...).
pub fn derive_sheet_code(n_idx: usize) -> String {
    format!("{C_QUESTION_SHEET_PREFIX}{}", n_idx + 1)
}

/// Body dataframe of `frame`: index columns, then one column per value column.
///
/// Value columns holding only numbers and blanks become `f64` columns; any
/// text turns the whole column into strings.
pub fn derive_body_dataframe(frame: &QuestionFrame) -> Result<DataFrame, CrosstabError> {
    let mut l_cols = Vec::with_capacity(frame.width() + 2);
    if frame.is_multi_level() {
        let l_statements: Vec<&str> = frame
            .rows
            .iter()
            .map(|row| row.key.statement().unwrap_or_default())
            .collect();
        l_cols.push(Column::new(C_COLNAME_STATEMENT.into(), l_statements));
    }
    let l_responses: Vec<&str> = frame.rows.iter().map(|row| row.key.response()).collect();
    l_cols.push(Column::new(C_COLNAME_RESPONSE.into(), l_responses));

    for n_idx_col in 0..frame.width() {
        let l_values: Vec<&EnumCellValue> =
            frame.rows.iter().map(|row| &row.values[n_idx_col]).collect();
        let c_name = format!("col_{}", n_idx_col + 1);

        let if_is_numeric = l_values
            .iter()
            .all(|value| matches!(value, EnumCellValue::Number(_) | EnumCellValue::None));
        let col = if if_is_numeric {
            let l_numbers: Vec<Option<f64>> = l_values.iter().map(|v| v.as_number()).collect();
            Column::new(c_name.into(), l_numbers)
        } else {
            let l_texts: Vec<Option<String>> = l_values
                .iter()
                .map(|v| (!v.is_blank()).then(|| v.to_text()))
                .collect();
            Column::new(c_name.into(), l_texts)
        };
        l_cols.push(col);
    }

    let df_body = DataFrame::new(l_cols).map_err(XlsxIoError::from)?;
    Ok(df_body)
}

/// Output sheet layout of `record`: category, header and base rows padded
/// with blanks under the index columns.
pub fn derive_question_sheet(record: &QuestionRecord, sheet_name: String) -> SpecQuestionSheet {
    let n_cols_index = if record.frame.is_multi_level() { 2 } else { 1 };
    let l_pad = vec![EnumCellValue::None; n_cols_index];

    let row_categories: Vec<EnumCellValue> = l_pad
        .iter()
        .cloned()
        .chain(
            record
                .frame
                .columns
                .iter()
                .map(|key| EnumCellValue::String(key.category.clone())),
        )
        .collect();
    let row_headers: Vec<EnumCellValue> = l_pad
        .iter()
        .cloned()
        .chain(
            record
                .frame
                .columns
                .iter()
                .map(|key| EnumCellValue::String(key.header.clone())),
        )
        .collect();
    let row_bases: Vec<EnumCellValue> = l_pad
        .iter()
        .cloned()
        .chain(record.frame.columns.iter().map(|key| key.sample_size.clone()))
        .collect();

    SpecQuestionSheet {
        sheet_name,
        title: record.question.clone(),
        header_grid: vec![row_categories, row_headers, row_bases],
        n_cols_index,
    }
}

/// Write `book` to `path_file_out`: the contents sheet, then one sheet per
/// record in book order.
pub fn write_crosstab_book(
    book: &SpecCrosstabBook,
    path_file_out: &Path,
) -> Result<SpecXlsxReport, CrosstabError> {
    let l_entries: Vec<(String, String)> = book
        .records()
        .iter()
        .enumerate()
        .map(|(n_idx, record)| (derive_sheet_code(n_idx), record.question.clone()))
        .collect();

    let mut writer = SurveyXlsxWriter::new(path_file_out);
    writer.write_contents_sheet(&l_entries)?;
    for ((c_code, _), record) in l_entries.into_iter().zip(book.records()) {
        let df_body = derive_body_dataframe(&record.frame)?;
        let sheet = derive_question_sheet(record, c_code);
        writer.write_question_sheet(&df_body, &sheet)?;
    }
    writer.close()?;

    debug!(path = %path_file_out.display(), n_questions = book.len(), "wrote crosstab book");
    Ok(writer.report())
}
