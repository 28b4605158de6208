//! Frame normalizer: column keys of a sheet and per-block question frames.

use xtabkit_io_xlsx::{EnumCellValue, SpecSheetGrid};

use crate::conf::C_LABEL_SEPARATOR;
use crate::report::ReportCrosstab;
use crate::spec::{
    EnumRowKey, QuestionFrame, SpecColumnKey, SpecCrosstabLayout, SpecQuestionBlock,
    SpecSheetColumns,
};

/// First row whose first cell equals the layout's sample-size label.
pub fn find_sample_size_row(grid: &SpecSheetGrid, layout: &SpecCrosstabLayout) -> Option<usize> {
    (0..grid.height()).find(|n_idx_row| {
        grid.value(*n_idx_row, 0).to_text().trim() == layout.sample_size_label
    })
}

/// Three-level keys of the value columns `1..width` of `grid`.
///
/// Category headers are forward-filled across merged banner cells and keep
/// only the text after the banner name (`"Gender: Male"` -> `"Male"`).
/// Without a sample-size row every base is blank.
pub fn derive_column_keys(grid: &SpecSheetGrid, layout: &SpecCrosstabLayout) -> SpecSheetColumns {
    let idx_row_sample_size = find_sample_size_row(grid, layout);

    let mut c_category_last = String::new();
    let mut columns = Vec::new();
    for n_idx_col in 1..grid.width() {
        let category = grid.value(layout.idx_row_category_header, n_idx_col);
        if !category.is_blank() {
            c_category_last = derive_category_text(&category.to_text());
        }
        let sample_size = idx_row_sample_size
            .map(|n_idx_row| grid.value(n_idx_row, n_idx_col).clone())
            .unwrap_or_default();

        columns.push(SpecColumnKey {
            category: c_category_last.clone(),
            header: grid
                .value(layout.idx_row_column_header, n_idx_col)
                .to_text()
                .trim()
                .to_string(),
            sample_size,
        });
    }

    let sample_sizes = columns.iter().map(|key| key.sample_size.clone()).collect();
    SpecSheetColumns {
        columns,
        sample_sizes,
    }
}

fn derive_category_text(text: &str) -> String {
    match text.split_once(C_LABEL_SEPARATOR) {
        Some((_, category)) => category.trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Normalize the body rows of one question block.
///
/// Non-metric labels become responses; only ratio metric rows (labels with
/// `%`, or central tendencies) keep their values, paired with the responses
/// in order. A block without responses labels rows by their metric name.
/// Blank labels and marker-filled rows are skipped. When `statement` is
/// present every row key carries it as the outer level.
pub fn normalize_question_frame(
    grid: &SpecSheetGrid,
    block: &SpecQuestionBlock,
    columns: &SpecSheetColumns,
    statement: Option<&str>,
    layout: &SpecCrosstabLayout,
    report: &mut ReportCrosstab,
) -> QuestionFrame {
    let mut l_responses: Vec<String> = Vec::new();
    let mut l_metric_rows: Vec<(String, Vec<EnumCellValue>)> = Vec::new();

    for n_idx_row in block.body() {
        let c_label = grid.value(n_idx_row, 0).to_text().trim().to_string();
        // Marker rows inside a body belong to folded repeat questions.
        let if_is_marker = grid
            .fill_argb(n_idx_row, 0)
            .is_some_and(|c_argb| layout.is_marker_color(c_argb));
        if c_label.is_empty() || if_is_marker {
            continue;
        }
        if !layout.is_metric_label(&c_label) {
            l_responses.push(c_label);
        } else if layout.is_ratio_metric(&c_label) {
            l_metric_rows.push((c_label, grid.row_values_from(n_idx_row, 1)));
        }
    }

    if l_responses.is_empty() {
        l_responses = l_metric_rows.iter().map(|(label, _)| label.clone()).collect();
    }
    if l_responses.len() != l_metric_rows.len() {
        report.warn(format!(
            "Sheet {:?} row {}: {} responses vs {} value rows; keeping {}.",
            grid.sheet_name,
            block.idx_row_marker + 1,
            l_responses.len(),
            l_metric_rows.len(),
            usize::min(l_responses.len(), l_metric_rows.len())
        ));
    }

    let mut frame = QuestionFrame::new(columns.columns.clone());
    for (response, (_, values)) in l_responses.into_iter().zip(l_metric_rows) {
        let key = match statement {
            Some(statement) => EnumRowKey::Statement {
                statement: statement.to_string(),
                response,
            },
            None => EnumRowKey::Response(response),
        };
        frame.push_row(key, values);
    }
    frame
}
