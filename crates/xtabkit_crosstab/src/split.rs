//! End-to-end transform: source crosstab workbook -> per-question workbook.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use xtabkit_io_xlsx::{SpecSheetGrid, SpecWorkbookGrid, read_workbook_grid};

use crate::boundary::{derive_question_marker_rows, plan_question_blocks};
use crate::conf::C_OUTPUT_STEM_SUFFIX;
use crate::frame::{derive_column_keys, find_sample_size_row, normalize_question_frame};
use crate::label::parse_question_label;
use crate::merge::{cleanup_crosstab_book, reject_similar_questions};
use crate::render::write_crosstab_book;
use crate::report::ReportCrosstab;
use crate::spec::{CrosstabError, QuestionRecord, SpecCrosstabBook, SpecCrosstabLayout};

/// Parse one source sheet into `book`.
///
/// Each question block becomes a record keyed by its question text; blocks
/// repeating an earlier question are concatenated into that record.
pub fn parse_sheet(
    grid: &SpecSheetGrid,
    layout: &SpecCrosstabLayout,
    book: &mut SpecCrosstabBook,
    report: &mut ReportCrosstab,
) {
    report.cnt_sheets += 1;

    let mut l_marker_rows = derive_question_marker_rows(grid, layout);
    if l_marker_rows.is_empty() {
        report.warn(format!(
            "Sheet {:?} has no question markers; skipped.",
            grid.sheet_name
        ));
        return;
    }

    if layout.if_reject_similar_questions {
        let l_texts: Vec<String> = l_marker_rows
            .iter()
            .map(|n_idx_row| grid.value(*n_idx_row, 0).to_text())
            .collect();
        let l_rejected = reject_similar_questions(&l_texts, layout.thr_question_similarity);
        for n_idx in l_rejected.iter().rev() {
            let n_idx_row = l_marker_rows.remove(*n_idx);
            debug!(sheet = %grid.sheet_name, row = n_idx_row + 1, "rejected repeated question marker");
        }
        report.cnt_rejected += l_rejected.len() as u64;
    }

    if find_sample_size_row(grid, layout).is_none() {
        report.warn(format!(
            "Sheet {:?} has no {:?} row; bases left blank.",
            grid.sheet_name, layout.sample_size_label
        ));
    }
    let columns = derive_column_keys(grid, layout);

    let l_blocks = plan_question_blocks(&l_marker_rows, grid.height(), layout.idx_row_data_first);
    for block in &l_blocks {
        let label = parse_question_label(&grid.value(block.idx_row_marker, 0).to_text());
        let frame = normalize_question_frame(
            grid,
            block,
            &columns,
            label.statement.as_deref(),
            layout,
            report,
        );
        debug!(
            sheet = %grid.sheet_name,
            row = block.idx_row_marker + 1,
            question = %label.question,
            n_rows = frame.height(),
            "parsed question block"
        );

        let record = QuestionRecord {
            question: label.question,
            prefix: label.prefix,
            frame,
            sample_sizes: columns.sample_sizes.clone(),
        };
        if book.merge_record(record) {
            report.cnt_merged += 1;
        }
    }
    report.cnt_blocks += l_blocks.len() as u64;

    info!(
        sheet = %grid.sheet_name,
        n_blocks = l_blocks.len(),
        n_questions = book.len(),
        "parsed sheet"
    );
}

/// Parse every sheet of `workbook` and run the cleanup pass.
pub fn parse_workbook(
    workbook: &SpecWorkbookGrid,
    layout: &SpecCrosstabLayout,
) -> (SpecCrosstabBook, ReportCrosstab) {
    let mut report = ReportCrosstab::default();
    let mut book = SpecCrosstabBook::new();
    for grid in &workbook.sheets {
        parse_sheet(grid, layout, &mut book, &mut report);
    }

    let book = cleanup_crosstab_book(book, layout, &mut report);
    report.cnt_questions = book.len() as u64;
    (book, report)
}

/// `<dir>/<stem>_output.xlsx` next to the input file.
pub fn derive_output_path(path_file_in: &Path) -> Result<PathBuf, CrosstabError> {
    let c_stem = path_file_in
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| CrosstabError::InvalidInputPath(path_file_in.to_path_buf()))?;
    Ok(path_file_in.with_file_name(format!("{c_stem}{C_OUTPUT_STEM_SUFFIX}.xlsx")))
}

/// Split the crosstab workbook at `path_file_in` into a per-question workbook.
///
/// The output goes to `path_file_out`, or to [`derive_output_path`] when none
/// is given. Parsing never fails on odd content; anomalies end up in the
/// report's warnings.
pub fn split_excel(
    path_file_in: &Path,
    path_file_out: Option<&Path>,
    layout: &SpecCrosstabLayout,
) -> Result<ReportCrosstab, CrosstabError> {
    layout.validate()?;
    let path_file_out = match path_file_out {
        Some(path) => path.to_path_buf(),
        None => derive_output_path(path_file_in)?,
    };

    let workbook = read_workbook_grid(path_file_in)?;
    let (book, mut report) = parse_workbook(&workbook, layout);

    let report_xlsx = write_crosstab_book(&book, &path_file_out)?;
    for msg in report_xlsx.warnings {
        report.warn(msg);
    }
    report.path_file_out = Some(path_file_out);

    info!(
        path_in = %path_file_in.display(),
        n_sheets_out = report_xlsx.sheets.len(),
        "{report}"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use xtabkit_io_xlsx::{EnumCellValue, SpecGridCell};

    use super::*;

    fn s(text: &str) -> SpecGridCell {
        SpecGridCell::from_value(EnumCellValue::String(text.to_string()))
    }

    fn n(value: f64) -> SpecGridCell {
        SpecGridCell::from_value(EnumCellValue::Number(value))
    }

    fn marker(text: &str) -> SpecGridCell {
        SpecGridCell {
            fill_argb: Some("FFFBE4E4".to_string()),
            ..s(text)
        }
    }

    fn header_rows() -> Vec<Vec<SpecGridCell>> {
        vec![
            vec![s("Banner book")],
            vec![],
            vec![],
            vec![],
            vec![s(""), s("Total: Total"), s("Gender: Male"), s("")],
            vec![s(""), s("Total"), s("Male"), s("Female")],
            vec![s("Sample Size"), n(200.0), n(90.0), n(110.0)],
        ]
    }

    fn grid(name: &str, body: Vec<Vec<SpecGridCell>>) -> SpecSheetGrid {
        let mut grid = SpecSheetGrid::new(name);
        grid.rows = header_rows();
        grid.rows.extend(body);
        grid
    }

    #[test]
    fn test_matrix_statements_merge_into_one_question() {
        let grid = grid(
            "Sheet1",
            vec![
                vec![marker("A.\tHow much do you agree?: Price is fair")],
                vec![s("Agree")],
                vec![s("Column %"), n(0.6), n(0.5), n(0.7)],
                vec![s("Disagree")],
                vec![s("Column %"), n(0.4), n(0.5), n(0.3)],
                vec![marker("A.\tHow much do you agree?: Staff were friendly")],
                vec![s("Agree")],
                vec![s("Column %"), n(0.8), n(0.7), n(0.9)],
            ],
        );
        let workbook = SpecWorkbookGrid { sheets: vec![grid] };

        let (book, report) = parse_workbook(&workbook, &SpecCrosstabLayout::default());

        assert_eq!(book.questions(), vec!["How much do you agree?"]);
        let record = &book.records()[0];
        assert_eq!(record.prefix, "A.");
        assert!(record.frame.is_multi_level());
        assert_eq!(record.frame.height(), 3);
        assert_eq!(record.frame.rows[2].key.statement(), Some("Staff were friendly"));
        assert_eq!(report.cnt_blocks, 2);
        assert_eq!(report.cnt_merged, 1);
        assert_eq!(report.cnt_questions, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_same_question_merges_across_sheets_and_scrubs() {
        let body = |age: &str| {
            vec![
                vec![marker("B.\tWhich age group are you in?")],
                vec![s(&format!("Age Group {age}"))],
                vec![s("Column %"), n(0.5), n(0.5), n(0.5)],
            ]
        };
        let workbook = SpecWorkbookGrid {
            sheets: vec![grid("Sheet1", body("18-24")), grid("Sheet2", body("25-34"))],
        };

        let (book, report) = parse_workbook(&workbook, &SpecCrosstabLayout::default());

        assert_eq!(book.questions(), vec!["Age Group"]);
        let l_labels: Vec<&str> = book.records()[0]
            .frame
            .rows
            .iter()
            .map(|row| row.key.response())
            .collect();
        assert_eq!(l_labels, vec!["18-24", "25-34"]);
        assert_eq!(report.cnt_sheets, 2);
        assert_eq!(report.cnt_scrubbed, 1);
    }

    #[test]
    fn test_sheet_without_markers_is_skipped() {
        let workbook = SpecWorkbookGrid {
            sheets: vec![grid("Notes", vec![vec![s("Just text")]])],
        };
        let (book, report) = parse_workbook(&workbook, &SpecCrosstabLayout::default());
        assert!(book.is_empty());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_similar_markers_fold_into_previous_block() {
        let grid = grid(
            "Sheet1",
            vec![
                vec![marker("C.\tRate the service of branch north")],
                vec![s("Good")],
                vec![s("Column %"), n(0.6), n(0.6), n(0.6)],
                vec![marker("C.\tRate the service of branch south")],
                vec![s("Poor")],
                vec![s("Column %"), n(0.4), n(0.4), n(0.4)],
            ],
        );
        let workbook = SpecWorkbookGrid { sheets: vec![grid] };
        let layout = SpecCrosstabLayout {
            if_reject_similar_questions: true,
            if_scrub_common_prefix: false,
            ..Default::default()
        };

        let (book, report) = parse_workbook(&workbook, &layout);

        assert_eq!(report.cnt_rejected, 1);
        assert_eq!(book.questions(), vec!["Rate the service of branch north"]);
        let l_labels: Vec<&str> = book.records()[0]
            .frame
            .rows
            .iter()
            .map(|row| row.key.response())
            .collect();
        assert_eq!(l_labels, vec!["Good", "Poor"]);
    }

    #[test]
    fn test_output_path_sits_next_to_input() {
        let path = derive_output_path(Path::new("/data/survey.xlsx")).expect("output path");
        assert_eq!(path, PathBuf::from("/data/survey_output.xlsx"));

        let err = derive_output_path(Path::new("/")).expect_err("no stem");
        assert!(matches!(err, CrosstabError::InvalidInputPath(_)));
    }
}
