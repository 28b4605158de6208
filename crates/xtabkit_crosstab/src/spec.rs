//! Crosstab layout options, question models and top-level error types.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use xtabkit_io_xlsx::{EnumCellValue, XlsxIoError};

use crate::conf::{
    C_SAMPLE_SIZE_LABEL, N_IDX_ROW_CATEGORY_HEADER, N_IDX_ROW_COLUMN_HEADER, N_IDX_ROW_DATA_FIRST,
    N_THR_QUESTION_SIMILARITY, TUP_CENTRAL_TENDENCY_KEYWORDS, TUP_METRIC_KEYWORDS,
    TUP_QUESTION_MARKER_ARGB,
};

////////////////////////////////////////////////////////////////////////////////
// #region LayoutOptions

/// Source layout convention plus cleanup switches.
///
/// Every field has a default matching the supported export convention, so a
/// TOML override only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpecCrosstabLayout {
    /// First-column fill colors (`AARRGGBB`) marking question rows.
    pub marker_argb: Vec<String>,
    /// Row labels treated as metrics.
    pub metric_keywords: Vec<String>,
    /// Metric labels kept as values besides labels containing `%`.
    pub central_tendency_keywords: Vec<String>,
    /// First-column label of the sample-size row.
    pub sample_size_label: String,
    /// Zero-based category header row.
    pub idx_row_category_header: usize,
    /// Zero-based column header row.
    pub idx_row_column_header: usize,
    /// Zero-based first data row.
    pub idx_row_data_first: usize,
    /// Drop question markers whose text repeats the previous question.
    pub if_reject_similar_questions: bool,
    /// Positional word-overlap share at which a question counts as a repeat.
    pub thr_question_similarity: f64,
    /// Promote shared leading words of response labels to the question title.
    pub if_scrub_common_prefix: bool,
}

impl Default for SpecCrosstabLayout {
    fn default() -> Self {
        Self {
            marker_argb: TUP_QUESTION_MARKER_ARGB.map(String::from).to_vec(),
            metric_keywords: TUP_METRIC_KEYWORDS.map(String::from).to_vec(),
            central_tendency_keywords: TUP_CENTRAL_TENDENCY_KEYWORDS.map(String::from).to_vec(),
            sample_size_label: C_SAMPLE_SIZE_LABEL.to_string(),
            idx_row_category_header: N_IDX_ROW_CATEGORY_HEADER,
            idx_row_column_header: N_IDX_ROW_COLUMN_HEADER,
            idx_row_data_first: N_IDX_ROW_DATA_FIRST,
            if_reject_similar_questions: false,
            thr_question_similarity: N_THR_QUESTION_SIMILARITY,
            if_scrub_common_prefix: true,
        }
    }
}

impl SpecCrosstabLayout {
    /// Parse a TOML override on top of the defaults and validate it.
    pub fn from_toml_str(txt: &str) -> Result<Self, CrosstabError> {
        let layout: Self = toml::from_str(txt).map_err(|err| CrosstabError::Config {
            path: None,
            message: err.to_string(),
        })?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a TOML override file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CrosstabError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|err| CrosstabError::Config {
            path: Some(path.to_path_buf()),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&txt).map_err(|err| match err {
            CrosstabError::Config { message, .. } => CrosstabError::Config {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    /// Check row offsets and thresholds for consistency.
    pub fn validate(&self) -> Result<(), CrosstabError> {
        if self.marker_argb.is_empty() {
            return Err(CrosstabError::InvalidLayout(
                "marker_argb must list >= 1 color.".to_string(),
            ));
        }
        if self.idx_row_category_header >= self.idx_row_data_first
            || self.idx_row_column_header >= self.idx_row_data_first
        {
            return Err(CrosstabError::InvalidLayout(format!(
                "header rows ({}, {}) must precede idx_row_data_first={}.",
                self.idx_row_category_header, self.idx_row_column_header, self.idx_row_data_first
            )));
        }
        if !(0.0..=1.0).contains(&self.thr_question_similarity) {
            return Err(CrosstabError::InvalidLayout(format!(
                "thr_question_similarity must be within [0, 1], got {}.",
                self.thr_question_similarity
            )));
        }
        Ok(())
    }

    /// Whether `argb` is one of the question marker colors.
    pub fn is_marker_color(&self, argb: &str) -> bool {
        self.marker_argb
            .iter()
            .any(|c_marker| c_marker.eq_ignore_ascii_case(argb))
    }

    /// Whether `label` names a metric row.
    pub fn is_metric_label(&self, label: &str) -> bool {
        self.metric_keywords.iter().any(|c_kw| c_kw == label)
    }

    /// Whether a metric row holds shares or central tendencies.
    pub fn is_ratio_metric(&self, label: &str) -> bool {
        label.contains('%') || self.central_tendency_keywords.iter().any(|c_kw| c_kw == label)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region QuestionModels

/// Components of one raw question label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecQuestionLabel {
    /// Outline prefix such as `A.` or `Q3`.
    pub prefix: String,
    /// Question text.
    pub question: String,
    /// Matrix statement, when the label carries one.
    pub statement: Option<String>,
}

/// One question block of a source sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecQuestionBlock {
    /// Row carrying the question marker fill and label.
    pub idx_row_marker: usize,
    /// First body row (inclusive).
    pub idx_row_body_start: usize,
    /// End of the block (exclusive): next marker row or sheet height.
    pub idx_row_end_exclusive: usize,
}

impl SpecQuestionBlock {
    /// Full block range, marker row included.
    pub fn rows(&self) -> Range<usize> {
        self.idx_row_marker..self.idx_row_end_exclusive
    }

    /// Body rows; empty when the block has no data rows.
    pub fn body(&self) -> Range<usize> {
        self.idx_row_body_start..usize::max(self.idx_row_body_start, self.idx_row_end_exclusive)
    }
}

/// Three-level column header of one value column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnKey {
    /// Banner category (text after the banner name).
    pub category: String,
    /// Column header.
    pub header: String,
    /// Column base from the sample-size row.
    pub sample_size: EnumCellValue,
}

/// Value columns of one source sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetColumns {
    /// Keys of grid columns `1..width`.
    pub columns: Vec<SpecColumnKey>,
    /// Sample sizes in column order.
    pub sample_sizes: Vec<EnumCellValue>,
}

/// Row key of a question frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumRowKey {
    /// Single-level response label.
    Response(String),
    /// Two-level `(statement, response)` key of matrix questions.
    Statement {
        /// Matrix statement.
        statement: String,
        /// Response label.
        response: String,
    },
}

impl EnumRowKey {
    pub fn response(&self) -> &str {
        match self {
            Self::Response(response) | Self::Statement { response, .. } => response,
        }
    }

    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Response(_) => None,
            Self::Statement { statement, .. } => Some(statement),
        }
    }

    /// Same key level with a replaced response label.
    pub fn with_response(&self, response: String) -> Self {
        match self {
            Self::Response(_) => Self::Response(response),
            Self::Statement { statement, .. } => Self::Statement {
                statement: statement.clone(),
                response,
            },
        }
    }
}

/// One frame row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFrameRow {
    /// Row key.
    pub key: EnumRowKey,
    /// One value per frame column.
    pub values: Vec<EnumCellValue>,
}

/// Tabular response data of one question.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionFrame {
    /// Column keys in display order.
    pub columns: Vec<SpecColumnKey>,
    /// Rows in display order.
    pub rows: Vec<SpecFrameRow>,
}

impl QuestionFrame {
    /// Empty frame over `columns`.
    pub fn new(columns: Vec<SpecColumnKey>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; values are padded or truncated to the frame width.
    pub fn push_row(&mut self, key: EnumRowKey, mut values: Vec<EnumCellValue>) {
        values.resize(self.columns.len(), EnumCellValue::None);
        self.rows.push(SpecFrameRow { key, values });
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Whether any row carries a statement level.
    pub fn is_multi_level(&self) -> bool {
        self.rows.iter().any(|row| row.key.statement().is_some())
    }

    /// Row-wise union with `other`.
    ///
    /// Columns of `other` missing from `self` are appended; cells without a
    /// source value stay blank.
    pub fn concat(&mut self, other: QuestionFrame) {
        let l_col_positions: Vec<usize> = other
            .columns
            .iter()
            .map(|key| match self.columns.iter().position(|c| c == key) {
                Some(n_idx) => n_idx,
                None => {
                    self.columns.push(key.clone());
                    self.columns.len() - 1
                }
            })
            .collect();

        let n_width = self.columns.len();
        for row in &mut self.rows {
            row.values.resize(n_width, EnumCellValue::None);
        }

        for row in other.rows {
            let mut values = vec![EnumCellValue::None; n_width];
            for (value, n_idx) in row.values.into_iter().zip(&l_col_positions) {
                values[*n_idx] = value;
            }
            self.rows.push(SpecFrameRow {
                key: row.key,
                values,
            });
        }
    }
}

/// One survey question ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    /// Question text; also the merge key.
    pub question: String,
    /// Outline prefix of the first block that produced this record.
    pub prefix: String,
    /// Response data.
    pub frame: QuestionFrame,
    /// Sample sizes of the source sheet, in source column order.
    pub sample_sizes: Vec<EnumCellValue>,
}

/// Question records in first-seen order, keyed by question text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCrosstabBook {
    records: Vec<QuestionRecord>,
    dict_idx_by_question: HashMap<String, usize>,
}

impl SpecCrosstabBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record`, or concatenate its frame into the record with the
    /// same question text. Returns `true` when a merge happened.
    pub fn merge_record(&mut self, record: QuestionRecord) -> bool {
        if let Some(&n_idx) = self.dict_idx_by_question.get(&record.question) {
            self.records[n_idx].frame.concat(record.frame);
            return true;
        }
        self.dict_idx_by_question
            .insert(record.question.clone(), self.records.len());
        self.records.push(record);
        false
    }

    pub fn get(&self, question: &str) -> Option<&QuestionRecord> {
        self.dict_idx_by_question
            .get(question)
            .map(|n_idx| &self.records[*n_idx])
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<QuestionRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Question texts in book order.
    pub fn questions(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.question.as_str()).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// "Top-level call failed" errors (I/O, configuration, layout validation).
#[derive(Debug, Error)]
pub enum CrosstabError {
    /// Workbook read/write failure.
    #[error(transparent)]
    Io(#[from] XlsxIoError),
    /// Layout override file could not be read or parsed.
    #[error("invalid layout config{}: {message}", derive_config_path_text(.path))]
    Config {
        /// Config file, when loaded from disk.
        path: Option<PathBuf>,
        /// Underlying error text.
        message: String,
    },
    /// Layout values are inconsistent.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    /// Input path has no usable file stem.
    #[error("cannot derive output path from {}", .0.display())]
    InvalidInputPath(PathBuf),
}

fn derive_config_path_text(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: &str, header: &str, n: f64) -> SpecColumnKey {
        SpecColumnKey {
            category: category.to_string(),
            header: header.to_string(),
            sample_size: EnumCellValue::Number(n),
        }
    }

    #[test]
    fn test_layout_toml_override_keeps_defaults() {
        let layout = SpecCrosstabLayout::from_toml_str(
            r#"
            marker_argb = ["FF00FF00"]
            if_reject_similar_questions = true
            "#,
        )
        .expect("parse layout");

        assert_eq!(layout.marker_argb, vec!["FF00FF00".to_string()]);
        assert!(layout.if_reject_similar_questions);
        assert_eq!(layout.idx_row_data_first, N_IDX_ROW_DATA_FIRST);
        assert_eq!(layout.sample_size_label, "Sample Size");
        assert!(layout.is_marker_color("ff00ff00"));
    }

    #[test]
    fn test_layout_validation_rejects_bad_offsets() {
        let err = SpecCrosstabLayout::from_toml_str("idx_row_data_first = 3")
            .expect_err("header rows after data");
        assert!(matches!(err, CrosstabError::InvalidLayout(_)));

        let err = SpecCrosstabLayout::from_toml_str("thr_question_similarity = 1.5")
            .expect_err("threshold out of range");
        assert!(matches!(err, CrosstabError::InvalidLayout(_)));

        let err = SpecCrosstabLayout::from_toml_str("marker_argb = 3").expect_err("bad type");
        assert!(matches!(err, CrosstabError::Config { path: None, .. }));
    }

    #[test]
    fn test_layout_metric_classification() {
        let layout = SpecCrosstabLayout::default();
        assert!(layout.is_metric_label("Column %"));
        assert!(layout.is_metric_label("Count"));
        assert!(!layout.is_metric_label("Very satisfied"));
        assert!(layout.is_ratio_metric("Column %"));
        assert!(layout.is_ratio_metric("% Sample Size"));
        assert!(layout.is_ratio_metric("Mean"));
        assert!(!layout.is_ratio_metric("Count"));
        assert!(!layout.is_ratio_metric("Sample Size"));
    }

    #[test]
    fn test_frame_concat_unions_columns() {
        let mut frame = QuestionFrame::new(vec![key("Gender", "Male", 10.0)]);
        frame.push_row(
            EnumRowKey::Response("Yes".to_string()),
            vec![EnumCellValue::Number(0.4)],
        );

        let mut other = QuestionFrame::new(vec![key("Age", "18-24", 5.0), key("Gender", "Male", 10.0)]);
        other.push_row(
            EnumRowKey::Response("No".to_string()),
            vec![EnumCellValue::Number(0.2), EnumCellValue::Number(0.6)],
        );

        frame.concat(other);

        assert_eq!(frame.width(), 2);
        assert_eq!(frame.columns[1].header, "18-24");
        assert_eq!(
            frame.rows[0].values,
            vec![EnumCellValue::Number(0.4), EnumCellValue::None]
        );
        assert_eq!(
            frame.rows[1].values,
            vec![EnumCellValue::Number(0.6), EnumCellValue::Number(0.2)]
        );
    }

    #[test]
    fn test_book_merges_identical_questions_in_first_seen_order() {
        let columns = vec![key("Total", "Total", 100.0)];
        let record = |question: &str, response: &str| {
            let mut frame = QuestionFrame::new(columns.clone());
            frame.push_row(
                EnumRowKey::Response(response.to_string()),
                vec![EnumCellValue::Number(0.5)],
            );
            QuestionRecord {
                question: question.to_string(),
                prefix: String::new(),
                frame,
                sample_sizes: vec![EnumCellValue::Number(100.0)],
            }
        };

        let mut book = SpecCrosstabBook::new();
        assert!(!book.merge_record(record("Q one", "Yes")));
        assert!(!book.merge_record(record("Q two", "Yes")));
        assert!(book.merge_record(record("Q one", "No")));

        assert_eq!(book.questions(), vec!["Q one", "Q two"]);
        let merged = book.get("Q one").expect("merged record");
        assert_eq!(merged.frame.height(), 2);
        assert_eq!(merged.frame.rows[1].key.response(), "No");
    }

    #[test]
    fn test_block_ranges() {
        let block = SpecQuestionBlock {
            idx_row_marker: 9,
            idx_row_body_start: 10,
            idx_row_end_exclusive: 10,
        };
        assert_eq!(block.rows(), 9..10);
        assert!(block.body().is_empty());
    }
}
