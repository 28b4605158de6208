//! `xtabkit_crosstab` v1:
//! Survey crosstab parser and per-question workbook splitter.
//!
//! Pipeline: grid -> question markers -> blocks -> labels -> frames ->
//! merged book -> cleanup -> output workbook.
//! - `boundary` : marker-color block detection
//! - `label`    : question label parsing
//! - `frame`    : column keys and frame normalization
//! - `merge`    : common-prefix scrub, cleanup and repeat rejection
//! - `render`   : record -> sheet conversion and workbook output
//! - `split`    : end-to-end orchestration
//! - `spec`     : layout options/models/errors
//! - `report`   : run-time report model
//! - `conf`     : layout constants

pub mod boundary;
pub mod conf;
pub mod frame;
pub mod label;
pub mod merge;
pub mod render;
pub mod report;
pub mod spec;
pub mod split;

pub use boundary::{derive_question_marker_rows, plan_question_blocks};
pub use frame::{derive_column_keys, find_sample_size_row, normalize_question_frame};
pub use label::parse_question_label;
pub use merge::{
    cleanup_crosstab_book, derive_common_leading_words, reject_similar_questions,
    scrub_common_prefix,
};
pub use render::write_crosstab_book;
pub use report::ReportCrosstab;
pub use spec::{
    CrosstabError, EnumRowKey, QuestionFrame, QuestionRecord, SpecColumnKey, SpecCrosstabBook,
    SpecCrosstabLayout, SpecQuestionBlock, SpecQuestionLabel, SpecSheetColumns,
};
pub use split::{derive_output_path, parse_sheet, parse_workbook, split_excel};
