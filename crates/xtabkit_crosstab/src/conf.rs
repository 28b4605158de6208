//! Crosstab layout constants of the supported export convention.

/// First-column fill colors that flag the first row of a question block.
pub const TUP_QUESTION_MARKER_ARGB: [&str; 2] = ["FFFBE4E4", "FFEEEDEC"];

/// Row labels that carry metrics rather than responses.
pub const TUP_METRIC_KEYWORDS: [&str; 7] = [
    "Sample Size",
    "Mentions",
    "% Sample Size",
    "Count",
    "Column %",
    "Mean",
    "Median",
];

/// Metric labels kept as values besides percentage rows.
pub const TUP_CENTRAL_TENDENCY_KEYWORDS: [&str; 2] = ["Mean", "Median"];

/// First-column label of the row holding per-column sample sizes.
pub const C_SAMPLE_SIZE_LABEL: &str = "Sample Size";

/// Zero-based row of the category headers (`"<banner>: <category>"`).
pub const N_IDX_ROW_CATEGORY_HEADER: usize = 4;
/// Zero-based row of the column headers.
pub const N_IDX_ROW_COLUMN_HEADER: usize = 5;
/// Zero-based row of the first data row.
pub const N_IDX_ROW_DATA_FIRST: usize = 7;

/// Share of positional word matches above which a question is treated as a
/// repeat of the previous one.
pub const N_THR_QUESTION_SIMILARITY: f64 = 0.75;

/// Separator between banner name and category in category headers, and
/// between question components in question labels.
pub const C_LABEL_SEPARATOR: &str = ": ";

/// Suffix appended to the input file stem for the output workbook.
pub const C_OUTPUT_STEM_SUFFIX: &str = "_output";
/// Prefix of generated question sheet codes (`T1`, `T2`, ...).
pub const C_QUESTION_SHEET_PREFIX: &str = "T";

/// Index column names of the rendered body.
pub const C_COLNAME_STATEMENT: &str = "Statement";
pub const C_COLNAME_RESPONSE: &str = "Response";
