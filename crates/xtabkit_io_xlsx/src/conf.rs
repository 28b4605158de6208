//! XLSX constants and default survey-sheet format presets.

use crate::spec::{SpecCellFormat, SpecSurveyFormats};

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Zero-based row holding the question title.
pub const N_IDX_ROW_TITLE: usize = 0;
/// Zero-based row holding the `bar` / `*Sort` markers.
pub const N_IDX_ROW_SORT_MARKER: usize = 2;
/// Zero-based row where the three-level column header starts.
pub const N_IDX_ROW_HEADER_FIRST: usize = 3;
/// Column width applied to index (statement/response) columns.
pub const N_WIDTH_INDEX_COLUMN: f64 = 20.0;
/// Row height applied to the header and body rows.
pub const N_HEIGHT_ROW: f64 = 25.0;

/// Text written next to the sample-size row.
pub const C_BASE_LABEL: &str = "Base";
/// Marker texts written on the sort row.
pub const TUP_SORT_MARKERS: [&str; 2] = ["bar", "*Sort"];
/// Header of the contents sheet.
pub const C_CONTENTS_TITLE: &str = "Contents";

/// Theme colors used to pre-select cells for downstream charting.
pub const N_THEME_TITLE: u8 = 4;
pub const N_THEME_BASE: u8 = 5;
pub const N_THEME_SELECTION: u8 = 7;

/// Number format for values below one (shares).
pub const C_NUM_FORMAT_PERCENT: &str = "0%";
/// Number format for body values at or above one.
pub const C_NUM_FORMAT_DECIMAL: &str = "0.0";
/// Number format for base values at or above one.
pub const C_NUM_FORMAT_INTEGER: &str = "0";

/// Build default format presets used by [`crate::writer::SurveyXlsxWriter`].
pub fn derive_default_survey_formats() -> SpecSurveyFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_size: Some(8),
        bold: Some(false),
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        border: Some(0),
        text_wrap: Some(true),
        ..Default::default()
    };

    SpecSurveyFormats {
        title: cfg_base_fmt_spec.with_(SpecCellFormat {
            font_size: Some(12),
            bold: Some(true),
            align: Some("left".to_string()),
            text_wrap: Some(false),
            ..Default::default()
        }),
        marker: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("left".to_string()),
            text_wrap: Some(false),
            ..Default::default()
        }),
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            valign: Some("bottom".to_string()),
            ..Default::default()
        }),
        base_label: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            text_wrap: Some(false),
            ..Default::default()
        }),
        index: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("left".to_string()),
            ..Default::default()
        }),
        body: cfg_base_fmt_spec,
    }
}
