//! Stateless helper utilities used by the XLSX reader and writer kernels.

use std::collections::BTreeMap;

use crate::conf::{
    C_NUM_FORMAT_DECIMAL, C_NUM_FORMAT_INTEGER, C_NUM_FORMAT_PERCENT, N_LEN_EXCEL_SHEET_NAME_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, XlsxIoError};

////////////////////////////////////////////////////////////////////////////////
// #region NumberFormats

/// Select the number format of one numeric cell.
///
/// Shares (values below one) render as percentages; everything else renders
/// with one decimal, or as an integer on the base row.
pub fn select_number_format(value: f64, if_is_base_row: bool) -> &'static str {
    if value < 1.0 {
        C_NUM_FORMAT_PERCENT
    } else if if_is_base_row {
        C_NUM_FORMAT_INTEGER
    } else {
        C_NUM_FORMAT_DECIMAL
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

pub(crate) fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value).map_err(|_| XlsxIoError::IndexOverflow { axis: "row", value })
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value).map_err(|_| XlsxIoError::IndexOverflow {
        axis: "column",
        value,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderMergeUtils

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
}

/// Plan horizontal merges for repeated non-empty text within one header row.
///
/// Columns before `col_idx_first` are never merged. With `parent_row`, a run
/// also stops where the parent text changes, so a lower header level only
/// merges under one parent cell.
pub fn plan_horizontal_merges(
    header_row: &[EnumCellValue],
    parent_row: Option<&[EnumCellValue]>,
    col_idx_first: usize,
) -> Vec<SpecSheetHorizontalMerge> {
    let l_texts: Vec<String> = header_row.iter().map(EnumCellValue::to_text).collect();
    let l_parents: Vec<String> = (0..l_texts.len())
        .map(|n_idx| {
            parent_row
                .and_then(|row| row.get(n_idx))
                .map(EnumCellValue::to_text)
                .unwrap_or_default()
        })
        .collect();
    let n_cols = l_texts.len();

    let mut l_merges = Vec::new();
    let mut n_col_idx = col_idx_first;
    while n_col_idx < n_cols {
        let c_cell_val = &l_texts[n_col_idx];
        if c_cell_val.is_empty() {
            n_col_idx += 1;
            continue;
        }

        let mut n_col_idx_end = n_col_idx + 1;
        while n_col_idx_end < n_cols
            && l_texts[n_col_idx_end] == *c_cell_val
            && l_parents[n_col_idx_end] == l_parents[n_col_idx]
        {
            n_col_idx_end += 1;
        }

        if n_col_idx_end - n_col_idx > 1 {
            l_merges.push(SpecSheetHorizontalMerge {
                col_idx_start: n_col_idx,
                col_idx_end: n_col_idx_end - 1,
                text: c_cell_val.clone(),
            });
        }
        n_col_idx = n_col_idx_end;
    }

    l_merges
}

/// Build lookup of cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(merges: &[SpecSheetHorizontalMerge]) -> Vec<usize> {
    merges
        .iter()
        .flat_map(|merge| (merge.col_idx_start + 1)..=merge.col_idx_end)
        .collect()
}

/// Generate contiguous vertical runs `(row_start, row_end, text)` of one column.
///
/// Only non-empty runs longer than one row are returned; row indices are
/// relative to `column`.
pub fn generate_vertical_runs(column: &[String]) -> Vec<(usize, usize, String)> {
    let mut v_run_collection = Vec::new();
    let n_rows = column.len();

    let mut n_row_idx_start = 0;
    while n_row_idx_start < n_rows {
        let c_val_cell_current = &column[n_row_idx_start];
        if c_val_cell_current.is_empty() {
            n_row_idx_start += 1;
            continue;
        }

        let mut n_row_idx_next = n_row_idx_start + 1;
        while n_row_idx_next < n_rows && column[n_row_idx_next] == *c_val_cell_current {
            n_row_idx_next += 1;
        }

        if n_row_idx_next - n_row_idx_start > 1 {
            v_run_collection.push((
                n_row_idx_start,
                n_row_idx_next - 1,
                c_val_cell_current.clone(),
            ));
        }

        n_row_idx_start = n_row_idx_next;
    }

    v_run_collection
}

/// Map each row covered by a vertical run to its run anchor row.
pub fn derive_vertical_merge_tracker(
    runs: &[(usize, usize, String)],
) -> BTreeMap<usize, usize> {
    let mut dict_row_to_anchor = BTreeMap::new();
    for (row_start, row_end, _) in runs {
        for row_idx in (row_start + 1)..=*row_end {
            dict_row_to_anchor.insert(row_idx, *row_start);
        }
    }
    dict_row_to_anchor
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_generate_vertical_runs_detects_only_contiguous_non_empty_runs() {
        let column = texts(&["A", "A", "A", "", "B", "B", "C"]);

        assert_eq!(
            generate_vertical_runs(&column),
            vec![(0, 2, "A".to_string()), (4, 5, "B".to_string())]
        );
    }

    #[test]
    fn test_derive_vertical_merge_tracker_skips_anchor_rows() {
        let runs = vec![(0, 2, "A".to_string()), (4, 5, "B".to_string())];
        let dict_tracker = derive_vertical_merge_tracker(&runs);

        assert_eq!(dict_tracker.get(&0), None);
        assert_eq!(dict_tracker.get(&1), Some(&0));
        assert_eq!(dict_tracker.get(&2), Some(&0));
        assert_eq!(dict_tracker.get(&4), None);
        assert_eq!(dict_tracker.get(&5), Some(&4));
    }

    #[test]
    fn test_plan_horizontal_merges_respects_first_column() {
        let row = vec![
            EnumCellValue::String("Gender".to_string()),
            EnumCellValue::String("Gender".to_string()),
            EnumCellValue::String("Gender".to_string()),
            EnumCellValue::String("Age".to_string()),
            EnumCellValue::None,
            EnumCellValue::String("Age".to_string()),
            EnumCellValue::String("Age".to_string()),
        ];

        let l_merges = plan_horizontal_merges(&row, None, 1);
        assert_eq!(
            l_merges,
            vec![
                SpecSheetHorizontalMerge {
                    col_idx_start: 1,
                    col_idx_end: 2,
                    text: "Gender".to_string(),
                },
                SpecSheetHorizontalMerge {
                    col_idx_start: 5,
                    col_idx_end: 6,
                    text: "Age".to_string(),
                },
            ]
        );
        assert_eq!(derive_horizontal_merge_tracker(&l_merges), vec![2, 6]);
    }

    #[test]
    fn test_plan_horizontal_merges_stops_at_parent_boundary() {
        let text = |value: &str| EnumCellValue::String(value.to_string());
        let row_parent = vec![
            EnumCellValue::None,
            text("Region"),
            text("Gender"),
            text("Gender"),
        ];
        let row_header = vec![EnumCellValue::None, text("Total"), text("Total"), text("Total")];

        let l_merges = plan_horizontal_merges(&row_header, Some(&row_parent), 1);
        assert_eq!(
            l_merges,
            vec![SpecSheetHorizontalMerge {
                col_idx_start: 2,
                col_idx_end: 3,
                text: "Total".to_string(),
            }]
        );
    }

    #[test]
    fn test_select_number_format_splits_shares_from_values() {
        assert_eq!(select_number_format(0.42, false), "0%");
        assert_eq!(select_number_format(0.42, true), "0%");
        assert_eq!(select_number_format(3.5, false), "0.0");
        assert_eq!(select_number_format(120.0, true), "0");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Q1: Age/Gender", "_"), "Q1_ Age_Gender");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }
}
