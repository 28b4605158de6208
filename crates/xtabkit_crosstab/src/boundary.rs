//! Question boundary detection from first-column fill colors.

use xtabkit_io_xlsx::SpecSheetGrid;

use crate::spec::{SpecCrosstabLayout, SpecQuestionBlock};

/// Rows whose first cell carries one of the layout's marker fills, ascending.
pub fn derive_question_marker_rows(grid: &SpecSheetGrid, layout: &SpecCrosstabLayout) -> Vec<usize> {
    (0..grid.height())
        .filter(|n_idx_row| {
            grid.fill_argb(*n_idx_row, 0)
                .is_some_and(|c_argb| layout.is_marker_color(c_argb))
        })
        .collect()
}

/// Turn sorted marker rows into contiguous, non-overlapping blocks.
///
/// Block `i` spans `[marker_i, marker_{i+1})`; the last one ends at `height`.
/// Bodies never start before `idx_row_data_first`, so header rows above the
/// data region stay out of every block body.
pub fn plan_question_blocks(
    marker_rows: &[usize],
    height: usize,
    idx_row_data_first: usize,
) -> Vec<SpecQuestionBlock> {
    marker_rows
        .iter()
        .enumerate()
        .map(|(n_idx, &n_idx_row_marker)| {
            let n_idx_row_end = marker_rows
                .get(n_idx + 1)
                .copied()
                .unwrap_or(height)
                .max(n_idx_row_marker + 1);
            SpecQuestionBlock {
                idx_row_marker: n_idx_row_marker,
                idx_row_body_start: usize::max(n_idx_row_marker + 1, idx_row_data_first),
                idx_row_end_exclusive: n_idx_row_end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use xtabkit_io_xlsx::{EnumCellValue, SpecGridCell};

    use super::*;

    fn grid_with_fills(l_fills: &[Option<&str>]) -> SpecSheetGrid {
        let mut grid = SpecSheetGrid::new("Sheet1");
        grid.rows = l_fills
            .iter()
            .map(|fill| {
                vec![SpecGridCell {
                    value: EnumCellValue::String("x".to_string()),
                    fill_argb: fill.map(str::to_string),
                }]
            })
            .collect();
        grid
    }

    #[test]
    fn test_markers_are_matched_case_insensitively() {
        let grid = grid_with_fills(&[
            None,
            Some("FFFBE4E4"),
            Some("FFC0C0C0"),
            Some("ffeeedec"),
            None,
        ]);
        let rows = derive_question_marker_rows(&grid, &SpecCrosstabLayout::default());
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_n_markers_give_n_contiguous_blocks() {
        let blocks = plan_question_blocks(&[8, 12, 20], 25, 7);
        assert_eq!(blocks.len(), 3);

        assert_eq!(blocks[0].rows(), 8..12);
        assert_eq!(blocks[1].rows(), 12..20);
        assert_eq!(blocks[2].rows(), 20..25);
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].idx_row_end_exclusive, pair[1].idx_row_marker);
        }
        assert_eq!(blocks[0].body(), 9..12);
    }

    #[test]
    fn test_body_never_starts_in_header_rows() {
        let blocks = plan_question_blocks(&[2, 10], 14, 7);
        assert_eq!(blocks[0].body(), 7..10);
        assert_eq!(blocks[1].body(), 11..14);
    }

    #[test]
    fn test_trailing_marker_yields_empty_body() {
        let blocks = plan_question_blocks(&[9], 10, 7);
        assert_eq!(blocks[0].rows(), 9..10);
        assert!(blocks[0].body().is_empty());

        assert!(plan_question_blocks(&[], 10, 7).is_empty());
    }
}
