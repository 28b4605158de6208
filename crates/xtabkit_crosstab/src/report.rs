//! Crosstab run report: counters and non-fatal warnings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use tracing::warn;

/// Aggregate counters and diagnostics for one `split_excel` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCrosstab {
    /// Source sheets scanned.
    pub cnt_sheets: u64,
    /// Question blocks found across all sheets.
    pub cnt_blocks: u64,
    /// Question records in the final book.
    pub cnt_questions: u64,
    /// Blocks folded into an earlier record with the same question text.
    pub cnt_merged: u64,
    /// Records whose common label prefix was promoted to the title.
    pub cnt_scrubbed: u64,
    /// Markers dropped by the similarity check.
    pub cnt_rejected: u64,
    /// Non-fatal anomalies (missing rows, width mismatches, renamed sheets).
    pub warnings: Vec<String>,
    /// Written workbook, once saved.
    pub path_file_out: Option<PathBuf>,
}

impl ReportCrosstab {
    /// Record and log one warning.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{msg}");
        self.warnings.push(msg);
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_sheets".to_string(), self.cnt_sheets);
        dict_counts.insert("cnt_blocks".to_string(), self.cnt_blocks);
        dict_counts.insert("cnt_questions".to_string(), self.cnt_questions);
        dict_counts.insert("cnt_merged".to_string(), self.cnt_merged);
        dict_counts.insert("cnt_scrubbed".to_string(), self.cnt_scrubbed);
        dict_counts.insert("cnt_rejected".to_string(), self.cnt_rejected);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} sheets={} blocks={} questions={} merged={} scrubbed={} rejected={} warnings={}",
            dict_counts["cnt_sheets"],
            dict_counts["cnt_blocks"],
            dict_counts["cnt_questions"],
            dict_counts["cnt_merged"],
            dict_counts["cnt_scrubbed"],
            dict_counts["cnt_rejected"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportCrosstab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XTAB]"))
    }
}

#[cfg(test)]
mod tests {
    use super::ReportCrosstab;

    #[test]
    fn test_report_to_dict_and_format() {
        let mut report = ReportCrosstab {
            cnt_sheets: 2,
            cnt_blocks: 7,
            cnt_questions: 5,
            cnt_merged: 2,
            cnt_scrubbed: 1,
            ..Default::default()
        };
        report.warn("no Sample Size row in sheet \"Sheet2\"");

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_blocks"], 7);
        assert_eq!(dict_counts["cnt_rejected"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[XTAB]");
        assert_eq!(
            txt,
            "[XTAB] sheets=2 blocks=7 questions=5 merged=2 scrubbed=1 rejected=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
