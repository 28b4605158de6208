//! Merge & scrub: title promotion of shared label prefixes and the
//! repeated-question heuristic.

use tracing::debug;

use crate::report::ReportCrosstab;
use crate::spec::{QuestionFrame, SpecCrosstabBook, SpecCrosstabLayout};

/// Number of leading words shared by every label.
///
/// Words are compared position by position up to the shortest label. Returns
/// the position of the first disagreement, or 0 when the labels disagree at
/// the first word, never disagree, or fewer than two labels are given.
pub fn derive_common_leading_words<S: AsRef<str>>(labels: &[S]) -> usize {
    if labels.len() < 2 {
        return 0;
    }
    let l_words: Vec<Vec<&str>> = labels
        .iter()
        .map(|label| label.as_ref().split_whitespace().collect())
        .collect();
    let n_len_min = l_words.iter().map(Vec::len).min().unwrap_or(0);

    (0..n_len_min)
        .find(|n_idx| l_words.iter().any(|words| words[*n_idx] != l_words[0][*n_idx]))
        .unwrap_or(0)
}

/// Strip the shared leading words from the response labels of `frame`.
///
/// Returns the stripped words as the consolidated question title, or `None`
/// when nothing is shared. Two-level frames are left as they are.
pub fn scrub_common_prefix(frame: &mut QuestionFrame) -> Option<String> {
    if frame.is_multi_level() {
        return None;
    }
    let l_labels: Vec<&str> = frame.rows.iter().map(|row| row.key.response()).collect();
    let n_words = derive_common_leading_words(&l_labels);
    if n_words == 0 {
        return None;
    }

    let title = l_labels[0]
        .split_whitespace()
        .take(n_words)
        .collect::<Vec<_>>()
        .join(" ");
    for row in &mut frame.rows {
        let response = row
            .key
            .response()
            .split_whitespace()
            .skip(n_words)
            .collect::<Vec<_>>()
            .join(" ");
        row.key = row.key.with_response(response);
    }
    Some(title)
}

/// Final pass over a parsed book.
///
/// With scrubbing enabled, records whose labels share leading words are
/// retitled with those words. A promoted title equal to an existing question
/// is merged into that record instead of replacing it.
pub fn cleanup_crosstab_book(
    book: SpecCrosstabBook,
    layout: &SpecCrosstabLayout,
    report: &mut ReportCrosstab,
) -> SpecCrosstabBook {
    let mut book_clean = SpecCrosstabBook::new();
    for mut record in book.into_records() {
        let title_promoted = if layout.if_scrub_common_prefix {
            scrub_common_prefix(&mut record.frame)
        } else {
            None
        };
        if let Some(title) = title_promoted {
            debug!(from = %record.question, to = %title, "promoted common label prefix");
            record.question = title;
            report.cnt_scrubbed += 1;
        }

        let question = record.question.clone();
        if book_clean.merge_record(record) {
            report.cnt_merged += 1;
            report.warn(format!(
                "Question {question:?} appears twice after cleanup; frames were concatenated."
            ));
        }
    }
    book_clean
}

/// Positions of questions that repeat the question before them.
///
/// Each question is compared word by word, by position, with the one right
/// before it; it is rejected when the share of equal positions reaches
/// `threshold`. Questions without comparable words are never rejected. The
/// first question is always kept.
pub fn reject_similar_questions<S: AsRef<str>>(questions: &[S], threshold: f64) -> Vec<usize> {
    questions
        .windows(2)
        .enumerate()
        .filter_map(|(n_idx, pair)| {
            let l_words_prev: Vec<&str> = pair[0].as_ref().split_whitespace().collect();
            let l_words_curr: Vec<&str> = pair[1].as_ref().split_whitespace().collect();
            let n_compared = usize::min(l_words_prev.len(), l_words_curr.len());
            if n_compared == 0 {
                return None;
            }
            let n_equal = l_words_prev
                .iter()
                .zip(&l_words_curr)
                .filter(|(prev, curr)| prev == curr)
                .count();
            (n_equal as f64 / n_compared as f64 >= threshold).then_some(n_idx + 1)
        })
        .collect()
}
