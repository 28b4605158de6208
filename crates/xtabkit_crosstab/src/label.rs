//! Question label parsing: `{prefix, question, statement}` from raw marker text.

use std::sync::LazyLock;

use regex::Regex;

use crate::conf::C_LABEL_SEPARATOR;
use crate::spec::SpecQuestionLabel;

/// Outline delimiter: one ASCII letter, a period and a tab (`A.\t`).
static RE_OUTLINE_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]\.\t").expect("valid outline delimiter regex"));

/// Split raw question text into prefix, question and optional statement.
///
/// With an outline delimiter, everything up to and including its period is
/// the prefix and the remainder is split on `": "`; without one the whole
/// text is split and the first component is the prefix. The statement is the
/// rest after the question component, and is `None` when there are fewer
/// than three components. Never fails: text with a single component becomes
/// the question with an empty prefix.
pub fn parse_question_label(text: &str) -> SpecQuestionLabel {
    let (prefix, l_components) = match RE_OUTLINE_DELIMITER.find(text) {
        Some(m) => {
            // The delimiter's period closes the prefix; the tab is dropped.
            let prefix = text[..m.end() - 1].trim().to_string();
            let rest = RE_OUTLINE_DELIMITER.replace_all(&text[m.end()..], C_LABEL_SEPARATOR);
            (Some(prefix), split_components(&rest))
        }
        None => (None, split_components(text)),
    };

    let (prefix, l_components) = match prefix {
        Some(prefix) => (prefix, l_components),
        None if l_components.len() < 2 => (String::new(), l_components),
        None => (l_components[0].clone(), l_components[1..].to_vec()),
    };

    let question = l_components.first().cloned().unwrap_or_default();
    // Statements may contain ": " themselves; later components stay in the statement.
    let statement = (l_components.len() > 1)
        .then(|| l_components[1..].join(C_LABEL_SEPARATOR))
        .filter(|statement| !statement.is_empty());

    SpecQuestionLabel {
        prefix,
        question,
        statement,
    }
}

fn split_components(text: &str) -> Vec<String> {
    text.split(C_LABEL_SEPARATOR)
        .map(|component| component.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_prefix_with_statement() {
        let label = parse_question_label("A.\tQuestion: Statement");
        assert_eq!(label.prefix, "A.");
        assert_eq!(label.question, "Question");
        assert_eq!(label.statement.as_deref(), Some("Statement"));
    }

    #[test]
    fn test_outline_prefix_without_statement() {
        let label = parse_question_label("A.\tHow satisfied are you overall?");
        assert_eq!(label.prefix, "A.");
        assert_eq!(label.question, "How satisfied are you overall?");
        assert_eq!(label.statement, None);
    }

    #[test]
    fn test_outline_prefix_keeps_leading_code() {
        let label = parse_question_label("Q12b.\tRate each brand: Brand X");
        assert_eq!(label.prefix, "Q12b.");
        assert_eq!(label.question, "Rate each brand");
        assert_eq!(label.statement.as_deref(), Some("Brand X"));
    }

    #[test]
    fn test_colon_only_label() {
        let label = parse_question_label("Q5: Which age group: 18-24");
        assert_eq!(label.prefix, "Q5");
        assert_eq!(label.question, "Which age group");
        assert_eq!(label.statement.as_deref(), Some("18-24"));

        let label = parse_question_label("Q5: Which age group");
        assert_eq!(label.prefix, "Q5");
        assert_eq!(label.question, "Which age group");
        assert_eq!(label.statement, None);
    }

    #[test]
    fn test_statement_keeps_later_separators() {
        let label = parse_question_label("A.\tAgree?: Service: fast and friendly");
        assert_eq!(label.question, "Agree?");
        assert_eq!(label.statement.as_deref(), Some("Service: fast and friendly"));
    }

    #[test]
    fn test_single_component_is_permissive() {
        let label = parse_question_label("Overall rating");
        assert_eq!(label.prefix, "");
        assert_eq!(label.question, "Overall rating");
        assert_eq!(label.statement, None);

        let label = parse_question_label("A.\tQuestion: ");
        assert_eq!(label.statement, None);
    }
}
