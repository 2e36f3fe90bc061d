use std::sync::OnceLock;

use common::error::AppError;
use regex::Regex;

use super::GeneratedQa;

/// Turns raw model output into question/answer pairs.
pub trait QaResponseParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Vec<GeneratedQa>, AppError>;
}

/// Parses the `Q1: ... A1: ...` convention requested by the QA prompt.
///
/// Each `Q<n>:` marker opens a segment that runs to the next `Q<n>:` marker.
/// Inside a segment the first `A<n>:` separates question from answer. Pairs
/// with an empty question or answer are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerQaParser;

static QUESTION_MARKER: OnceLock<Result<Regex, String>> = OnceLock::new();
static ANSWER_MARKER: OnceLock<Result<Regex, String>> = OnceLock::new();

fn marker(
    cell: &'static OnceLock<Result<Regex, String>>,
    pattern: &str,
) -> Result<&'static Regex, AppError> {
    match cell.get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string())) {
        Ok(regex) => Ok(regex),
        Err(err) => Err(AppError::InternalError(format!(
            "failed to compile QA marker pattern: {err}"
        ))),
    }
}

impl QaResponseParser for MarkerQaParser {
    fn parse(&self, raw: &str) -> Result<Vec<GeneratedQa>, AppError> {
        let question_marker = marker(&QUESTION_MARKER, r"Q\d+:")?;
        let answer_marker = marker(&ANSWER_MARKER, r"A\d+:")?;

        // Models sometimes echo escaped newlines verbatim.
        let text = raw.replace("\\n", "");

        let markers: Vec<_> = question_marker.find_iter(&text).collect();
        let mut pairs = Vec::new();

        for (idx, current) in markers.iter().enumerate() {
            let end = markers
                .get(idx.saturating_add(1))
                .map_or(text.len(), regex::Match::start);
            let Some(segment) = text.get(current.end()..end) else {
                continue;
            };
            let Some(answer_at) = answer_marker.find(segment) else {
                continue;
            };

            let question = segment.get(..answer_at.start()).unwrap_or_default().trim();
            let answer = segment.get(answer_at.end()..).unwrap_or_default().trim();
            if question.is_empty() || answer.is_empty() {
                continue;
            }

            pairs.push(GeneratedQa {
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }

        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Vec<(String, String)> {
        MarkerQaParser
            .parse(raw)
            .expect("parse")
            .into_iter()
            .map(|qa| (qa.question, qa.answer))
            .collect()
    }

    #[test]
    fn extracts_numbered_pairs() {
        let pairs = parse("Q1: What is Rust?\nA1: A systems language.\nQ2: Who maintains it?\nA2: The Rust project.");
        assert_eq!(
            pairs,
            vec![
                ("What is Rust?".to_string(), "A systems language.".to_string()),
                ("Who maintains it?".to_string(), "The Rust project.".to_string()),
            ]
        );
    }

    #[test]
    fn drops_pair_with_empty_answer() {
        let pairs = parse("Q1: First?\nA1: Yes.\nQ2: Second?\nA2:");
        assert_eq!(pairs, vec![("First?".to_string(), "Yes.".to_string())]);
    }

    #[test]
    fn drops_question_without_answer_marker() {
        let pairs = parse("Q1: Dangling question\nQ2: Real?\nA2: Real answer.");
        assert_eq!(pairs, vec![("Real?".to_string(), "Real answer.".to_string())]);
    }

    #[test]
    fn answers_may_contain_capital_q_and_span_lines() {
        let pairs = parse("Q1: Which queue?\nA1: The Queue service.\nIt retries.\nQ2: Done?\nA2: Quite.");
        assert_eq!(
            pairs,
            vec![
                (
                    "Which queue?".to_string(),
                    "The Queue service.\nIt retries.".to_string()
                ),
                ("Done?".to_string(), "Quite.".to_string()),
            ]
        );
    }

    #[test]
    fn escaped_newlines_are_removed() {
        let pairs = parse(r"Q1: Escaped?\nA1: Removed.\n");
        assert_eq!(pairs, vec![("Escaped?".to_string(), "Removed.".to_string())]);
    }

    #[test]
    fn free_text_yields_nothing() {
        assert!(parse("I cannot help with that.").is_empty());
        assert!(parse("").is_empty());
    }
}
