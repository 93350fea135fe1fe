use quiz_core::model::QuestionDraft;
use serde::Deserialize;

use super::GeneratedQuestions;
use crate::error::GenerationError;

#[derive(Debug, Deserialize)]
struct Payload {
    questions: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    question: String,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Strip a Markdown code fence (with or without a language tag).
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a generator reply of the form
/// `{"questions":[{"question","correct_answer","options":[4]}]}`.
///
/// Invalid items are dropped with a warning; surplus items beyond
/// `requested` are discarded.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` when the reply is not that JSON
/// shape and `GenerationError::NoQuestions` when no item survives.
pub fn parse_questions(raw: &str, requested: usize) -> Result<GeneratedQuestions, GenerationError> {
    let payload: Payload = serde_json::from_str(unfence(raw))?;

    let mut questions = Vec::with_capacity(requested.min(payload.questions.len()));
    for (index, item) in payload.questions.into_iter().enumerate() {
        let mut draft = QuestionDraft::new(item.question, item.correct_answer, item.options);
        if let Some(explanation) = item.explanation {
            draft = draft.with_explanation(explanation);
        }
        match draft.check() {
            Ok(()) => questions.push(draft),
            Err(err) => log::warn!("dropping generated question {index}: {err}"),
        }
    }

    if questions.len() > requested {
        log::debug!(
            "generator returned {} questions, keeping {requested}",
            questions.len()
        );
        questions.truncate(requested);
    }
    if questions.is_empty() {
        return Err(GenerationError::NoQuestions);
    }

    Ok(GeneratedQuestions {
        questions,
        requested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(q: &str, answer: &str) -> String {
        format!(
            r#"{{"question":"{q}","correct_answer":"{answer}","options":["A","B","C","D"]}}"#
        )
    }

    #[test]
    fn parses_plain_json() {
        let raw = format!(r#"{{"questions":[{},{}]}}"#, item("Q1", "A"), item("Q2", "C"));
        let parsed = parse_questions(&raw, 2).unwrap();
        assert_eq!(parsed.questions.len(), 2);
        assert_eq!(parsed.questions[1].correct_answer, "C");
        assert!(!parsed.is_short());
    }

    #[test]
    fn strips_code_fences() {
        let raw = format!("```json\n{{\"questions\":[{}]}}\n```", item("Q1", "B"));
        let parsed = parse_questions(&raw, 1).unwrap();
        assert_eq!(parsed.questions[0].prompt, "Q1");

        let bare = format!("```\n{{\"questions\":[{}]}}\n```", item("Q1", "B"));
        assert!(parse_questions(&bare, 1).is_ok());
    }

    #[test]
    fn drops_invalid_items_and_reports_short() {
        let raw = format!(
            r#"{{"questions":[{},{},{{"question":"Q3","correct_answer":"A","options":["A","B"]}}]}}"#,
            item("Q1", "A"),
            item("Q2", "Z"),
        );
        let parsed = parse_questions(&raw, 3).unwrap();
        assert_eq!(parsed.questions.len(), 1);
        assert!(parsed.is_short());
    }

    #[test]
    fn truncates_to_requested() {
        let raw = format!(
            r#"{{"questions":[{},{},{}]}}"#,
            item("Q1", "A"),
            item("Q2", "B"),
            item("Q3", "C")
        );
        let parsed = parse_questions(&raw, 2).unwrap();
        let prompts: Vec<_> = parsed.questions.iter().map(|q| q.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["Q1", "Q2"]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_questions("Here are your questions!", 5).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let err = parse_questions(r#"{"questions":[]}"#, 5).unwrap_err();
        assert!(matches!(err, GenerationError::NoQuestions));
    }
}
