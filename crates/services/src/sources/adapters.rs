//! Mapping from loosely-typed external shapes to validated `Question`s.
//!
//! Validation happens once here, so sessions and scoring can rely on the
//! `Question` invariants.

use quiz_core::model::{AnswerResolution, Question, QuestionError, StoredQuestion};
use serde::Deserialize;

use crate::error::SourceError;

/// Question as produced by the content generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// The generator answers either with a bare list or with `{"questions": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GeneratedPayload {
    List(Vec<GeneratedQuestion>),
    Wrapped { questions: Vec<GeneratedQuestion> },
}

impl GeneratedPayload {
    #[must_use]
    pub fn into_questions(self) -> Vec<GeneratedQuestion> {
        match self {
            GeneratedPayload::List(questions) | GeneratedPayload::Wrapped { questions } => {
                questions
            }
        }
    }
}

/// Validate a generated set. Any invalid entry rejects the whole set.
///
/// # Errors
///
/// Returns `SourceError::EmptyQuestionSet` for an empty list and
/// `SourceError::InvalidQuestion` for the first entry that fails validation.
pub fn from_generated(items: Vec<GeneratedQuestion>) -> Result<Vec<Question>, SourceError> {
    if items.is_empty() {
        return Err(SourceError::EmptyQuestionSet);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let question = Question::new(item.question, item.options, item.correct_answer)
                .map_err(|source| SourceError::InvalidQuestion { position, source })?;
            Ok(match item.explanation {
                Some(text) => question.with_explanation(text),
                None => question,
            })
        })
        .collect()
}

/// A stored question that could not be turned into a `Question`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub position: usize,
    pub error: QuestionError,
}

/// Result of resolving a stored set: usable questions plus what was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredImport {
    pub questions: Vec<Question>,
    pub failures: Vec<ResolutionFailure>,
}

/// Resolve a stored set. Entries that fail are excluded and reported.
#[must_use]
pub fn from_stored(items: &[StoredQuestion], resolution: AnswerResolution) -> StoredImport {
    let mut import = StoredImport::default();
    for (position, item) in items.iter().enumerate() {
        match item.resolve(resolution) {
            Ok(question) => import.questions.push(question),
            Err(error) => {
                log::warn!("dropping stored question {position}: {error}");
                import.failures.push(ResolutionFailure { position, error });
            }
        }
    }
    import
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_wrapped_payloads() {
        let bare = r#"[{"id":1,"question":"Q","options":["a","b"],"correctAnswer":1}]"#;
        let wrapped = r#"{"questions":[{"id":"q-1","question":"Q","options":["a","b"],"correctAnswer":1}]}"#;

        let bare: GeneratedPayload = serde_json::from_str(bare).unwrap();
        let wrapped: GeneratedPayload = serde_json::from_str(wrapped).unwrap();

        let bare = from_generated(bare.into_questions()).unwrap();
        let wrapped = from_generated(wrapped.into_questions()).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].correct_option(), "b");
    }

    #[test]
    fn generated_set_with_bad_index_is_rejected() {
        let items = vec![
            GeneratedQuestion {
                id: None,
                question: "ok".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 0,
                explanation: Some("why".into()),
            },
            GeneratedQuestion {
                id: None,
                question: "broken".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 5,
                explanation: None,
            },
        ];

        let err = from_generated(items).unwrap_err();
        assert!(matches!(err, SourceError::InvalidQuestion { position: 1, .. }));
    }

    #[test]
    fn empty_generated_set_is_rejected() {
        let err = from_generated(Vec::new()).unwrap_err();
        assert!(matches!(err, SourceError::EmptyQuestionSet));
    }

    fn stored(answer: &str) -> StoredQuestion {
        StoredQuestion {
            question: "Pick b".into(),
            options: vec!["a".into(), "b".into()],
            answer: answer.into(),
            answer_index: None,
            explanation: None,
        }
    }

    #[test]
    fn strict_import_excludes_unresolved_answers() {
        let import = from_stored(&[stored("b"), stored("z")], AnswerResolution::Strict);
        assert_eq!(import.questions.len(), 1);
        assert_eq!(import.questions[0].correct_index(), 1);
        assert_eq!(import.failures.len(), 1);
        assert_eq!(import.failures[0].position, 1);
    }

    #[test]
    fn fallback_import_keeps_unresolved_answers_at_first_option() {
        let import = from_stored(
            &[stored("b"), stored("z")],
            AnswerResolution::FirstOptionFallback,
        );
        assert!(import.failures.is_empty());
        assert_eq!(import.questions[1].correct_index(), 0);
    }
}
