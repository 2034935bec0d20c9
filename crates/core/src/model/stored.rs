use serde::{Deserialize, Serialize};

use crate::model::{AnswerResolution, Question, QuestionError};

/// Persisted shape of a lesson question: the correct answer is kept as text.
///
/// `answer_index` pins the answer when option texts repeat. It is only
/// trusted while it still points at an option equal to `answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl StoredQuestion {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question: question.prompt().to_owned(),
            options: question.options().to_vec(),
            answer: question.correct_option().to_owned(),
            answer_index: Some(question.correct_index()),
            explanation: question.explanation().map(str::to_owned),
        }
    }

    /// Resolve the textual answer into a validated `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the answer cannot be resolved or the question is invalid.
    pub fn resolve(&self, resolution: AnswerResolution) -> Result<Question, QuestionError> {
        let pinned = self
            .answer_index
            .filter(|&index| self.options.get(index) == Some(&self.answer));
        let question = match pinned {
            Some(index) => Question::new(self.question.clone(), self.options.clone(), index)?,
            None => Question::from_answer_text(
                self.question.clone(),
                self.options.clone(),
                &self.answer,
                resolution,
            )?,
        };
        Ok(match &self.explanation {
            Some(text) => question.with_explanation(text.clone()),
            None => question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_shape_round_trips_through_question() {
        let question = Question::new("Sky color?", vec!["Blue".into(), "Green".into()], 0)
            .unwrap()
            .with_explanation("Rayleigh scattering");
        let stored = StoredQuestion::from_question(&question);
        assert_eq!(stored.answer, "Blue");

        let back = stored.resolve(AnswerResolution::Strict).unwrap();
        assert_eq!(back, question);
    }

    #[test]
    fn repeated_option_text_keeps_the_saved_index() {
        let question = Question::new(
            "Is it true?",
            vec!["Yes".into(), "Yes".into(), "No".into()],
            1,
        )
        .unwrap();
        let stored = StoredQuestion::from_question(&question);
        assert_eq!(stored.answer_index, Some(1));

        let back = stored.resolve(AnswerResolution::Strict).unwrap();
        assert_eq!(back.correct_index(), 1);
    }

    #[test]
    fn stale_index_falls_back_to_answer_text() {
        let stored = StoredQuestion {
            question: "Pick b".into(),
            options: vec!["b".into(), "a".into()],
            answer: "b".into(),
            answer_index: Some(1),
            explanation: None,
        };
        let back = stored.resolve(AnswerResolution::Strict).unwrap();
        assert_eq!(back.correct_index(), 0);
    }

    #[test]
    fn deserializes_without_explanation() {
        let raw = r#"{"question":"1+1?","options":["1","2"],"answer":"2"}"#;
        let stored: StoredQuestion = serde_json::from_str(raw).unwrap();
        assert_eq!(stored.explanation, None);
        assert_eq!(
            stored.resolve(AnswerResolution::Strict).unwrap().correct_index(),
            1
        );
    }
}
