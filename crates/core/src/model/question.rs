use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct option {index} is out of range for {count} options")]
    CorrectIndexOutOfRange { index: usize, count: usize },

    #[error("answer {answer:?} does not match any option")]
    UnresolvedAnswer { answer: String },
}

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

//
// ─── ANSWER RESOLUTION ─────────────────────────────────────────────────────────
//

/// How a textual answer is mapped onto an option index.
///
/// Stored lessons carry the correct answer as text. `Strict` rejects answers
/// that match no option exactly; `FirstOptionFallback` keeps the legacy
/// behavior of pointing at the first option instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerResolution {
    #[default]
    Strict,
    FirstOptionFallback,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question with exactly one correct option.
///
/// Construction validates the option count and the correct index, so every
/// `Question` in a session satisfies `correct_index < options.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// Build a question whose correct option is already known by index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt,
    /// `QuestionError::TooFewOptions` for fewer than two options, and
    /// `QuestionError::CorrectIndexOutOfRange` when the index does not point at an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                count: options.len(),
            });
        }

        Ok(Self {
            prompt,
            options,
            correct_index,
            explanation: None,
        })
    }

    /// Build a question whose correct option is given as text.
    ///
    /// The answer is matched against the options by exact string equality.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::UnresolvedAnswer` under `AnswerResolution::Strict`
    /// when no option matches, plus the validation errors of [`Question::new`].
    pub fn from_answer_text(
        prompt: impl Into<String>,
        options: Vec<String>,
        answer: &str,
        resolution: AnswerResolution,
    ) -> Result<Self, QuestionError> {
        let correct_index = match options.iter().position(|option| option == answer) {
            Some(index) => index,
            None => match resolution {
                AnswerResolution::Strict => {
                    return Err(QuestionError::UnresolvedAnswer {
                        answer: answer.to_owned(),
                    });
                }
                AnswerResolution::FirstOptionFallback => 0,
            },
        };

        Self::new(prompt, options, correct_index)
    }

    /// Attach an explanation shown after answering. Blank text clears it.
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        self.explanation = if explanation.trim().is_empty() {
            None
        } else {
            Some(explanation)
        };
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn new_question_validates_correct_index() {
        let q = Question::new("2 + 2?", opts(&["3", "4"]), 1).unwrap();
        assert_eq!(q.correct_option(), "4");
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));

        let err = Question::new("2 + 2?", opts(&["3", "4"]), 2).unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 2, count: 2 }
        );
    }

    #[test]
    fn rejects_single_option_and_blank_prompt() {
        let err = Question::new("Only one?", opts(&["yes"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::TooFewOptions { count: 1 });

        let err = Question::new("   ", opts(&["a", "b"]), 0).unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn answer_text_resolves_by_exact_match() {
        let q = Question::from_answer_text(
            "Capital of France?",
            opts(&["Berlin", "Paris", "Rome"]),
            "Paris",
            AnswerResolution::Strict,
        )
        .unwrap();
        assert_eq!(q.correct_index(), 1);
    }

    #[test]
    fn strict_resolution_rejects_unknown_answer() {
        let err = Question::from_answer_text(
            "Capital of France?",
            opts(&["Berlin", "Paris"]),
            "paris",
            AnswerResolution::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::UnresolvedAnswer { .. }));
    }

    #[test]
    fn fallback_resolution_points_at_first_option() {
        let q = Question::from_answer_text(
            "Capital of France?",
            opts(&["Berlin", "Paris"]),
            "Lyon",
            AnswerResolution::FirstOptionFallback,
        )
        .unwrap();
        assert_eq!(q.correct_index(), 0);
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = Question::new("Q", opts(&["a", "b"]), 0)
            .unwrap()
            .with_explanation("  ");
        assert_eq!(q.explanation(), None);

        let q = q.with_explanation("because");
        assert_eq!(q.explanation(), Some("because"));
    }
}
