use crate::model::{Question, ScoreResult};

/// Per-question review line shown after a quiz is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview<'a> {
    pub index: usize,
    pub question: &'a Question,
    pub was_correct: bool,
    pub selected_option: Option<&'a str>,
    pub correct_option: &'a str,
}

/// Score plus review lines for a completed quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome<'a> {
    pub score: ScoreResult,
    pub reviews: Vec<QuestionReview<'a>>,
}

impl<'a> QuizOutcome<'a> {
    /// Review lines for questions answered incorrectly or left unanswered.
    pub fn mistakes(&self) -> impl Iterator<Item = &QuestionReview<'a>> {
        self.reviews.iter().filter(|r| !r.was_correct)
    }
}

/// Pair each question with the recorded answer.
#[must_use]
pub fn review_answers<'a>(
    questions: &'a [Question],
    answers: &[Option<usize>],
) -> Vec<QuestionReview<'a>> {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.get(index).copied().flatten();
            QuestionReview {
                index,
                question,
                was_correct: selected.is_some_and(|s| question.is_correct(s)),
                selected_option: selected.and_then(|s| question.option(s)),
                correct_option: question.correct_option(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::compute_score;

    fn build() -> Vec<Question> {
        vec![
            Question::new("Largest planet?", vec!["Mars".into(), "Jupiter".into()], 1).unwrap(),
            Question::new("H2O is?", vec!["Water".into(), "Salt".into()], 0).unwrap(),
            Question::new("2 * 3?", vec!["5".into(), "6".into()], 1).unwrap(),
        ]
    }

    #[test]
    fn review_reports_selection_and_correct_text() {
        let questions = build();
        let answers = [Some(1), Some(1), None];
        let reviews = review_answers(&questions, &answers);

        assert_eq!(reviews.len(), 3);
        assert!(reviews[0].was_correct);
        assert_eq!(reviews[0].selected_option, Some("Jupiter"));

        assert!(!reviews[1].was_correct);
        assert_eq!(reviews[1].selected_option, Some("Salt"));
        assert_eq!(reviews[1].correct_option, "Water");

        assert!(!reviews[2].was_correct);
        assert_eq!(reviews[2].selected_option, None);
        assert_eq!(reviews[2].correct_option, "6");
    }

    #[test]
    fn mistakes_skip_correct_lines() {
        let questions = build();
        let answers = [Some(1), Some(1), None];
        let outcome = QuizOutcome {
            score: compute_score(&questions, &answers),
            reviews: review_answers(&questions, &answers),
        };

        let mistakes: Vec<usize> = outcome.mistakes().map(|r| r.index).collect();
        assert_eq!(mistakes, vec![1, 2]);
        assert_eq!(outcome.score.correct_count, 1);
    }
}
