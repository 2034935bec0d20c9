use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    Advance, LessonId, Question, QuizPhase, QuizRules, ScoreTier, StoredQuestion,
};
use quiz_core::time::fixed_now;
use services::{
    ActiveQuiz, Clock, QuestionSource, QuizLoader, QuizLoopService, QuizOrigin, QuizRequest,
    QuizServiceError, SourceError,
};
use storage::repository::{
    InMemoryRepository, LessonQuizRecord, LessonQuizRepository, QuizAttemptRepository,
};

struct StaticSource(Vec<Question>);

#[async_trait]
impl QuestionSource for StaticSource {
    async fn fetch_questions(&self, _: &QuizRequest) -> Result<Vec<Question>, SourceError> {
        Ok(self.0.clone())
    }
}

struct DownSource;

#[async_trait]
impl QuestionSource for DownSource {
    async fn fetch_questions(&self, _: &QuizRequest) -> Result<Vec<Question>, SourceError> {
        Err(SourceError::Disabled)
    }
}

fn generated() -> Vec<Question> {
    vec![
        Question::new("2 + 2?", vec!["3".into(), "4".into()], 1).unwrap(),
        Question::new("Capital of France?", vec!["Paris".into(), "Rome".into()], 0).unwrap(),
        Question::new("Largest planet?", vec!["Mars".into(), "Jupiter".into()], 1).unwrap(),
    ]
}

fn service(repo: &InMemoryRepository, source: Arc<dyn QuestionSource>) -> QuizLoopService {
    let clock = Clock::fixed(fixed_now());
    let loader = QuizLoader::new(Some(source))
        .with_rules(QuizRules::lesson())
        .with_clock(clock);
    QuizLoopService::new(
        clock,
        Arc::new(loader),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

fn answer_all(quiz: &mut ActiveQuiz, picks: &[usize]) {
    for &pick in picks {
        let session = quiz.session_mut();
        session.answer_current(pick).unwrap();
        let _ = session.advance().unwrap();
    }
}

#[tokio::test]
async fn generated_quiz_is_saved_and_attempt_persisted() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, Arc::new(StaticSource(generated())));
    let request = QuizRequest::new(LessonId::new(1), "Mixed", "General knowledge");

    let mut quiz = svc.start_quiz(&request).await.unwrap();
    assert_eq!(quiz.origin(), QuizOrigin::Generated);
    assert_eq!(quiz.session().phase(), QuizPhase::InProgress);

    let saved = repo.get_lesson_quiz(LessonId::new(1)).await.unwrap().unwrap();
    assert_eq!(saved.questions.len(), 3);
    assert_eq!(saved.questions[0].answer, "4");

    answer_all(&mut quiz, &[1, 0, 0]);
    assert!(quiz.session().is_complete());

    let finished = svc.finish_quiz(&mut quiz).await.unwrap();
    assert_eq!(finished.score.correct_count, 2);
    assert_eq!(finished.score.percentage, 67);
    assert_eq!(finished.score.tier, ScoreTier::Good);
    assert!(!finished.attempt.degraded());

    let again = svc.finish_quiz(&mut quiz).await.unwrap();
    assert_eq!(again.attempt_id, finished.attempt_id);
    let rows = repo.list_attempts(LessonId::new(1), 10).await.unwrap();
    assert_eq!(rows.len(), 1);

    let outcome = svc.outcome(&quiz).unwrap();
    let mistakes: Vec<_> = outcome.mistakes().map(|r| r.index).collect();
    assert_eq!(mistakes, vec![2]);
}

#[tokio::test]
async fn saved_quiz_is_preferred_over_generator() {
    let repo = InMemoryRepository::new();
    repo.upsert_lesson_quiz(&LessonQuizRecord {
        lesson_id: LessonId::new(2),
        questions: vec![
            StoredQuestion {
                question: "Saved one".into(),
                options: vec!["x".into(), "y".into()],
                answer: "y".into(),
                answer_index: None,
                explanation: None,
            },
            StoredQuestion {
                question: "Broken".into(),
                options: vec!["x".into(), "y".into()],
                answer: "nope".into(),
                answer_index: None,
                explanation: None,
            },
        ],
        updated_at: fixed_now(),
    })
    .await
    .unwrap();

    let svc = service(&repo, Arc::new(StaticSource(generated())));
    let quiz = svc
        .start_quiz(&QuizRequest::new(LessonId::new(2), "Saved", ""))
        .await
        .unwrap();

    assert_eq!(quiz.origin(), QuizOrigin::Stored);
    assert_eq!(quiz.session().total_questions(), 1);
    assert_eq!(quiz.session().questions()[0].correct_index(), 1);

    let dropped = quiz.dropped_questions();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].position, 1);
    assert_eq!(svc.retake_quiz(&quiz).unwrap().dropped_questions().len(), 1);
}

#[tokio::test]
async fn saved_generated_quiz_keeps_answer_among_repeated_options() {
    let repo = InMemoryRepository::new();
    let question = Question::new(
        "Is water wet?",
        vec!["Yes".into(), "Yes".into(), "No".into()],
        1,
    )
    .unwrap();
    let svc = service(&repo, Arc::new(StaticSource(vec![question])));
    let request = QuizRequest::new(LessonId::new(5), "Repeats", "");

    let first = svc.start_quiz(&request).await.unwrap();
    assert_eq!(first.origin(), QuizOrigin::Generated);
    assert_eq!(first.session().questions()[0].correct_index(), 1);

    let second = svc.start_quiz(&request).await.unwrap();
    assert_eq!(second.origin(), QuizOrigin::Stored);
    assert_eq!(second.session().questions()[0].correct_index(), 1);
    assert!(second.dropped_questions().is_empty());
}

#[tokio::test]
async fn failing_generator_runs_degraded_and_marks_attempt() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, Arc::new(DownSource));
    let request = QuizRequest::new(LessonId::new(3), "Offline", "");

    let mut quiz = svc.start_quiz(&request).await.unwrap();
    assert!(quiz.is_degraded());
    assert!(quiz.notice().is_some());
    assert!(repo.get_lesson_quiz(LessonId::new(3)).await.unwrap().is_none());

    let picks: Vec<usize> = quiz
        .session()
        .questions()
        .iter()
        .map(Question::correct_index)
        .collect();
    answer_all(&mut quiz, &picks);

    let finished = svc.finish_quiz(&mut quiz).await.unwrap();
    assert_eq!(finished.score.percentage, 100);
    assert!(finished.attempt.degraded());
}

#[tokio::test]
async fn unfinished_quiz_cannot_be_persisted_and_retake_resets_answers() {
    let repo = InMemoryRepository::new();
    let svc = service(&repo, Arc::new(StaticSource(generated())));
    let mut quiz = svc
        .start_quiz(&QuizRequest::new(LessonId::new(4), "Retake", ""))
        .await
        .unwrap();

    assert_eq!(quiz.session_mut().advance().unwrap(), Advance::GuardNotSatisfied);
    quiz.session_mut().answer_current(0).unwrap();

    let err = svc.finish_quiz(&mut quiz).await.unwrap_err();
    assert!(matches!(err, QuizServiceError::Quiz(_)));

    let retaken = svc.retake_quiz(&quiz).unwrap();
    assert_eq!(retaken.session().phase(), QuizPhase::InProgress);
    assert_eq!(retaken.session().answered_count(), 0);
    assert_eq!(retaken.origin(), QuizOrigin::Generated);
    assert!(retaken.attempt_id().is_none());
}
