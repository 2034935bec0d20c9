use std::sync::Arc;

use quiz_core::model::QuizRules;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::quiz_loader::QuizLoader;
use crate::quizzes::{QuizHistoryService, QuizLoopService};
use crate::sources::QuestionSource;
use crate::sources::remote::{GeneratorConfig, RemoteQuestionSource};

/// Quiz behavior chosen by the app at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizSettings {
    pub rules: QuizRules,
    pub shuffle_questions: bool,
}

impl QuizSettings {
    #[must_use]
    pub fn new(rules: QuizRules) -> Self {
        Self {
            rules,
            shuffle_questions: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    fn loader(self, source: Option<Arc<dyn QuestionSource>>, clock: Clock) -> QuizLoader {
        QuizLoader::new(source)
            .with_rules(self.rules)
            .with_clock(clock)
            .with_shuffle_questions(self.shuffle_questions)
    }
}

/// Assembles app-facing quiz services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    generator: Option<GeneratorConfig>,
    quiz_loop: Arc<QuizLoopService>,
    history: Arc<QuizHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the generator configured
    /// in the environment, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source = RemoteQuestionSource::from_env()?;
        Ok(Self::assemble(&storage, source, clock, settings))
    }

    /// Build services over in-memory storage, optionally with a question source.
    #[must_use]
    pub fn in_memory(
        source: Option<Arc<dyn QuestionSource>>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Self {
        let storage = Storage::in_memory();
        let loader = settings.loader(source, clock);
        Self::from_parts(&storage, None, loader, clock)
    }

    fn assemble(
        storage: &Storage,
        source: Option<RemoteQuestionSource>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Self {
        let generator = source.as_ref().map(|s| s.config().clone());
        match &generator {
            Some(config) => log::info!("quiz generator enabled at {}", config.webhook_url),
            None => log::info!("no quiz generator configured, using built-in questions"),
        }

        let source = source.map(|s| Arc::new(s) as Arc<dyn QuestionSource>);
        let loader = settings.loader(source, clock);
        Self::from_parts(storage, generator, loader, clock)
    }

    fn from_parts(
        storage: &Storage,
        generator: Option<GeneratorConfig>,
        loader: QuizLoader,
        clock: Clock,
    ) -> Self {
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            Arc::new(loader),
            Arc::clone(&storage.lesson_quizzes),
            Arc::clone(&storage.attempts),
        ));
        let history = Arc::new(QuizHistoryService::new(
            clock,
            Arc::clone(&storage.attempts),
        ));

        Self {
            generator,
            quiz_loop,
            history,
        }
    }

    /// Generator settings in use, or `None` when running on built-in questions.
    #[must_use]
    pub fn generator(&self) -> Option<&GeneratorConfig> {
        self.generator.as_ref()
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<QuizHistoryService> {
        Arc::clone(&self.history)
    }
}
