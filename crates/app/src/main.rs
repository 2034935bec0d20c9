mod terminal;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use quiz_core::model::{LessonId, QuizRules};
use serde::Deserialize;
use services::{AppServices, Clock, QuizRequest, QuizSettings};

use crate::terminal::QuizExit;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidRules { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRules { raw } => {
                write!(f, "invalid --rules value (expected lesson|modal|trending): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_rules(raw: &str) -> Result<QuizRules, ArgsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lesson" => Ok(QuizRules::lesson()),
        "modal" => Ok(QuizRules::modal()),
        "trending" => Ok(QuizRules::trending()),
        _ => Err(ArgsError::InvalidRules {
            raw: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    lesson_id: LessonId,
    lesson_file: Option<PathBuf>,
    rules: QuizRules,
    shuffle: bool,
    regenerate: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut lesson_id = std::env::var("QUIZ_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok())
            .unwrap_or_else(|| LessonId::new(1));
        let mut lesson_file = None;
        let mut rules = QuizRules::default();
        let mut shuffle = std::env::var("QUIZ_SHUFFLE")
            .ok()
            .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
        let mut regenerate = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lesson-id" => {
                    let value = require_value(args, "--lesson-id")?;
                    lesson_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                }
                "--lesson-file" => {
                    lesson_file = Some(PathBuf::from(require_value(args, "--lesson-file")?));
                }
                "--rules" => {
                    rules = parse_rules(&require_value(args, "--rules")?)?;
                }
                "--shuffle" => shuffle = true,
                "--regenerate" => regenerate = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            lesson_id,
            lesson_file,
            rules,
            shuffle,
            regenerate,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>       SQLite URL (default: sqlite://quiz.sqlite3)");
    eprintln!("  --lesson-id <id>        Lesson to quiz on (default: 1)");
    eprintln!("  --lesson-file <path>    JSON lesson {{\"title\", \"content\"}} sent to the generator");
    eprintln!("  --rules <preset>        lesson | modal | trending (default: lesson)");
    eprintln!("  --shuffle               Shuffle question order");
    eprintln!("  --regenerate            Ignore the saved question set for the lesson");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_LESSON_ID, QUIZ_SHUFFLE");
    eprintln!("  QUIZ_WEBHOOK_URL, QUIZ_WEBHOOK_TIMEOUT_SECS, QUIZ_QUESTION_COUNT");
    eprintln!("  RUST_LOG (e.g. RUST_LOG=info)");
}

/// Lesson text handed to the question generator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonFile {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    question_count: Option<u32>,
}

fn read_lesson_file(path: &Path) -> Result<LessonFile, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn build_request(
    args: &Args,
    default_count: Option<u32>,
) -> Result<QuizRequest, Box<dyn std::error::Error>> {
    let mut request = match &args.lesson_file {
        Some(path) => {
            let lesson = read_lesson_file(path)?;
            let request = QuizRequest::new(args.lesson_id, lesson.title, lesson.content);
            match lesson.question_count {
                Some(count) => return Ok(request.with_question_count(count)),
                None => request,
            }
        }
        None => QuizRequest::new(args.lesson_id, format!("Lesson {}", args.lesson_id), ""),
    };
    if let Some(count) = default_count {
        request = request.with_question_count(count);
    }
    Ok(request)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite here so core/services stay free of filesystem concerns.
    prepare_sqlite_file(&args.db_url)?;
    let settings = QuizSettings::new(args.rules).with_shuffle_questions(args.shuffle);
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), settings).await?;
    let request = build_request(&args, services.generator().map(|g| g.question_count))?;

    let quiz_loop = services.quiz_loop();
    let history = services.history();
    let mut quiz = if args.regenerate {
        quiz_loop.start_generated_quiz(&request).await?
    } else {
        quiz_loop.start_quiz(&request).await?
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    loop {
        if terminal::drive(&mut quiz, &mut input, &mut out)? == QuizExit::Quit {
            log::info!("quiz for lesson {} abandoned", args.lesson_id);
            return Ok(());
        }

        let finished = quiz_loop.finish_quiz(&mut quiz).await?;
        let outcome = quiz_loop.outcome(&quiz)?;
        terminal::print_outcome(&mut out, &outcome, &finished)?;

        let recent = history.list_recent_attempts(args.lesson_id, 30, 5).await?;
        terminal::print_history(&mut out, &recent)?;

        if !terminal::confirm(&mut input, &mut out, "Retake? [y/N] ")? {
            return Ok(());
        }
        quiz = quiz_loop.retake_quiz(&quiz)?;
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
