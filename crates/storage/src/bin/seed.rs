use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{LessonId, QuizAttempt, StoredQuestion, percentage};
use storage::repository::{LessonQuizRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    lesson_id: LessonId,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLessonId { raw: String },
    InvalidAttempts { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson-id value: {raw}"),
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut lesson_id = std::env::var("QUIZ_LESSON_ID")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok())
            .unwrap_or_else(|| LessonId::new(1));
        let mut attempts = std::env::var("QUIZ_SEED_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--lesson-id" => {
                    let value = require_value(&mut args, "--lesson-id")?;
                    lesson_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
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
            attempts,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --lesson-id <id>          Lesson to attach the sample quiz to (default: 1)");
    eprintln!("  --attempts <n>            Number of past attempts to append (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_LESSON_ID, QUIZ_SEED_ATTEMPTS");
}

fn sample_questions() -> Vec<StoredQuestion> {
    let samples: [(&str, [&str; 4], &str); 5] = [
        (
            "Which organelle produces most of a cell's energy?",
            ["Nucleus", "Mitochondrion", "Ribosome", "Golgi body"],
            "Mitochondrion",
        ),
        (
            "What carries genetic information in most organisms?",
            ["DNA", "ATP", "Glucose", "Chlorophyll"],
            "DNA",
        ),
        (
            "Which structure controls what enters and leaves a cell?",
            ["Cell wall", "Vacuole", "Cell membrane", "Cytoplasm"],
            "Cell membrane",
        ),
        (
            "Where does photosynthesis take place?",
            ["Chloroplast", "Lysosome", "Nucleolus", "Centriole"],
            "Chloroplast",
        ),
        (
            "What is the basic unit of life?",
            ["Atom", "Organ", "Tissue", "Cell"],
            "Cell",
        ),
    ];

    samples
        .into_iter()
        .map(|(question, options, answer)| StoredQuestion {
            question: question.to_owned(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            answer: answer.to_owned(),
            answer_index: None,
            explanation: None,
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let questions = sample_questions();
    let total = u32::try_from(questions.len())?;
    storage
        .lesson_quizzes
        .upsert_lesson_quiz(&LessonQuizRecord {
            lesson_id: args.lesson_id,
            questions,
            updated_at: now,
        })
        .await?;

    for i in 0..args.attempts {
        let days_ago = i64::from(i) * 2;
        let started_at = now - Duration::days(days_ago) - Duration::minutes(10);
        let completed_at = started_at + Duration::minutes(5);
        let correct = total.saturating_sub(i % (total + 1));

        let attempt = QuizAttempt::from_persisted(
            args.lesson_id,
            started_at,
            completed_at,
            correct,
            total,
            percentage(correct, total),
            false,
        )?;

        let _ = storage.attempts.append_attempt(&attempt).await?;
    }

    println!(
        "Seeded lesson {} with {} questions and {} attempts into {}",
        args.lesson_id, total, args.attempts, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
