use std::io::{self, BufRead, Write};

use quiz_core::model::{Advance, QuizOutcome, Retreat};
use services::{ActiveQuiz, FinishedQuiz, QuizAttemptListItem};

/// One line of user input while a question is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Zero-based option index.
    Select(usize),
    Next,
    Previous,
    Quit,
}

/// Options are typed 1-based; `0` and anything unrecognized yield `None`.
pub fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(Input::Next),
        "p" | "prev" | "b" | "back" => Some(Input::Previous),
        "q" | "quit" => Some(Input::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(Input::Select),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizExit {
    Completed,
    Quit,
}

/// Run the question loop until the quiz completes, the user quits, or input ends.
///
/// Rejected actions (out-of-range option, locked answer, disabled retreat)
/// are reported and the same question is shown again.
pub fn drive<R: BufRead, W: Write>(
    quiz: &mut ActiveQuiz,
    input: &mut R,
    out: &mut W,
) -> io::Result<QuizExit> {
    if let Some(notice) = quiz.notice() {
        writeln!(
            out,
            "Quiz generator unavailable ({}). Using built-in questions.",
            notice.reason
        )?;
    }
    let dropped = quiz.dropped_questions().len();
    if dropped > 0 {
        writeln!(
            out,
            "Skipped {dropped} saved question(s) whose answer matches no option."
        )?;
    }

    let mut line = String::new();
    loop {
        let session = quiz.session();
        let Some(question) = session.current_question() else {
            return Ok(QuizExit::Completed);
        };
        let index = session.current_index();
        let selected = session.answer(index);

        writeln!(out)?;
        writeln!(
            out,
            "Question {}/{}: {}",
            index + 1,
            session.total_questions(),
            question.prompt()
        )?;
        for (i, option) in question.options().iter().enumerate() {
            let marker = if selected == Some(i) { '*' } else { ' ' };
            writeln!(out, " {marker} {}. {option}", i + 1)?;
        }
        if session.is_locked(index) {
            writeln!(out, "(answer locked)")?;
        }
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(QuizExit::Quit);
        }

        let Some(command) = parse_input(&line) else {
            writeln!(
                out,
                "Enter an option number, n (next), p (previous) or q (quit)."
            )?;
            continue;
        };

        let session = quiz.session_mut();
        match command {
            Input::Select(option) => {
                if let Err(err) = session.answer_current(option) {
                    writeln!(out, "{err}")?;
                }
            }
            Input::Next => match session.advance() {
                Ok(Advance::GuardNotSatisfied) => writeln!(out, "Pick an answer first.")?,
                Ok(Advance::Moved { .. }) => {}
                Ok(Advance::Completed) => return Ok(QuizExit::Completed),
                Err(err) => writeln!(out, "{err}")?,
            },
            Input::Previous => match session.retreat() {
                Ok(Retreat::AtFirstQuestion) => writeln!(out, "Already at the first question.")?,
                Ok(Retreat::Moved { .. }) => {}
                Err(err) => writeln!(out, "{err}")?,
            },
            Input::Quit => return Ok(QuizExit::Quit),
        }
    }
}

pub fn print_outcome<W: Write>(
    out: &mut W,
    outcome: &QuizOutcome<'_>,
    finished: &FinishedQuiz,
) -> io::Result<()> {
    let score = &outcome.score;
    writeln!(out)?;
    writeln!(
        out,
        "Score: {}/{} ({}%) - {}",
        score.correct_count, score.total_count, score.percentage, score.tier
    )?;
    if finished.attempt.degraded() {
        writeln!(out, "(practice set: built-in questions)")?;
    }

    for review in outcome.mistakes() {
        writeln!(out, "  Q{}: {}", review.index + 1, review.question.prompt())?;
        writeln!(
            out,
            "    your answer: {}",
            review.selected_option.unwrap_or("-")
        )?;
        writeln!(out, "    correct: {}", review.correct_option)?;
        if let Some(explanation) = review.question.explanation() {
            writeln!(out, "    {explanation}")?;
        }
    }
    Ok(())
}

pub fn print_history<W: Write>(out: &mut W, items: &[QuizAttemptListItem]) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let scores: Vec<String> = items
        .iter()
        .map(|item| format!("{}%", item.percentage))
        .collect();
    writeln!(out, "Recent attempts: {}", scores.join(", "))
}

/// Ask a yes/no question. Only `y`/`yes` count as yes; end of input is no.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
