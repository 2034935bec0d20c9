use quiz_core::model::Question;

/// Built-in question set used when no generator is reachable.
#[must_use]
pub fn default_questions() -> Vec<Question> {
    let raw: [(&str, [&str; 4], usize, &str); 5] = [
        (
            "What is the best first step when starting a new lesson?",
            [
                "Skim the summary and headings",
                "Memorize every detail immediately",
                "Skip straight to the quiz",
                "Read only the last paragraph",
            ],
            0,
            "A quick skim builds a map of the material before the details.",
        ),
        (
            "Which study technique improves long-term retention the most?",
            [
                "Re-reading notes",
                "Highlighting",
                "Spaced retrieval practice",
                "Cramming the night before",
            ],
            2,
            "Recalling information at spaced intervals strengthens memory.",
        ),
        (
            "What should you do after answering a question incorrectly?",
            [
                "Ignore it",
                "Review the explanation and retry later",
                "Restart the whole course",
                "Change the answer key",
            ],
            1,
            "Mistakes are most useful when reviewed and revisited.",
        ),
        (
            "How long is a productive focused study block for most people?",
            ["5 minutes", "6 hours", "25 to 50 minutes", "No breaks at all"],
            2,
            "Short focused blocks with breaks keep attention high.",
        ),
        (
            "Which habit helps you connect new ideas to what you know?",
            [
                "Explaining the idea in your own words",
                "Copying the text verbatim",
                "Studying with the TV on",
                "Avoiding examples",
            ],
            0,
            "Putting ideas into your own words links them to existing knowledge.",
        ),
    ];

    raw.into_iter()
        .filter_map(|(prompt, options, correct, explanation)| {
            let options = options.iter().map(|o| (*o).to_owned()).collect();
            Question::new(prompt, options, correct)
                .ok()
                .map(|q| q.with_explanation(explanation))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_complete_and_valid() {
        let questions = default_questions();
        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| q.option_count() == 4));
        assert!(questions.iter().all(|q| q.explanation().is_some()));
    }
}
