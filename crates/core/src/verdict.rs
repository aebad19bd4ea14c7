//! Extraction of the machine-readable lines the grading and judging prompts ask for.
//!
//! Both parsers are total: text without a recognisable marker yields the `Unknown`
//! sentinel instead of an error, so a sloppy model reply never blocks progress.

use crate::session::{Rating, Verdict};
use regex::Regex;
use std::sync::LazyLock;

static VERDICT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[^\n]*\bverdict\b[^:\n]*:(?P<label>[^\n]*)$").unwrap());

static RATING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)final\s+rating\W*?:?\W*?(?P<score>\d{1,3})\s*/\s*10\b").unwrap()
});

/// Reads the last `Verdict: ...` line of an evaluation.
pub fn parse_verdict(evaluation: &str) -> Verdict {
    let Some(caps) = VERDICT_LINE.captures_iter(evaluation).last() else {
        return Verdict::Unknown;
    };
    let label: String = caps["label"]
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    match label.as_str() {
        "correct" => Verdict::Correct,
        "partially correct" | "partially" | "partial" => Verdict::PartiallyCorrect,
        "incorrect" | "wrong" => Verdict::Incorrect,
        _ => Verdict::Unknown,
    }
}

/// Reads the last `Final Rating: X/10` marker of a judgment.
pub fn parse_rating(judgment: &str) -> Rating {
    RATING_LINE
        .captures_iter(judgment)
        .last()
        .and_then(|caps| caps["score"].parse::<u8>().ok())
        .filter(|score| *score <= 10)
        .map(Rating::Score)
        .unwrap_or(Rating::Unknown)
}
