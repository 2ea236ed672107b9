//! Pure scoring of typed input against a target phrase.
//!
//! Nothing here keeps state; the controller passes in everything a calculation needs
//! and stores the results.

use std::time::Duration;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
    Pending,
}

/// Result of scoring one input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: u32,
    pub words: usize,
    /// `None` while no time has elapsed yet
    pub wpm: Option<u32>,
}

pub fn evaluate(phrase: &str, input: &str, elapsed_secs: u64) -> Evaluation {
    let typed = input.chars().count();
    let correct = correct_chars(phrase, input);
    let words = word_count(input);

    Evaluation {
        correct,
        incorrect: typed - correct,
        accuracy: accuracy(correct, typed),
        words,
        wpm: cumulative_wpm(words, elapsed_secs),
    }
}

/// Positions where the input matches the phrase, over the overlapping prefix only
pub fn correct_chars(phrase: &str, input: &str) -> usize {
    phrase
        .chars()
        .zip(input.chars())
        .filter(|(expected, typed)| expected == typed)
        .count()
}

/// Rounded percentage of correct characters. An empty input scores 100.
pub fn accuracy(correct: usize, typed: usize) -> u32 {
    if typed == 0 {
        return 100;
    }
    (100.0 * correct as f64 / typed as f64).round() as u32
}

/// Whitespace separated tokens after trimming.
///
/// Blank input still counts as one word, the same as splitting an empty string.
pub fn word_count(input: &str) -> usize {
    input.split_whitespace().count().max(1)
}

/// Words per minute since the session started
pub fn cumulative_wpm(words: usize, elapsed_secs: u64) -> Option<u32> {
    if elapsed_secs == 0 {
        return None;
    }
    let minutes = elapsed_secs as f64 / 60.0;
    Some((words as f64 / minutes).round() as u32)
}

/// Words per minute measured over the gap since the previous input event
pub fn instant_wpm(words: usize, since_last: Duration) -> Option<u32> {
    if since_last.is_zero() {
        return None;
    }
    let minutes = since_last.as_secs_f64() / 60.0;
    Some((words as f64 / minutes).round() as u32)
}

/// Per phrase character outcome, used to colour the prompt
pub fn char_outcomes(phrase: &str, input: &str) -> Vec<Outcome> {
    let mut typed = input.chars();
    phrase
        .chars()
        .map(|expected| match typed.next() {
            Some(c) if c == expected => Outcome::Correct,
            Some(_) => Outcome::Incorrect,
            None => Outcome::Pending,
        })
        .collect()
}
