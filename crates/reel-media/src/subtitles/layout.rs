//! Caption timing and line layout.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use reel_models::{SubtitleCue, WordTiming};

use super::style::{RunStyle, ScriptHeader};

/// Default line budget for karaoke captions, in characters.
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 25;

/// A piece of text drawn in one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

/// One timed subtitle event. Runs are drawn in order, separated by a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    pub start: f64,
    pub end: f64,
    pub runs: Vec<StyledRun>,
}

impl ScriptEvent {
    /// Plain text of the event without styling.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|run| run.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Declarative subtitle script: header plus events in start order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleScript {
    pub header: ScriptHeader,
    pub events: Vec<ScriptEvent>,
}

impl SubtitleScript {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Split narration on any whitespace.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Divide `duration` evenly across the words of `text`, starting at `start`.
///
/// Boundaries are computed from the word index rather than accumulated, so
/// the last word always ends at exactly `start + duration`.
pub fn uniform_word_timings(text: &str, start: f64, duration: f64) -> Vec<WordTiming> {
    let words = split_words(text);
    let n = words.len();
    if n == 0 {
        return Vec::new();
    }

    let boundary = |i: usize| {
        if i == n {
            start + duration
        } else {
            start + duration * i as f64 / n as f64
        }
    };

    words
        .into_iter()
        .enumerate()
        .map(|(i, word)| WordTiming::new(word, boundary(i), boundary(i + 1)))
        .collect()
}

/// Greedily pack words into lines of at most `max_chars` characters,
/// counting one separator between neighbouring words.
///
/// Words are never split; a word longer than the budget gets a line of its
/// own. Returns index ranges into `words`.
pub fn pack_lines<S: AsRef<str>>(words: &[S], max_chars: usize) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut letters = 0;

    for (i, word) in words.iter().enumerate() {
        let len = word.as_ref().chars().count();
        let words_on_line = i - line_start;
        // Adding this word costs its letters plus one separator per word already on the line.
        if words_on_line > 0 && letters + len + words_on_line > max_chars {
            lines.push(line_start..i);
            line_start = i;
            letters = 0;
        }
        letters += len;
    }

    if line_start < words.len() {
        lines.push(line_start..words.len());
    }
    lines
}

/// Word-by-word highlight layout.
#[derive(Debug, Clone, PartialEq)]
pub struct KaraokeLayout {
    pub max_chars_per_line: usize,
    pub active: RunStyle,
    pub passive: RunStyle,
}

impl Default for KaraokeLayout {
    fn default() -> Self {
        Self {
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
            active: RunStyle::highlight(),
            passive: RunStyle::plain(),
        }
    }
}

impl KaraokeLayout {
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars_per_line = max_chars.max(1);
        self
    }

    /// One event per word: the word's whole line, with only that word highlighted.
    pub fn events(&self, timings: &[WordTiming]) -> Vec<ScriptEvent> {
        let words: Vec<&str> = timings.iter().map(|t| t.word.as_str()).collect();
        let mut events = Vec::with_capacity(timings.len());

        for line in pack_lines(&words, self.max_chars_per_line) {
            for active in line.clone() {
                let runs = line
                    .clone()
                    .map(|i| StyledRun {
                        text: words[i].to_string(),
                        style: if i == active { self.active } else { self.passive },
                    })
                    .collect();
                events.push(ScriptEvent {
                    start: timings[active].start,
                    end: timings[active].end,
                    runs,
                });
            }
        }

        events
    }

    /// Script for narration spoken uniformly over `duration` seconds.
    pub fn script(&self, header: ScriptHeader, text: &str, duration: f64) -> SubtitleScript {
        self.script_from_timings(header, &uniform_word_timings(text, 0.0, duration))
    }

    /// Script for narration with known word timestamps.
    pub fn script_from_timings(&self, header: ScriptHeader, timings: &[WordTiming]) -> SubtitleScript {
        SubtitleScript {
            header,
            events: self.events(timings),
        }
    }
}

/// Fixed captions: every cue becomes one independently timed event.
pub fn caption_script(header: ScriptHeader, cues: &[SubtitleCue], style: RunStyle) -> SubtitleScript {
    let events = cues
        .iter()
        .filter(|cue| !cue.text.trim().is_empty())
        .map(|cue| ScriptEvent {
            start: cue.start,
            end: cue.end,
            runs: vec![StyledRun {
                text: cue.text.trim().to_string(),
                style,
            }],
        })
        .collect();

    SubtitleScript { header, events }
}
