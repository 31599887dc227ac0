//! Word and mixed-input tokenizers.
//!
//! [`tokenize_word`] segments orthographic text into catalog keys by greedy
//! longest match. [`process`] splits a whole input line into maximal digit and
//! non-digit runs, sends digit runs through the numeral decomposer and word
//! runs through [`tokenize_word`], and concatenates the results in order.
//!
//! Characters that start no catalog key are skipped one at a time and
//! reported as [`UnmatchedSpan`]s next to the keys; whether an incomplete word
//! is acceptable is the caller's decision. Whitespace is skipped silently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::{
    catalog::SegmentCatalog,
    error::Result,
    numeral::NumeralDecomposer,
    segment::SegmentKey,
};

/// Maximal runs of ASCII digits or of anything else. `\d` would also accept
/// non-ASCII digits, which the decomposer cannot parse.
static RE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+|[^0-9]+").unwrap());

/// A stretch of input with no catalog match. Offsets are byte offsets into
/// the text that was tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Keys plus the diagnostics collected while producing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tokenized {
    pub keys: Vec<SegmentKey>,
    pub unmatched: Vec<UnmatchedSpan>,
}

impl Tokenized {
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }

    fn skip(&mut self, text: &str, start: usize, end: usize) {
        match self.unmatched.last_mut() {
            Some(span) if span.end == start => {
                span.end = end;
                span.text.push_str(&text[start..end]);
            }
            _ => self.unmatched.push(UnmatchedSpan { start, end, text: text[start..end].to_string() }),
        }
    }

    fn append(&mut self, other: Tokenized, offset: usize) {
        self.keys.extend(other.keys);
        self.unmatched.extend(other.unmatched.into_iter().map(|s| UnmatchedSpan {
            start: s.start + offset,
            end: s.end + offset,
            text: s.text,
        }));
    }
}

/// One maximal run of the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Split `line` into `(byte offset, run)` pairs. Every character of the
/// input lands in exactly one run.
pub fn split_runs(line: &str) -> Vec<(usize, Run<'_>)> {
    RE_RUNS
        .find_iter(line)
        .map(|m| {
            let s = m.as_str();
            let run = if s.as_bytes()[0].is_ascii_digit() { Run::Digits(s) } else { Run::Text(s) };
            (m.start(), run)
        })
        .collect()
}

/// Greedy longest-match segmentation of `word` into catalog keys.
pub fn tokenize_word(word: &str, catalog: &SegmentCatalog) -> Tokenized {
    // Byte offset of every char boundary, including the end.
    let bounds: Vec<usize> = word.char_indices().map(|(i, _)| i).chain(std::iter::once(word.len())).collect();
    let n_chars = bounds.len() - 1;
    let window = catalog.max_key_chars().max(1);

    let mut out = Tokenized::default();
    let mut i = 0;
    while i < n_chars {
        let longest = window.min(n_chars - i);
        let matched = (1..=longest).rev().find(|&len| catalog.contains_str(&word[bounds[i]..bounds[i + len]]));

        match matched {
            Some(len) => {
                out.keys.push(SegmentKey::new(&word[bounds[i]..bounds[i + len]]));
                i += len;
            }
            None => {
                let (start, end) = (bounds[i], bounds[i + 1]);
                if !word[start..end].chars().all(char::is_whitespace) {
                    debug!(text = &word[start..end], offset = start, "no segment matches, skipping");
                    out.skip(word, start, end);
                }
                i += 1;
            }
        }
    }
    out
}

/// Tokenize a mixed line: digit runs are decomposed, word runs are segmented.
///
/// Fails only on numeral errors (a digit run at or beyond the ceiling);
/// unmatched word characters are diagnostics, not errors.
pub fn process(line: &str, catalog: &SegmentCatalog, numerals: &NumeralDecomposer<'_>) -> Result<Tokenized> {
    let mut out = Tokenized::default();
    for (offset, run) in split_runs(line) {
        match run {
            Run::Digits(digits) => out.keys.extend(numerals.decompose_digits(digits)?),
            Run::Text(text) => out.append(tokenize_word(text, catalog), offset),
        }
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        exceptions::ExceptionTable,
        numeral::{decompose, DecomposerOptions},
    };

    fn keys(t: &Tokenized) -> Vec<&str> {
        t.keys.iter().map(SegmentKey::as_str).collect()
    }

    #[test]
    fn test_split_runs_keeps_every_char() {
        let runs = split_runs("ba23 kpɔ́ 1001!");
        assert_eq!(
            runs,
            vec![
                (0, Run::Text("ba")),
                (2, Run::Digits("23")),
                (4, Run::Text(" kpɔ́ ")),
                (12, Run::Digits("1001")),
                (16, Run::Text("!")),
            ]
        );
        let rebuilt: String = runs
            .iter()
            .map(|(_, r)| match r {
                Run::Digits(s) | Run::Text(s) => *s,
            })
            .collect();
        assert_eq!(rebuilt, "ba23 kpɔ́ 1001!");
    }

    #[test]
    fn test_split_runs_non_ascii_digits_are_text() {
        assert_eq!(split_runs("٣"), vec![(0, Run::Text("٣"))]);
    }

    #[test]
    fn test_longest_match_wins() {
        let cat = SegmentCatalog::dangme();
        assert_eq!(keys(&tokenize_word("kpla", &cat)), vec!["kpla"]);
        assert_eq!(keys(&tokenize_word("ngmlɛ̃", &cat)), vec!["ngmlɛ̃"]);
        assert_eq!(keys(&tokenize_word("dãngme", &cat)), vec!["dã", "ngme"]);
    }

    #[test]
    fn test_whitespace_is_skipped_silently() {
        let cat = SegmentCatalog::dangme();
        let t = tokenize_word("mo hee", &cat);
        assert_eq!(keys(&t), vec!["mo", "he", "e"]);
        assert!(t.is_complete());
    }

    #[test]
    fn test_unmatched_chars_coalesce() {
        let cat = SegmentCatalog::dangme();
        let t = tokenize_word("baqxba", &cat);
        assert_eq!(keys(&t), vec!["ba", "ba"]);
        assert_eq!(t.unmatched, vec![UnmatchedSpan { start: 2, end: 4, text: "qx".into() }]);
    }

    #[test]
    fn test_process_mixed_input() {
        let cat = SegmentCatalog::dangme();
        let table = ExceptionTable::dangme(false);
        let numerals = NumeralDecomposer::new(&table, DecomposerOptions::default());

        let out = process("ba23", &cat, &numerals).unwrap();
        let mut expected = tokenize_word("ba", &cat).keys;
        expected.extend(decompose(23).unwrap());
        assert_eq!(out.keys, expected);
    }

    #[test]
    fn test_process_offsets_are_line_relative() {
        let cat = SegmentCatalog::dangme();
        let table = ExceptionTable::empty();
        let numerals = NumeralDecomposer::new(&table, DecomposerOptions::default());

        let out = process("12 ba?", &cat, &numerals).unwrap();
        assert_eq!(out.unmatched, vec![UnmatchedSpan { start: 5, end: 6, text: "?".into() }]);
    }

    #[test]
    fn test_process_rejects_huge_numbers() {
        let cat = SegmentCatalog::dangme();
        let table = ExceptionTable::empty();
        let numerals = NumeralDecomposer::new(&table, DecomposerOptions { ceiling: 1_000, linking_vowel: false });

        let err = process("ba 1000", &cat, &numerals).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMagnitude { .. }));
    }
}
