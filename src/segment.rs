//! Segment keys and audio handles.
//!
//! A [`SegmentKey`] names one atomic recorded unit: a vowel, consonant or
//! syllable grapheme (possibly tone-marked), or one of the reserved
//! magnitude / grammar tokens below. Keys are opaque to everything except the
//! [`SegmentCatalog`](crate::catalog::SegmentCatalog) that maps them to clips.

use std::{
    borrow::{Borrow, Cow},
    fmt,
};

use serde::{Deserialize, Serialize};

/// Identifier of one atomic pronounceable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentKey(Cow<'static, str>);

impl SegmentKey {
    pub const fn from_static(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    pub fn new(s: impl Into<String>) -> Self {
        Self(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key for a single digit, zero or ten. `None` above ten.
    pub fn digit(n: u64) -> Option<SegmentKey> {
        DIGITS.get(n as usize).cloned()
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SegmentKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SegmentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets catalog maps keyed by `SegmentKey` be queried with plain `&str` slices.
impl Borrow<str> for SegmentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reserved magnitude / grammar tokens
// ─────────────────────────────────────────────────────────────────────────────

pub const ZERO: SegmentKey = SegmentKey::from_static("0");
pub const ONE: SegmentKey = SegmentKey::from_static("1");
pub const TWO: SegmentKey = SegmentKey::from_static("2");
pub const THREE: SegmentKey = SegmentKey::from_static("3");
pub const FOUR: SegmentKey = SegmentKey::from_static("4");
pub const FIVE: SegmentKey = SegmentKey::from_static("5");
pub const SIX: SegmentKey = SegmentKey::from_static("6");
pub const SEVEN: SegmentKey = SegmentKey::from_static("7");
pub const EIGHT: SegmentKey = SegmentKey::from_static("8");
pub const NINE: SegmentKey = SegmentKey::from_static("9");
pub const TEN: SegmentKey = SegmentKey::from_static("10");

/// Shared "multiple of ten" word, followed by the multiplying digit.
pub const TENS_MARKER: SegmentKey = SegmentKey::from_static("20-90");
pub const HUNDRED: SegmentKey = SegmentKey::from_static("100");
pub const THOUSAND: SegmentKey = SegmentKey::from_static("1000");
pub const MILLION: SegmentKey = SegmentKey::from_static("1000000");

/// Multiplier particle "KƐ".
pub const TIMES: SegmentKey = SegmentKey::from_static("KƐ");
/// Additive particle "NYÃ".
pub const AND: SegmentKey = SegmentKey::from_static("NYÃ");
/// Million-stacking particle "MĨ": `MILLION POINT MILLION` is 10^12.
pub const POINT: SegmentKey = SegmentKey::from_static("MĨ");
/// Linking vowel some speakers put between `TIMES` and `AND`.
pub const LINK_E: SegmentKey = SegmentKey::from_static("E");

/// Glue between a magnitude phrase and its additive remainder.
pub static JOIN: [SegmentKey; 2] = [TIMES, AND];
/// [`JOIN`] with the linking vowel.
pub static JOIN_LINKED: [SegmentKey; 3] = [TIMES, LINK_E, AND];

pub fn joiner(linking_vowel: bool) -> &'static [SegmentKey] {
    if linking_vowel {
        &JOIN_LINKED
    } else {
        &JOIN
    }
}

pub static DIGITS: [SegmentKey; 11] = [ZERO, ONE, TWO, THREE, FOUR, FIVE, SIX, SEVEN, EIGHT, NINE, TEN];

/// Every key the numeral decomposer can emit. A catalog missing any of these
/// cannot pronounce all numbers.
pub static RESERVED: [SegmentKey; 19] = [
    ZERO, ONE, TWO, THREE, FOUR, FIVE, SIX, SEVEN, EIGHT, NINE, TEN,
    TENS_MARKER, HUNDRED, THOUSAND, MILLION, TIMES, AND, POINT, LINK_E,
];

// ─────────────────────────────────────────────────────────────────────────────
// Audio handles
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque reference to a recorded clip: a file name relative to the audio
/// directory, e.g. `"KƐ.wav"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioHandle(String);

impl AudioHandle {
    pub fn new(file: impl Into<String>) -> Self {
        Self(file.into())
    }

    pub fn file_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_lookup() {
        assert_eq!(SegmentKey::digit(0), Some(ZERO));
        assert_eq!(SegmentKey::digit(7).unwrap().as_str(), "7");
        assert_eq!(SegmentKey::digit(10), Some(TEN));
        assert_eq!(SegmentKey::digit(11), None);
    }

    #[test]
    fn test_static_and_owned_keys_compare_equal() {
        assert_eq!(SegmentKey::new("KƐ"), TIMES);
        assert_eq!(SegmentKey::from("1000"), THOUSAND);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&vec![TIMES, AND]).unwrap();
        assert_eq!(json, r#"["KƐ","NYÃ"]"#);
        let back: Vec<SegmentKey> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![TIMES, AND]);
    }

    #[test]
    fn test_joiner_borrows_static_tables() {
        let plain: &'static [SegmentKey] = joiner(false);
        let linked: &'static [SegmentKey] = joiner(true);
        assert_eq!(plain, &[TIMES, AND]);
        assert_eq!(linked, &[TIMES, LINK_E, AND]);
        assert!(RESERVED.contains(&LINK_E));
    }
}
