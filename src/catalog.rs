//! Segment catalog — maps [`SegmentKey`]s to recorded clips.
//!
//! The catalog is built once at start-up and only ever read afterwards. The
//! built-in Dãngme catalog is generated from the orthography:
//!
//! | Keys                               | Clip                      |
//! |------------------------------------|---------------------------|
//! | vowel, low (grave) tone vowel      | shared clip, e.g. `A.wav` |
//! | high (acute) / nasal (tilde) vowel | distinct clips            |
//! | bare consonant                     | `B.wav`, `D.wav`, …       |
//! | onset + any vowel form             | `KPLA.wav`, `NGMLɛ̃.wav`, … |
//! | numerals and grammar particles     | `<key>.wav`               |
//! | currency sign `₵`                  | `SÍDI.wav`                |
//!
//! Clip names uppercase the onset and the vowel, except that ɛ and ɔ after
//! an onset stay lowercase (`Bɛ.wav`, `KPLɔ́.wav`); on their own they are
//! `Ɛ.wav` and `Ɔ.wav`. A handful of syllables were recorded under other
//! names and are listed in `RECORDED_AS`.
//!
//! Grave and plain vowels sharing a clip while acute and tilde forms stay
//! distinct is entirely a property of this key set; the tokenizer knows
//! nothing about tone marks.

use std::{collections::HashMap, path::Path};

use tracing::info;

use crate::{
    error::{Error, Result},
    segment::{AudioHandle, SegmentKey, RESERVED},
};

// ─────────────────────────────────────────────────────────────────────────────
// Dãngme orthography
// ─────────────────────────────────────────────────────────────────────────────

/// Each vowel as `[plain, grave, acute, tilde]`. ɛ and ɔ have no precomposed
/// tone-marked code points, so their marks are combining characters.
const VOWELS: &[[&str; 4]] = &[
    ["a", "à", "á", "ã"],
    ["e", "è", "é", "ẽ"],
    ["\u{025B}", "\u{025B}\u{0300}", "\u{025B}\u{0301}", "\u{025B}\u{0303}"],
    ["i", "ì", "í", "ĩ"],
    ["o", "ò", "ó", "õ"],
    ["\u{0254}", "\u{0254}\u{0300}", "\u{0254}\u{0301}", "\u{0254}\u{0303}"],
    ["u", "ù", "ú", "ũ"],
];

const CONSONANTS: &[&str] = &[
    "b", "d", "f", "g", "h", "j", "k", "l", "m", "n", "p", "s", "t", "v", "w", "y", "z",
];

/// Consonant clusters that only occur before a vowel.
const CLUSTERS: &[&str] = &[
    "gb", "gbl", "kp", "kpl", "ng", "ngl", "ngm", "ngml", "ny", "nyl", "ts", "tsl",
];

/// Keys whose recordings break the naming rule.
const RECORDED_AS: &[(&str, &str)] = &[
    ("n\u{025B}", "N\u{0190}.wav"),
    ("n\u{025B}\u{0300}", "N\u{0190}.wav"),
    ("n\u{025B}\u{0301}", "N\u{0190}\u{0301}.wav"),
    ("n\u{025B}\u{0303}", "N\u{0190}\u{0303}.wav"),
    ("w\u{025B}\u{0303}", "W\u{0190}\u{0303}.wav"),
    ("sú", "SU.wav"),
    ("tú", "TU.wav"),
    ("vú", "VU.wav"),
    ("wú", "WU.wav"),
    ("₵", "SÍDI.wav"),
];

fn is_open_vowel(s: &str) -> bool {
    s.starts_with(['\u{025B}', '\u{0254}'])
}

fn clip_for(onset: &str, vowel: &str) -> AudioHandle {
    let onset = onset.to_ascii_uppercase();
    if !onset.is_empty() && is_open_vowel(vowel) {
        AudioHandle::new(format!("{onset}{vowel}.wav"))
    } else {
        AudioHandle::new(format!("{onset}{}.wav", vowel.to_uppercase()))
    }
}

/// `(key, clip)` pairs for one onset ("" for a bare vowel) across every vowel
/// and tone mark.
fn syllables(onset: &str) -> impl Iterator<Item = (SegmentKey, AudioHandle)> + '_ {
    VOWELS.iter().flat_map(move |forms| {
        let [plain, grave, acute, tilde] = *forms;
        [
            (plain, plain),
            (grave, plain),
            (acute, acute),
            (tilde, tilde),
        ]
        .into_iter()
        .map(move |(written, heard)| {
            let key = SegmentKey::new(format!("{onset}{written}"));
            (key, clip_for(onset, heard))
        })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// SegmentCatalog
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable `SegmentKey → AudioHandle` mapping.
#[derive(Debug, Clone)]
pub struct SegmentCatalog {
    entries: HashMap<SegmentKey, AudioHandle>,
    max_key_chars: usize,
}

impl SegmentCatalog {
    pub fn new(entries: impl IntoIterator<Item = (SegmentKey, AudioHandle)>) -> Self {
        let entries: HashMap<SegmentKey, AudioHandle> = entries.into_iter().collect();
        let max_key_chars = entries.keys().map(|k| k.as_str().chars().count()).max().unwrap_or(0);
        Self { entries, max_key_chars }
    }

    /// The built-in Dãngme catalog.
    pub fn dangme() -> Self {
        let numerals = RESERVED.iter().map(|k| (k.clone(), AudioHandle::new(format!("{k}.wav"))));
        let consonants = CONSONANTS.iter().map(|&c| (SegmentKey::new(c), clip_for(c, "")));
        let onsets = std::iter::once("").chain(CONSONANTS.iter().copied()).chain(CLUSTERS.iter().copied());
        let recorded = RECORDED_AS.iter().map(|&(k, clip)| (SegmentKey::new(k), AudioHandle::new(clip)));

        // later pairs win on collect, so the overrides go last
        Self::new(
            numerals
                .chain(consonants)
                .chain(onsets.flat_map(syllables))
                .chain(recorded),
        )
    }

    /// Parse a catalog from a JSON object `{ "<key>": "<clip file>", … }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(Error::Config("segment catalog is empty".into()));
        }
        Ok(Self::new(raw.into_iter().map(|(k, v)| (SegmentKey::new(k), AudioHandle::new(v)))))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), entries = catalog.len(), "loaded segment catalog");
        Ok(catalog)
    }

    pub fn lookup(&self, key: &SegmentKey) -> Option<&AudioHandle> {
        self.entries.get(key)
    }

    /// Whether `s` is a key, without allocating a [`SegmentKey`].
    pub fn contains_str(&self, s: &str) -> bool {
        self.entries.contains_key(s)
    }

    /// Length of the longest key in Unicode scalar values.
    pub fn max_key_chars(&self) -> usize {
        self.max_key_chars
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a plan to clips. Fails on the first key with no recording,
    /// reporting its position in `keys`.
    pub fn resolve(&self, keys: &[SegmentKey]) -> Result<Vec<AudioHandle>> {
        keys.iter()
            .enumerate()
            .map(|(position, key)| {
                self.lookup(key).cloned().ok_or_else(|| Error::MissingSegment {
                    key: key.to_string(),
                    position,
                })
            })
            .collect()
    }

    /// Reserved numeral / grammar keys this catalog cannot pronounce.
    pub fn missing_reserved(&self) -> Vec<SegmentKey> {
        RESERVED.iter().filter(|k| !self.entries.contains_key(*k)).cloned().collect()
    }
}

impl Default for SegmentCatalog {
    fn default() -> Self {
        Self::dangme()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{AND, POINT, TENS_MARKER, TIMES};

    fn key(s: &str) -> SegmentKey {
        SegmentKey::new(s)
    }

    #[test]
    fn test_builtin_has_every_reserved_key() {
        let cat = SegmentCatalog::dangme();
        assert!(cat.missing_reserved().is_empty());
        assert_eq!(cat.lookup(&TIMES).unwrap().file_name(), "KƐ.wav");
        assert_eq!(cat.lookup(&AND).unwrap().file_name(), "NYÃ.wav");
        assert_eq!(cat.lookup(&POINT).unwrap().file_name(), "MĨ.wav");
        assert_eq!(cat.lookup(&TENS_MARKER).unwrap().file_name(), "20-90.wav");
    }

    #[test]
    fn test_grave_shares_plain_clip_acute_and_tilde_do_not() {
        let cat = SegmentCatalog::dangme();
        assert_eq!(cat.lookup(&key("ba")), cat.lookup(&key("bà")));
        assert_eq!(cat.lookup(&key("ba")).unwrap().file_name(), "BA.wav");
        assert_eq!(cat.lookup(&key("bá")).unwrap().file_name(), "BÁ.wav");
        assert_eq!(cat.lookup(&key("bã")).unwrap().file_name(), "BÃ.wav");
        assert_ne!(cat.lookup(&key("bá")), cat.lookup(&key("bã")));
    }

    #[test]
    fn test_open_vowels_with_combining_marks() {
        let cat = SegmentCatalog::dangme();
        assert_eq!(cat.lookup(&key("\u{025B}\u{0300}")), cat.lookup(&key("\u{025B}")));
        assert_eq!(
            cat.lookup(&key("ngml\u{025B}\u{0303}")).unwrap().file_name(),
            "NGML\u{025B}\u{0303}.wav"
        );
    }

    #[test]
    fn test_clip_names_match_recordings() {
        let cat = SegmentCatalog::dangme();
        let clip = |k: &str| cat.lookup(&key(k)).unwrap().file_name().to_owned();
        assert_eq!(clip("kplɔ"), "KPLɔ.wav");
        assert_eq!(clip("b\u{025B}"), "B\u{025B}.wav");
        assert_eq!(clip("b\u{025B}\u{0301}"), "B\u{025B}\u{0301}.wav");
        assert_eq!(clip("\u{025B}"), "\u{0190}.wav");
        assert_eq!(clip("\u{0254}\u{0303}"), "\u{0186}\u{0303}.wav");
        assert_eq!(clip("bá"), "BÁ.wav");
        assert_eq!(clip("k"), "K.wav");
    }

    #[test]
    fn test_irregular_recordings() {
        let cat = SegmentCatalog::dangme();
        let clip = |k: &str| cat.lookup(&key(k)).unwrap().file_name().to_owned();
        assert_eq!(clip("sú"), "SU.wav");
        assert_eq!(clip("wú"), "WU.wav");
        assert_eq!(clip("n\u{025B}"), "N\u{0190}.wav");
        assert_eq!(clip("n\u{025B}\u{0300}"), "N\u{0190}.wav");
        assert_eq!(clip("w\u{025B}\u{0303}"), "W\u{0190}\u{0303}.wav");
        assert_eq!(clip("w\u{025B}"), "W\u{025B}.wav");
        assert_eq!(clip("₵"), "SÍDI.wav");
    }

    #[test]
    fn test_max_key_chars_covers_longest_cluster_syllable() {
        let cat = SegmentCatalog::dangme();
        // "ngml" + ɛ + combining tilde is six; "1000000" is seven
        assert!(cat.contains_str("ngml\u{025B}\u{0303}"));
        assert_eq!(cat.max_key_chars(), 7);
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let cat = SegmentCatalog::dangme();
        let k = key("kpɔ́");
        assert_eq!(cat.lookup(&k), cat.lookup(&k));
        assert!(cat.contains_str("kpɔ́"));
    }

    #[test]
    fn test_resolve_reports_missing_position() {
        let cat = SegmentCatalog::dangme();
        let err = cat.resolve(&[TIMES, key("qq"), AND]).unwrap_err();
        match err {
            Error::MissingSegment { key, position } => {
                assert_eq!(key, "qq");
                assert_eq!(position, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json() {
        let cat = SegmentCatalog::from_json_str(r#"{"ba": "ba_take2.wav", "KƐ": "ke.wav"}"#).unwrap();
        assert_eq!(cat.len(), 2);
        assert_eq!(cat.lookup(&key("ba")).unwrap().file_name(), "ba_take2.wav");
        assert_eq!(cat.max_key_chars(), 2);
        assert!(!cat.missing_reserved().is_empty());
    }

    #[test]
    fn test_from_json_rejects_empty() {
        assert!(matches!(SegmentCatalog::from_json_str("{}"), Err(Error::Config(_))));
    }
}
