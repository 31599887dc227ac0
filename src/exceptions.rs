//! Exception table — hand-authored plans that override the regular grammar.
//!
//! Consulted before any general-case computation. Entries are authoritative
//! local overrides; they are not expected to follow one closed-form rule.
//!
//! Building a table never silently picks a winner between duplicates:
//! repeating an integer with the same plan is tolerated, repeating it with a
//! different plan is a [`Error::DuplicateException`].

use std::{
    collections::{btree_map::Entry, BTreeMap},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    numeral::{DecomposerOptions, NumeralDecomposer},
    segment::{joiner, SegmentKey, DIGITS, HUNDRED, MILLION, ONE, THOUSAND, TIMES},
};

fn digit(n: u64) -> SegmentKey {
    DIGITS[n as usize].clone()
}

/// One row of an exception file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionEntry {
    pub value: u64,
    pub segments: Vec<SegmentKey>,
}

#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    plans: BTreeMap<u64, Vec<SegmentKey>>,
}

impl ExceptionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ExceptionEntry>) -> Result<Self> {
        let mut plans = BTreeMap::new();
        for ExceptionEntry { value, segments } in entries {
            match plans.entry(value) {
                Entry::Vacant(slot) => {
                    slot.insert(segments);
                }
                Entry::Occupied(existing) if *existing.get() == segments => {
                    debug!(value, "identical duplicate exception entry dropped");
                }
                Entry::Occupied(_) => return Err(Error::DuplicateException { value }),
            }
        }
        Ok(Self { plans })
    }

    /// Built-in irregular forms.
    ///
    /// * `d·100 + r` for `d` in 1..=9 and `r` in 1..=10 joins the remainder
    ///   with `KƐ NYÃ`, which the regular hundreds rule omits.
    /// * `1000·1 + r` for `r` in 1..=10, spelled out although the thousands
    ///   rule already produces it.
    /// * `1 000 000 + 10·k` for `k` in 1..=30 takes a bare `KƐ` before the
    ///   round remainder: "million one, times ten" rather than "… and ten".
    pub fn dangme(linking_vowel: bool) -> Self {
        let join = joiner(linking_vowel);
        let mut plans = BTreeMap::new();

        let hundreds = (1..=9).map(|d| (d * 100, vec![HUNDRED, digit(d)]));
        let groups = hundreds.chain(std::iter::once((1_000, vec![THOUSAND, ONE])));
        for (base, head) in groups {
            for r in 1..=10 {
                let plan: Vec<SegmentKey> = head.iter().chain(join).cloned().chain([digit(r)]).collect();
                plans.insert(base + r, plan);
            }
        }

        // Round remainders are spoken through the regular grammar, which
        // needs the hundreds entries above to be in place first.
        let regular = Self { plans: plans.clone() };
        let numerals = NumeralDecomposer::new(
            &regular,
            DecomposerOptions { ceiling: u64::MAX, linking_vowel },
        );
        for k in 1..=30 {
            let mut plan = vec![MILLION, ONE, TIMES];
            plan.extend(numerals.decompose(10 * k).unwrap_or_default());
            plans.insert(1_000_000 + 10 * k, plan);
        }
        Self { plans }
    }

    /// Parse `[{ "value": 101, "segments": ["100", "1", "KƐ", "NYÃ", "1"] }, …]`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<ExceptionEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&json)?;
        info!(path = %path.display(), entries = table.len(), "loaded exception table");
        Ok(table)
    }

    pub fn lookup(&self, n: u64) -> Option<&[SegmentKey]> {
        self.plans.get(&n).map(Vec::as_slice)
    }

    pub fn contains(&self, n: u64) -> bool {
        self.plans.contains_key(&n)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[SegmentKey])> {
        self.plans.iter().map(|(n, plan)| (*n, plan.as_slice()))
    }

    pub fn to_entries(&self) -> Vec<ExceptionEntry> {
        self.iter()
            .map(|(value, segments)| ExceptionEntry { value, segments: segments.to_vec() })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{AND, FIVE, FOUR, LINK_E, NINE, SEVEN, TEN, TENS_MARKER, THREE, TWO};

    #[test]
    fn test_builtin_hundred_and_one() {
        let t = ExceptionTable::dangme(false);
        assert_eq!(t.lookup(101).unwrap(), &[HUNDRED, ONE, TIMES, AND, ONE]);
        assert_eq!(t.lookup(110).unwrap(), &[HUNDRED, ONE, TIMES, AND, TEN]);
        assert!(t.lookup(111).is_none());
        assert!(t.lookup(100).is_none());
    }

    #[test]
    fn test_builtin_hundreds_take_particles_for_small_remainders() {
        let t = ExceptionTable::dangme(false);
        assert_eq!(t.lookup(201).unwrap(), &[HUNDRED, TWO, TIMES, AND, ONE]);
        assert_eq!(t.lookup(305).unwrap(), &[HUNDRED, THREE, TIMES, AND, FIVE]);
        assert_eq!(t.lookup(410).unwrap(), &[HUNDRED, FOUR, TIMES, AND, TEN]);
        assert_eq!(t.lookup(907).unwrap(), &[HUNDRED, NINE, TIMES, AND, SEVEN]);
        assert!(t.lookup(411).is_none());
    }

    #[test]
    fn test_builtin_has_no_hundred_thousand_entries() {
        // these follow the regular grammar, "1000 100 1 KƐ NYÃ r"
        let t = ExceptionTable::dangme(false);
        assert!(!t.contains(100_001));
        assert!(t.lookup(100_000_001).is_none());
        assert_eq!(t.len(), 9 * 10 + 10 + 30);
    }

    #[test]
    fn test_builtin_million_tens_pattern() {
        let t = ExceptionTable::dangme(false);
        assert_eq!(t.lookup(1_000_010).unwrap(), &[MILLION, ONE, TIMES, TEN]);
        assert_eq!(t.lookup(1_000_020).unwrap(), &[MILLION, ONE, TIMES, TENS_MARKER, TWO]);
        assert_eq!(t.lookup(1_000_100).unwrap(), &[MILLION, ONE, TIMES, HUNDRED, ONE]);
        assert_eq!(
            t.lookup(1_000_110).unwrap(),
            &[MILLION, ONE, TIMES, HUNDRED, ONE, TIMES, AND, TEN]
        );
        assert_eq!(
            t.lookup(1_000_300).unwrap(),
            &[MILLION, ONE, TIMES, HUNDRED, THREE]
        );
        assert!(t.lookup(1_000_310).is_none());
        assert!(t.lookup(1_000_005).is_none());
    }

    #[test]
    fn test_builtin_with_linking_vowel() {
        let t = ExceptionTable::dangme(true);
        assert_eq!(t.lookup(1_003).unwrap(), &[THOUSAND, ONE, TIMES, LINK_E, AND, THREE]);
    }

    #[test]
    fn test_identical_duplicates_are_deduplicated() {
        let e = ExceptionEntry { value: 1001, segments: vec![THOUSAND, ONE, TIMES, AND, ONE] };
        let t = ExceptionTable::from_entries(vec![e.clone(), e]).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_conflicting_duplicates_fail() {
        let a = ExceptionEntry { value: 1_000_010, segments: vec![MILLION, ONE, TIMES, AND, TEN] };
        let b = ExceptionEntry { value: 1_000_010, segments: vec![MILLION, ONE, TIMES, TEN] };
        let err = ExceptionTable::from_entries(vec![a, b]).unwrap_err();
        assert!(matches!(err, Error::DuplicateException { value: 1_000_010 }));
    }

    #[test]
    fn test_json_round_trip() {
        let t = ExceptionTable::dangme(false);
        let json = serde_json::to_string(&t.to_entries()).unwrap();
        let back = ExceptionTable::from_json_str(&json).unwrap();
        assert_eq!(back.len(), t.len());
        assert_eq!(back.lookup(105), t.lookup(105));
    }
}
