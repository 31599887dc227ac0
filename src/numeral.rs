//! Numeral decomposer — integer → ordered segment keys.
//!
//! Dãngme counts with a multiplier particle `KƐ` ("times") and an additive
//! particle `NYÃ` ("and"). The regular grammar, tier by tier:
//!
//! | Range            | Plan                                                     |
//! |------------------|----------------------------------------------------------|
//! | `0..=10`         | `[digit]`                                                |
//! | `11..=19`        | `[10, KƐ, unit]`                                         |
//! | `20..=99`        | `[20-90, tens]` then `[KƐ, unit]` if `unit > 0`          |
//! | `100..=999`      | `[100, hundreds]` then the remainder, appended directly  |
//! | `1e3..1e6`       | `[1000] ++ k` then `[KƐ, NYÃ] ++ rest` if `rest > 0`     |
//! | `≥ 1e6`          | `1000000 (MĨ 1000000)×(p-1) ++ m` then `[KƐ, NYÃ] ++ rest` |
//!
//! where `p = floor(log_1e6 n)`, so `1000000 MĨ 1000000` is 10^12. The
//! hundreds tier has no particles of its own; that asymmetry is part of the
//! language. The [`ExceptionTable`] is consulted first at every level of the
//! recursion.

use once_cell::sync::Lazy;

use crate::{
    error::{Error, Result},
    exceptions::ExceptionTable,
    segment::{joiner, SegmentKey, DIGITS, HUNDRED, MILLION, POINT, TEN, TENS_MARKER, THOUSAND, TIMES},
};

/// Default exclusive upper bound on supported numbers (10^18).
pub const DEFAULT_CEILING: u64 = 1_000_000_000_000_000_000;

const MILLION_STEP: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposerOptions {
    /// Numbers at or above this are rejected.
    pub ceiling: u64,
    /// Put the linking vowel `E` between `KƐ` and `NYÃ`.
    pub linking_vowel: bool,
}

impl Default for DecomposerOptions {
    fn default() -> Self {
        Self { ceiling: DEFAULT_CEILING, linking_vowel: false }
    }
}

/// Borrowing view over an exception table plus options. Cheap to build per
/// call; holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct NumeralDecomposer<'a> {
    exceptions: &'a ExceptionTable,
    options: DecomposerOptions,
}

impl<'a> NumeralDecomposer<'a> {
    pub fn new(exceptions: &'a ExceptionTable, options: DecomposerOptions) -> Self {
        Self { exceptions, options }
    }

    pub fn options(&self) -> DecomposerOptions {
        self.options
    }

    pub fn decompose(&self, n: u64) -> Result<Vec<SegmentKey>> {
        if n >= self.options.ceiling {
            return Err(Error::UnsupportedMagnitude {
                value: n.to_string(),
                ceiling: self.options.ceiling,
            });
        }
        let mut plan = Vec::new();
        self.push(n, &mut plan);
        Ok(plan)
    }

    pub fn decompose_signed(&self, n: i64) -> Result<Vec<SegmentKey>> {
        let n = u64::try_from(n)
            .map_err(|_| Error::InvalidArgument(format!("negative number {n}")))?;
        self.decompose(n)
    }

    /// Decompose a run of ASCII digits. Runs too long for `u64` are reported
    /// as unsupported, never truncated.
    pub fn decompose_digits(&self, digits: &str) -> Result<Vec<SegmentKey>> {
        if let Some(rest) = digits.strip_prefix('-') {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidArgument(format!("negative number {digits}")));
            }
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidArgument(format!("{digits:?} is not a numeral")));
        }
        match digits.parse::<u64>() {
            Ok(n) => self.decompose(n),
            Err(_) => Err(Error::UnsupportedMagnitude {
                value: digits.trim_start_matches('0').to_string(),
                ceiling: self.options.ceiling,
            }),
        }
    }

    fn push(&self, n: u64, out: &mut Vec<SegmentKey>) {
        if let Some(plan) = self.exceptions.lookup(n) {
            out.extend_from_slice(plan);
            return;
        }

        match n {
            0..=10 => out.push(digit(n)),
            11..=19 => out.extend([TEN, TIMES, digit(n % 10)]),
            20..=99 => {
                out.extend([TENS_MARKER, digit(n / 10)]);
                if n % 10 != 0 {
                    out.extend([TIMES, digit(n % 10)]);
                }
            }
            100..=999 => {
                out.extend([HUNDRED, digit(n / 100)]);
                if n % 100 != 0 {
                    self.push(n % 100, out);
                }
            }
            1_000..=999_999 => {
                out.push(THOUSAND);
                self.push(n / 1_000, out);
                self.push_remainder(n % 1_000, out);
            }
            _ => {
                let (power, unit) = million_power(n);
                out.push(MILLION);
                for _ in 1..power {
                    out.extend([POINT, MILLION]);
                }
                self.push(n / unit, out);
                self.push_remainder(n % unit, out);
            }
        }
    }

    fn push_remainder(&self, rest: u64, out: &mut Vec<SegmentKey>) {
        if rest != 0 {
            out.extend_from_slice(joiner(self.options.linking_vowel));
            self.push(rest, out);
        }
    }
}

fn digit(d: u64) -> SegmentKey {
    DIGITS[d as usize].clone()
}

/// Largest `(p, 1e6^p)` with `1e6^p <= n`. Requires `n >= 1e6`.
fn million_power(n: u64) -> (u32, u64) {
    let mut power = 1;
    let mut unit = MILLION_STEP;
    while let Some(next) = unit.checked_mul(MILLION_STEP) {
        if next > n {
            break;
        }
        power += 1;
        unit = next;
    }
    (power, unit)
}

static BUILTIN_EXCEPTIONS: Lazy<ExceptionTable> = Lazy::new(|| ExceptionTable::dangme(false));

/// Decompose with the built-in exception table and default options.
pub fn decompose(n: u64) -> Result<Vec<SegmentKey>> {
    NumeralDecomposer::new(&BUILTIN_EXCEPTIONS, DecomposerOptions::default()).decompose(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
