//! Numeric parsing for `min`, `max` and `step`

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|[0-9]+\.?[0-9]*(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?)")
        .unwrap()
});

static DECIMAL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?([0-9]*)(?:\.([0-9]*))?(?:[eE]([+-]?[0-9]+))?$").unwrap()
});

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// `"12px"` is `12`, `"Infinity"` is infinite, `"abc"` and `""` are `None`.
#[must_use]
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let prefix = LEADING_FLOAT.find(text)?.as_str();
    prefix.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parses a decimal literal exactly, including exponent notation (`3.14e2`).
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Whether `value` is an exact multiple of a positive `step`.
///
/// The remainder is computed in decimal arithmetic, so `0.07 % 0.01` is
/// exactly zero where binary floats would leave a residue.
#[must_use]
pub fn is_multiple_of(value: Decimal, step: Decimal) -> bool {
    if step <= Decimal::ZERO {
        return false;
    }
    (value % step).is_zero()
}

// ============================================================================
// SCALED INTEGER ARITHMETIC
// ============================================================================

/// A decimal literal as `digits * 10^exponent`, without leading or trailing zeros.
#[derive(Debug, PartialEq, Eq)]
struct Scaled {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Scaled {
    fn parse(text: &str) -> Option<Self> {
        let caps = DECIMAL_LITERAL.captures(text.trim())?;
        let int = caps.get(2).map_or("", |m| m.as_str());
        let frac = caps.get(3).map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        let exp = match caps.get(4) {
            Some(m) => m.as_str().parse::<i64>().ok()?,
            None => 0,
        };

        let all = format!("{int}{frac}");
        let trimmed = all.trim_start_matches('0');
        let significant = trimmed.trim_end_matches('0');
        let trailing = i64::try_from(trimmed.len() - significant.len()).ok()?;
        let frac_len = i64::try_from(frac.len()).ok()?;
        let exponent = if significant.is_empty() {
            0
        } else {
            exp.checked_sub(frac_len)?.checked_add(trailing)?
        };

        Some(Self {
            negative: caps.get(1).is_some_and(|m| m.as_str() == "-"),
            digits: significant.to_string(),
            exponent,
        })
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }
}

fn add_mod(a: u128, b: u128, m: u128) -> u128 {
    if a >= m - b { a - (m - b) } else { a + b }
}

fn mul_mod(a: u128, b: u128, m: u128) -> u128 {
    let (mut a, mut b, mut acc) = (a % m, b, 0);
    while b > 0 {
        if b & 1 == 1 {
            acc = add_mod(acc, a, m);
        }
        a = add_mod(a, a, m);
        b >>= 1;
    }
    acc
}

fn pow_mod(base: u128, mut exp: u64, m: u128) -> u128 {
    let (mut base, mut acc) = (base % m, 1 % m);
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Step check on the literal text, for values outside the exact decimal range.
///
/// Both operands are scaled by the same power of ten into integers and the
/// value's integer is reduced modulo the step's. A step whose scaled integer
/// does not fit in 128 bits fails the check.
#[must_use]
pub fn is_multiple_of_literal(value: &str, step: &str) -> bool {
    let (Some(value), Some(step)) = (Scaled::parse(value), Scaled::parse(step)) else {
        return false;
    };
    if step.negative || step.is_zero() {
        return false;
    }
    if value.is_zero() {
        return true;
    }

    let base = value.exponent.min(step.exponent);
    let modulus = step.digits.parse::<u128>().ok().and_then(|digits| {
        let shift = u32::try_from(step.exponent.checked_sub(base)?).ok()?;
        digits.checked_mul(10u128.checked_pow(shift)?)
    });
    let Some(modulus) = modulus else {
        tracing::debug!(step = %step.digits, "step too fine to check exactly");
        return false;
    };

    let mut rem = 0;
    for digit in value.digits.bytes() {
        rem = add_mod(mul_mod(rem, 10, modulus), u128::from(digit - b'0') % modulus, modulus);
    }
    let Some(shift) = value
        .exponent
        .checked_sub(base)
        .and_then(|shift| u64::try_from(shift).ok())
    else {
        return false;
    };
    mul_mod(rem, pow_mod(10, shift, modulus), modulus) == 0
}
