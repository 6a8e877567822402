use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Amount in euro cents. All arithmetic stays in integers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("'{0}' is not a valid amount")]
    Malformed(String),
    #[error("'{0}' has more than two decimal places")]
    TooManyDecimals(String),
    #[error("'{0}' exceeds the supported range")]
    Overflow(String),
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Forgiving parse of a localized (de-DE) amount such as `1.234,56 €`.
    ///
    /// Unparsable and empty input both yield zero; callers that must tell them apart use
    /// [`Money::parse_strict`].
    pub fn parse(raw: &str) -> Self {
        parse_cents(raw, true).map(Self).unwrap_or(Self::ZERO)
    }

    /// Parse that reports malformed input. Blank input is `Ok(None)`.
    pub fn parse_strict(raw: &str) -> Result<Option<Self>, MoneyError> {
        if normalize(raw).is_empty() {
            return Ok(None);
        }
        parse_cents(raw, false).map(|cents| Some(Self(cents)))
    }

    /// Localized rendering without currency glyph, e.g. `-1.234,56`.
    pub fn format(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = (abs / 100).to_string();
        let minor = abs % 100;

        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (index, digit) in major.chars().enumerate() {
            if index > 0 && (major.len() - index) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        format!("{sign}{grouped},{minor:02}")
    }

    pub fn format_with_symbol(self) -> String {
        format!("{} €", self.format())
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Scales an amount, clamping at the representable range like `Add` and `Sub`.
    pub fn saturating_mul(self, factor: i64) -> Money {
        Money(self.0.saturating_mul(factor))
    }

    /// Splits an amount into `parts` equal shares using integer division, e.g. a yearly
    /// figure shown per month. Zero parts yield zero.
    pub fn divide_evenly(self, parts: u32) -> Money {
        if parts == 0 {
            return Money::ZERO;
        }
        Money(self.0 / i64::from(parts))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol())
    }
}

/// Raw amount exactly as entered in a form field. Blank means "not answered", which is
/// distinct from an entered zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmountInput(String);

impl AmountInput {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn blank() -> Self {
        Self(String::new())
    }

    pub fn from_money(amount: Money) -> Self {
        Self(amount.format())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Lenient value; blank and malformed input count as zero.
    pub fn value(&self) -> Money {
        Money::parse(&self.0)
    }

    pub fn strict(&self) -> Result<Option<Money>, MoneyError> {
        Money::parse_strict(&self.0)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn normalize(raw: &str) -> String {
    let without_code = raw.replace("EUR", "").replace("eur", "");
    without_code
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€' && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

fn parse_cents(raw: &str, lenient: bool) -> Result<i64, MoneyError> {
    let cleaned = normalize(raw);
    let malformed = || MoneyError::Malformed(raw.to_string());

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let mut parts = unsigned.splitn(2, '.');
    let major = parts.next().unwrap_or_default();
    let minor = parts.next().unwrap_or_default();

    if (major.is_empty() && minor.is_empty())
        || !major.chars().all(|c| c.is_ascii_digit())
        || !minor.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }

    if minor.len() > 2 && !lenient {
        return Err(MoneyError::TooManyDecimals(raw.to_string()));
    }

    let overflow = || MoneyError::Overflow(raw.to_string());
    let major_value = if major.is_empty() {
        0
    } else {
        major.parse::<i64>().map_err(|_| overflow())?
    };

    let minor_digits: String = minor.chars().chain("00".chars()).take(2).collect();
    let minor_value = minor_digits.parse::<i64>().map_err(|_| malformed())?;

    let cents = major_value
        .checked_mul(100)
        .and_then(|value| value.checked_add(minor_value))
        .ok_or_else(overflow)?;

    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_localized_amounts() {
        assert_eq!(Money::parse("1.234,56 €").cents(), 123_456);
        assert_eq!(Money::parse("  12,5").cents(), 1_250);
        assert_eq!(Money::parse("EUR 300").cents(), 30_000);
        assert_eq!(Money::parse("-0,99").cents(), -99);
        assert_eq!(Money::parse("1\u{a0}000,00").cents(), 100_000);
    }

    #[test]
    fn scaling_clamps_instead_of_overflowing() {
        assert_eq!(Money::from_cents(1_250).saturating_mul(12).cents(), 15_000);
        assert_eq!(Money::from_cents(i64::MAX / 2).saturating_mul(12).cents(), i64::MAX);
        assert_eq!(Money::from_cents(i64::MIN / 2).saturating_mul(12).cents(), i64::MIN);
    }

    #[test]
    fn empty_and_garbage_fall_back_to_zero() {
        assert_eq!(Money::parse(""), Money::ZERO);
        assert_eq!(Money::parse("zwölf"), Money::ZERO);
        assert_eq!(Money::parse("1,2,3"), Money::ZERO);
    }

    #[test]
    fn strict_parse_separates_absent_from_malformed() {
        assert_eq!(Money::parse_strict("   "), Ok(None));
        assert_eq!(
            Money::parse_strict("0,00"),
            Ok(Some(Money::from_cents(0)))
        );
        assert!(matches!(
            Money::parse_strict("zwölf"),
            Err(MoneyError::Malformed(_))
        ));
        assert!(matches!(
            Money::parse_strict("1,005"),
            Err(MoneyError::TooManyDecimals(_))
        ));
    }

    #[test]
    fn formats_with_grouping() {
        assert_eq!(Money::from_cents(123_456_789).format(), "1.234.567,89");
        assert_eq!(Money::from_cents(5).format(), "0,05");
        assert_eq!(Money::from_cents(-100_000).format(), "-1.000,00");
        assert_eq!(Money::from_cents(45_000).format_with_symbol(), "450,00 €");
    }

    #[test]
    fn format_after_parse_is_stable() {
        for raw in ["1.234,56 €", "0,5", "999999", "-12.000,10", ""] {
            let once = Money::parse(raw).format();
            let twice = Money::parse(&once).format();
            assert_eq!(once, twice, "round trip drifted for {raw:?}");
        }
    }

    #[test]
    fn divides_without_drift() {
        let yearly = Money::from_cents(1_000_000);
        assert_eq!(yearly.divide_evenly(12).cents(), 83_333);
        assert_eq!(yearly.divide_evenly(0), Money::ZERO);
        let monthly: Money = std::iter::repeat(yearly.divide_evenly(12)).take(12).sum();
        assert_eq!(monthly.cents(), 999_996);
    }

    #[test]
    fn amount_input_keeps_blank_distinct_from_zero() {
        assert!(AmountInput::blank().is_blank());
        let zero = AmountInput::new("0");
        assert!(!zero.is_blank());
        assert_eq!(zero.value(), Money::ZERO);
    }
}
