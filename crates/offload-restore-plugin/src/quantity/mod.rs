//! Parsing of Kubernetes resource quantities, like `100m`, `128Mi` or `1e3`.
//!
//! Only enough of the quantity format is supported to validate the plugin config record. A
//! quantity is kept as an exact integer mantissa scaled by a power of ten, with binary suffixes
//! multiplied into the mantissa, so comparisons never lose precision. The original string is
//! what ends up in the container spec, so no formatting round trip is needed.
use std::{cmp::Ordering, str::FromStr};

use snafu::{OptionExt as _, ResultExt as _, Snafu, ensure};

mod suffix;

pub use suffix::*;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ParseQuantityError {
    #[snafu(display("input is either empty or contains non-ascii characters"))]
    InvalidFormat,

    #[snafu(display("failed to parse {input:?} as decimal number"))]
    InvalidNumber { input: String },

    #[snafu(display("failed to parse suffix"))]
    InvalidSuffix { source: ParseSuffixError },

    #[snafu(display("quantity is too large to be represented"))]
    OutOfRange,
}

/// A non-negative quantity with the value `mantissa * 10^exponent`.
///
/// The mantissa never has trailing zeros and zero is always stored with a zero exponent, so two
/// quantities are equal exactly when their fields are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quantity {
    mantissa: u128,
    exponent: i64,
}

impl FromStr for Quantity {
    type Err = ParseQuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ensure!(!input.is_empty() && input.is_ascii(), InvalidFormatSnafu);

        // Only an explicit positive sign is accepted, resource amounts are never negative.
        let unsigned = input.strip_prefix('+').unwrap_or(input);
        let suffix_index = unsigned
            .find(|c: char| c != '.' && !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(suffix_index);

        let (mantissa, exponent) = parse_decimal(number)?;
        if suffix.is_empty() {
            return Ok(Self::new(mantissa, exponent));
        }

        let suffix = Suffix::from_str(suffix).context(InvalidSuffixSnafu)?;
        let (mantissa, exponent) = suffix.apply(mantissa, exponent).context(OutOfRangeSnafu)?;

        Ok(Self::new(mantissa, exponent))
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.mantissa, other.mantissa) {
            (0, 0) => return Ordering::Equal,
            (0, _) => return Ordering::Less,
            (_, 0) => return Ordering::Greater,
            _ => {}
        }

        // Power of ten of the most significant digit
        let leading = |quantity: &Self| quantity.exponent + i64::from(quantity.mantissa.ilog10());

        leading(self).cmp(&leading(other)).then_with(|| {
            // With the same leading power, the exponents differ by less than the number of
            // digits a u128 holds.
            if self.exponent >= other.exponent {
                compare_scaled(self.mantissa, self.exponent - other.exponent, other.mantissa)
            } else {
                compare_scaled(other.mantissa, other.exponent - self.exponent, self.mantissa)
                    .reverse()
            }
        })
    }
}

impl Quantity {
    fn new(mut mantissa: u128, mut exponent: i64) -> Self {
        if mantissa == 0 {
            return Self {
                mantissa: 0,
                exponent: 0,
            };
        }

        while mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }

        Self { mantissa, exponent }
    }

    /// A zero quantity, regardless of its suffix, means "unbounded".
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }
}

/// Splits a plain decimal number like `1.25` into its digits and the power of ten they are
/// scaled by.
fn parse_decimal(number: &str) -> Result<(u128, i64), ParseQuantityError> {
    let (integer, fraction) = number.split_once('.').unwrap_or((number, ""));
    ensure!(
        !(integer.is_empty() && fraction.is_empty()) && !fraction.contains('.'),
        InvalidNumberSnafu { input: number }
    );

    let fraction = fraction.trim_end_matches('0');
    let mut mantissa: u128 = 0;
    for digit in integer.bytes().chain(fraction.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|mantissa| mantissa.checked_add(u128::from(digit - b'0')))
            .context(OutOfRangeSnafu)?;
    }

    let exponent = i64::try_from(fraction.len()).ok().context(OutOfRangeSnafu)?;
    Ok((mantissa, -exponent))
}

/// Compares `scaled * 10^shift` with `other`. A product that does not fit into a u128 is
/// bigger than any u128.
fn compare_scaled(scaled: u128, shift: i64, other: u128) -> Ordering {
    u32::try_from(shift)
        .ok()
        .and_then(|shift| 10u128.checked_pow(shift))
        .and_then(|factor| scaled.checked_mul(factor))
        .map_or(Ordering::Greater, |scaled| scaled.cmp(&other))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn quantity(input: &str) -> Quantity {
        Quantity::from_str(input).expect("test quantity must parse")
    }

    #[rstest]
    #[case("100m", 1, -1)]
    #[case("128Mi", 134_217_728, 0)]
    #[case("1.5Gi", 1_610_612_736, 0)]
    #[case("2", 2, 0)]
    #[case("1e3", 1, 3)]
    #[case("0", 0, 0)]
    #[case("0.000", 0, 0)]
    #[case("+1", 1, 0)]
    #[case(".5", 5, -1)]
    #[case("250u", 25, -5)]
    #[case("1.07G", 107, 7)]
    #[case("1E", 1, 18)]
    #[case("1.500", 15, -1)]
    fn quantity_from_str_pass(
        #[case] input: &str,
        #[case] mantissa: u128,
        #[case] exponent: i64,
    ) {
        assert_eq!(Quantity::from_str(input), Ok(Quantity { mantissa, exponent }));
    }

    #[rstest]
    #[case("", ParseQuantityError::InvalidFormat)]
    #[case("µ", ParseQuantityError::InvalidFormat)]
    #[case("abc", ParseQuantityError::InvalidNumber { input: String::new() })]
    #[case("-1", ParseQuantityError::InvalidNumber { input: String::new() })]
    #[case("+", ParseQuantityError::InvalidNumber { input: String::new() })]
    #[case("++1", ParseQuantityError::InvalidNumber { input: String::new() })]
    #[case(".", ParseQuantityError::InvalidNumber { input: ".".to_owned() })]
    #[case("1..2", ParseQuantityError::InvalidNumber { input: "1..2".to_owned() })]
    #[case("1000000000000000000000000000000000000000000", ParseQuantityError::OutOfRange)]
    #[case("100000000000000000000000000000000000000Ei", ParseQuantityError::OutOfRange)]
    fn quantity_from_str_fail(#[case] input: &str, #[case] expected: ParseQuantityError) {
        assert_eq!(Quantity::from_str(input), Err(expected));
    }

    #[rstest]
    #[case("10 m")]
    #[case("128MB")]
    #[case("1e")]
    fn quantity_from_str_invalid_suffix(#[case] input: &str) {
        assert!(matches!(
            Quantity::from_str(input),
            Err(ParseQuantityError::InvalidSuffix { .. })
        ));
    }

    #[rstest]
    #[case("0", true)]
    #[case("0Mi", true)]
    #[case("0.0", true)]
    #[case("0e9", true)]
    #[case("1m", false)]
    #[case("1n", false)]
    fn quantity_is_zero(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(quantity(input).is_zero(), expected);
    }

    #[rstest]
    #[case("500m", "0.5", Ordering::Equal)]
    #[case("1.07G", "1070M", Ordering::Equal)]
    #[case("4.03M", "4030k", Ordering::Equal)]
    #[case("1Ki", "1024", Ordering::Equal)]
    #[case("0.1Ki", "102.4", Ordering::Equal)]
    #[case("2e3", "2k", Ordering::Equal)]
    #[case("1000m", "1", Ordering::Equal)]
    #[case("0Mi", "0m", Ordering::Equal)]
    #[case("1Gi", "1G", Ordering::Greater)]
    #[case("9007199254740993", "9007199254740992", Ordering::Greater)]
    #[case("99999999999999999999999999999999999999", "1e38", Ordering::Less)]
    #[case("4e38", "340282366920938463463374607431768211455", Ordering::Greater)]
    #[case("1n", "0", Ordering::Greater)]
    #[case("1n", "1u", Ordering::Less)]
    #[case("1e-40", "1e40", Ordering::Less)]
    #[case("100000000000000000000000000000000000000", "1e37", Ordering::Greater)]
    fn quantity_ordering(#[case] left: &str, #[case] right: &str, #[case] expected: Ordering) {
        assert_eq!(quantity(left).cmp(&quantity(right)), expected);
        assert_eq!(quantity(right).cmp(&quantity(left)), expected.reverse());
    }
}
