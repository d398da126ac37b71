use std::str::FromStr;

use snafu::Snafu;

#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display("failed to parse {input:?} as quantity suffix"))]
pub struct ParseSuffixError {
    input: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suffix {
    BinaryMultiple(BinaryMultiple),
    DecimalMultiple(DecimalMultiple),
    DecimalExponent(DecimalExponent),
}

impl FromStr for Suffix {
    type Err = ParseSuffixError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Ok(binary) = BinaryMultiple::from_str(input) {
            return Ok(Self::BinaryMultiple(binary));
        }

        if let Ok(decimal) = DecimalMultiple::from_str(input) {
            return Ok(Self::DecimalMultiple(decimal));
        }

        // "E" alone is Exa and was handled above, so anything left starting with e/E has to be
        // an exponent.
        if let Some(exponent) = input.strip_prefix(['e', 'E'])
            && let Ok(exponent) = exponent.parse::<i32>()
        {
            return Ok(Self::DecimalExponent(DecimalExponent(exponent)));
        }

        ParseSuffixSnafu { input }.fail()
    }
}

impl Suffix {
    /// Applies the suffix to `mantissa * 10^exponent`.
    ///
    /// Binary multiples are multiplied into the mantissa, everything else only moves the
    /// exponent. Returns [`None`] if the mantissa does not fit anymore.
    pub fn apply(&self, mantissa: u128, exponent: i64) -> Option<(u128, i64)> {
        match self {
            Self::BinaryMultiple(binary) => {
                Some((mantissa.checked_mul(binary.factor())?, exponent))
            }
            Self::DecimalMultiple(decimal) => {
                Some((mantissa, exponent + i64::from(decimal.exponent())))
            }
            Self::DecimalExponent(DecimalExponent(power)) => {
                Some((mantissa, exponent + i64::from(*power)))
            }
        }
    }
}

/// Supported byte-multiples based on powers of 2.
///
/// ```plain
/// - 1024^1, KiB (Ki), Kibibyte
/// - 1024^2, MiB (Mi), Mebibyte
/// - 1024^3, GiB (Gi), Gibibyte
/// - 1024^4, TiB (Ti), Tebibyte
/// - 1024^5, PiB (Pi), Pebibyte
/// - 1024^6, EiB (Ei), Exbibyte
/// ```
///
/// All units bigger than Exbibyte are not a valid suffix according to the [Kubernetes
/// serialization format][k8s-serialization-format].
///
/// [k8s-serialization-format]: https://github.com/kubernetes/apimachinery/blob/8c60292e48e46c4faa1e92acb232ce6adb37512c/pkg/api/resource/quantity.go#L37-L59
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString)]
pub enum BinaryMultiple {
    #[strum(serialize = "Ki")]
    Kibi,

    #[strum(serialize = "Mi")]
    Mebi,

    #[strum(serialize = "Gi")]
    Gibi,

    #[strum(serialize = "Ti")]
    Tebi,

    #[strum(serialize = "Pi")]
    Pebi,

    #[strum(serialize = "Ei")]
    Exbi,
}

impl BinaryMultiple {
    /// Returns the factor based on powers of 2.
    pub fn factor(&self) -> u128 {
        let power = match self {
            Self::Kibi => 10,
            Self::Mebi => 20,
            Self::Gibi => 30,
            Self::Tebi => 40,
            Self::Pebi => 50,
            Self::Exbi => 60,
        };

        1 << power
    }
}

/// Supported multiples based on powers of 10.
///
/// Kubernetes uses a lowercase `k` for kilo and additionally allows the sub-unit multiples
/// nano, micro and milli, the latter being the common unit for CPU.
///
/// ```plain
/// - 1000^-3, (n): nano
/// - 1000^-2, (u): micro
/// - 1000^-1, (m): milli
/// - 1000^ 1, (k): kilo
/// - 1000^ 2, (M): Mega
/// - 1000^ 3, (G): Giga
/// - 1000^ 4, (T): Tera
/// - 1000^ 5, (P): Peta
/// - 1000^ 6, (E): Exa
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString)]
pub enum DecimalMultiple {
    #[strum(serialize = "n")]
    Nano,

    #[strum(serialize = "u")]
    Micro,

    #[strum(serialize = "m")]
    Milli,

    #[strum(serialize = "k")]
    Kilo,

    #[strum(serialize = "M")]
    Mega,

    #[strum(serialize = "G")]
    Giga,

    #[strum(serialize = "T")]
    Tera,

    #[strum(serialize = "P")]
    Peta,

    #[strum(serialize = "E")]
    Exa,
}

impl DecimalMultiple {
    pub fn exponent(&self) -> i32 {
        match self {
            Self::Nano => -9,
            Self::Micro => -6,
            Self::Milli => -3,
            Self::Kilo => 3,
            Self::Mega => 6,
            Self::Giga => 9,
            Self::Tera => 12,
            Self::Peta => 15,
            Self::Exa => 18,
        }
    }
}

/// Scientific (also know as E) notation of numbers.
///
/// ### See
///
/// - <https://en.wikipedia.org/wiki/Scientific_notation#E_notation>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecimalExponent(pub i32);
