//! `BigDecimal`: mantissa + scale arbitrary-precision decimal, with NaN and
//! signed-infinity sentinel states, per the calendar kernel's numeric
//! companion type.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a valid decimal literal: '{0}'")]
    Malformed(String),
}

/// Rounding direction applied when a division can't terminate exactly
/// within the requested precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingDirection {
    Up,
    Down,
    TowardZero,
    AwayFromZero,
    ToNearestOrEven,
    ToNearestOrAwayFromZero,
}

/// Controls the precision buffer and rounding rule used by division, which
/// otherwise has no terminating decimal representation in general.
#[derive(Debug, Clone, Copy)]
pub struct RoundingContext {
    pub precision: u32,
    pub direction: RoundingDirection,
}

impl Default for RoundingContext {
    fn default() -> Self {
        RoundingContext {
            precision: 10,
            direction: RoundingDirection::ToNearestOrEven,
        }
    }
}

/// An arbitrary-precision decimal: `mantissa * 10^-scale`, plus the
/// non-finite sentinel states needed to round-trip JSON's absence of them.
#[derive(Debug, Clone)]
pub enum BigDecimal {
    Finite { mantissa: BigInt, scale: i32 },
    NaN,
    PosInfinity,
    NegInfinity,
}

impl BigDecimal {
    pub fn zero() -> Self {
        BigDecimal::Finite {
            mantissa: BigInt::zero(),
            scale: 0,
        }
    }

    pub fn from_bigint(mantissa: BigInt) -> Self {
        BigDecimal::Finite { mantissa, scale: 0 }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, BigDecimal::Finite { .. })
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, BigDecimal::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, BigDecimal::PosInfinity | BigDecimal::NegInfinity)
    }

    /// Rescale so that trailing mantissa zeros beyond the value's actual
    /// precision are dropped. Non-finite values are left untouched.
    pub fn normalized(&self) -> Self {
        match self {
            BigDecimal::Finite { mantissa, scale } => {
                if mantissa.is_zero() {
                    return BigDecimal::Finite {
                        mantissa: BigInt::zero(),
                        scale: 0,
                    };
                }
                let mut m = mantissa.clone();
                let mut s = *scale;
                let ten = BigInt::from(10);
                while s > 0 && (&m % &ten).is_zero() {
                    m /= &ten;
                    s -= 1;
                }
                BigDecimal::Finite { mantissa: m, scale: s }
            }
            other => other.clone(),
        }
    }

    pub fn negate(&self) -> Self {
        match self {
            BigDecimal::Finite { mantissa, scale } => BigDecimal::Finite {
                mantissa: -mantissa,
                scale: *scale,
            },
            BigDecimal::NaN => BigDecimal::NaN,
            BigDecimal::PosInfinity => BigDecimal::NegInfinity,
            BigDecimal::NegInfinity => BigDecimal::PosInfinity,
        }
    }

    fn rescale_pair(a_m: &BigInt, a_s: i32, b_m: &BigInt, b_s: i32) -> (BigInt, BigInt, i32) {
        let ten = BigInt::from(10);
        if a_s == b_s {
            return (a_m.clone(), b_m.clone(), a_s);
        }
        if a_s > b_s {
            let factor = ten.pow((a_s - b_s) as u32);
            (a_m.clone(), b_m * &factor, a_s)
        } else {
            let factor = ten.pow((b_s - a_s) as u32);
            (a_m * &factor, b_m.clone(), b_s)
        }
    }

    pub fn add(&self, rhs: &Self) -> Self {
        use BigDecimal::*;
        match (self, rhs) {
            (NaN, _) | (_, NaN) => NaN,
            (PosInfinity, NegInfinity) | (NegInfinity, PosInfinity) => NaN,
            (PosInfinity, _) | (_, PosInfinity) => PosInfinity,
            (NegInfinity, _) | (_, NegInfinity) => NegInfinity,
            (Finite { mantissa: am, scale: asc }, Finite { mantissa: bm, scale: bsc }) => {
                let (am, bm, scale) = Self::rescale_pair(am, *asc, bm, *bsc);
                Finite { mantissa: am + bm, scale }
            }
        }
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.negate())
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        use BigDecimal::*;
        match (self, rhs) {
            (NaN, _) | (_, NaN) => NaN,
            (Finite { mantissa, .. }, PosInfinity) | (PosInfinity, Finite { mantissa, .. }) => {
                if mantissa.is_zero() {
                    NaN
                } else if mantissa.is_positive() {
                    PosInfinity
                } else {
                    NegInfinity
                }
            }
            (Finite { mantissa, .. }, NegInfinity) | (NegInfinity, Finite { mantissa, .. }) => {
                if mantissa.is_zero() {
                    NaN
                } else if mantissa.is_positive() {
                    NegInfinity
                } else {
                    PosInfinity
                }
            }
            (PosInfinity, PosInfinity) | (NegInfinity, NegInfinity) => PosInfinity,
            (PosInfinity, NegInfinity) | (NegInfinity, PosInfinity) => NegInfinity,
            (Finite { mantissa: am, scale: asc }, Finite { mantissa: bm, scale: bsc }) => Finite {
                mantissa: am * bm,
                scale: asc + bsc,
            },
        }
    }

    /// Division with a configurable precision buffer, since most divisions
    /// have no terminating decimal representation.
    pub fn div(&self, rhs: &Self, ctx: RoundingContext) -> Self {
        use BigDecimal::*;
        let (am, asc, bm, bsc) = match (self, rhs) {
            (NaN, _) | (_, NaN) => return NaN,
            (Finite { mantissa, .. }, Finite { mantissa: d, .. }) if d.is_zero() => {
                return if mantissa.is_zero() {
                    NaN
                } else if mantissa.is_positive() {
                    PosInfinity
                } else {
                    NegInfinity
                };
            }
            (Finite { mantissa: am, scale: asc }, Finite { mantissa: bm, scale: bsc }) => {
                (am.clone(), *asc, bm.clone(), *bsc)
            }
            (PosInfinity, PosInfinity)
            | (NegInfinity, NegInfinity)
            | (PosInfinity, NegInfinity)
            | (NegInfinity, PosInfinity) => return NaN,
            (PosInfinity, Finite { mantissa, .. }) => {
                return if mantissa.is_negative() { NegInfinity } else { PosInfinity };
            }
            (NegInfinity, Finite { mantissa, .. }) => {
                return if mantissa.is_negative() { PosInfinity } else { NegInfinity };
            }
            (Finite { .. }, PosInfinity) | (Finite { .. }, NegInfinity) => {
                return BigDecimal::zero();
            }
        };

        // Shift the numerator so the quotient carries `ctx.precision` extra
        // fractional digits beyond the operands' natural scale, then round.
        let ten = BigInt::from(10);
        let extra = ctx.precision as i32;
        let shifted_num = am * ten.pow(extra as u32);
        let result_scale = asc - bsc + extra;

        let quotient = Self::divide_rounded(&shifted_num, &bm, ctx.direction);
        BigDecimal::Finite {
            mantissa: quotient,
            scale: result_scale,
        }
        .normalized()
    }

    fn divide_rounded(num: &BigInt, den: &BigInt, direction: RoundingDirection) -> BigInt {
        let (q, r) = num.div_mod_floor_trunc(den);
        if r.is_zero() {
            return q;
        }
        let num_sign_positive = num.is_negative() == den.is_negative();
        let double_r: BigInt = &r * 2;
        let abs_double_r = double_r.abs();
        let abs_den = den.clone().abs();

        let round_away = match direction {
            RoundingDirection::Down => false,
            RoundingDirection::Up => true,
            RoundingDirection::TowardZero => false,
            RoundingDirection::AwayFromZero => true,
            RoundingDirection::ToNearestOrEven => match abs_double_r.cmp(&abs_den) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => q.clone() % BigInt::from(2) != BigInt::zero(),
            },
            RoundingDirection::ToNearestOrAwayFromZero => abs_double_r >= abs_den,
        };

        if round_away {
            if num_sign_positive {
                q + BigInt::one()
            } else {
                q - BigInt::one()
            }
        } else {
            q
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            BigDecimal::NaN => f64::NAN,
            BigDecimal::PosInfinity => f64::INFINITY,
            BigDecimal::NegInfinity => f64::NEG_INFINITY,
            BigDecimal::Finite { mantissa, scale } => {
                let m = mantissa.to_f64().unwrap_or(f64::NAN);
                m / 10f64.powi(*scale)
            }
        }
    }
}

// A truncating div_mod helper: `num = den*q + r` with `r` having the same
// sign as `num` (Rust's built-in integer division semantics), which is what
// the rounding-direction table above assumes.
trait DivModTrunc {
    fn div_mod_floor_trunc(&self, den: &BigInt) -> (BigInt, BigInt);
}

impl DivModTrunc for BigInt {
    fn div_mod_floor_trunc(&self, den: &BigInt) -> (BigInt, BigInt) {
        let q = self / den;
        let r = self - &q * den;
        (q, r)
    }
}

impl PartialEq for BigDecimal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BigDecimal::NaN, _) | (_, BigDecimal::NaN) => false,
            (BigDecimal::PosInfinity, BigDecimal::PosInfinity) => true,
            (BigDecimal::NegInfinity, BigDecimal::NegInfinity) => true,
            (BigDecimal::PosInfinity, _)
            | (_, BigDecimal::PosInfinity)
            | (BigDecimal::NegInfinity, _)
            | (_, BigDecimal::NegInfinity) => false,
            (
                BigDecimal::Finite { mantissa: am, scale: asc },
                BigDecimal::Finite { mantissa: bm, scale: bsc },
            ) => {
                let (am, bm, _) = Self::rescale_pair(am, *asc, bm, *bsc);
                am == bm
            }
        }
    }
}

impl PartialOrd for BigDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (BigDecimal::NaN, _) | (_, BigDecimal::NaN) => None,
            (BigDecimal::NegInfinity, BigDecimal::NegInfinity) => Some(Ordering::Equal),
            (BigDecimal::PosInfinity, BigDecimal::PosInfinity) => Some(Ordering::Equal),
            (BigDecimal::NegInfinity, _) => Some(Ordering::Less),
            (_, BigDecimal::NegInfinity) => Some(Ordering::Greater),
            (BigDecimal::PosInfinity, _) => Some(Ordering::Greater),
            (_, BigDecimal::PosInfinity) => Some(Ordering::Less),
            (
                BigDecimal::Finite { mantissa: am, scale: asc },
                BigDecimal::Finite { mantissa: bm, scale: bsc },
            ) => {
                let (am, bm, _) = Self::rescale_pair(am, *asc, bm, *bsc);
                Some(am.cmp(&bm))
            }
        }
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BigDecimal::NaN => write!(f, "nan"),
            BigDecimal::PosInfinity => write!(f, "inf"),
            BigDecimal::NegInfinity => write!(f, "-inf"),
            BigDecimal::Finite { mantissa, scale } if *scale <= 0 => {
                write!(f, "{}", mantissa * BigInt::from(10).pow((-scale) as u32))
            }
            BigDecimal::Finite { mantissa, scale } => {
                let neg = mantissa.is_negative();
                let digits = mantissa.abs().to_string();
                let scale = *scale as usize;
                let digits = if digits.len() <= scale {
                    format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
                } else {
                    digits
                };
                let split = digits.len() - scale;
                if neg {
                    write!(f, "-{}.{}", &digits[..split], &digits[split..])
                } else {
                    write!(f, "{}.{}", &digits[..split], &digits[split..])
                }
            }
        }
    }
}

impl FromStr for BigDecimal {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim();
        match lower.to_ascii_lowercase().as_str() {
            "nan" => return Ok(BigDecimal::NaN),
            "inf" | "+inf" | "infinity" | "+infinity" => return Ok(BigDecimal::PosInfinity),
            "-inf" | "-infinity" => return Ok(BigDecimal::NegInfinity),
            _ => {}
        }

        let (mantissa_part, exponent) = match lower.find(['e', 'E']) {
            Some(idx) => {
                let exp: i32 = lower[idx + 1..]
                    .parse()
                    .map_err(|_| ParseError::Malformed(s.to_string()))?;
                (&lower[..idx], exp)
            }
            None => (lower, 0),
        };

        let negative = mantissa_part.starts_with('-');
        let unsigned = mantissa_part.trim_start_matches(['+', '-']);
        let (int_part, frac_part) = match unsigned.find('.') {
            Some(idx) => (&unsigned[..idx], &unsigned[idx + 1..]),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseError::Malformed(s.to_string()));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ParseError::Malformed(s.to_string()));
        }

        let digits = format!("{int_part}{frac_part}");
        let digits = if digits.is_empty() { "0" } else { &digits };
        let mut mantissa: BigInt = digits
            .parse()
            .map_err(|_| ParseError::Malformed(s.to_string()))?;
        if negative {
            mantissa = -mantissa;
        }
        let scale = frac_part.len() as i32 - exponent;

        if scale >= 0 {
            Ok(BigDecimal::Finite { mantissa, scale })
        } else {
            let factor = BigInt::from(10).pow((-scale) as u32);
            Ok(BigDecimal::Finite {
                mantissa: mantissa * factor,
                scale: 0,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(BigDecimal::from_str("-12.34e-5").unwrap().to_string(), "-0.0001234");
        assert_eq!(BigDecimal::from_str("0.1").unwrap().to_string(), "0.1");
        assert_eq!(BigDecimal::from_str("100").unwrap().to_string(), "100");
        assert_eq!(BigDecimal::from_str("1e3").unwrap().to_string(), "1000");
        assert!(BigDecimal::from_str("nan").unwrap().is_nan());
        assert!(BigDecimal::from_str("inf").unwrap().is_infinite());
        assert!(BigDecimal::from_str("-Infinity").unwrap().is_infinite());
        assert!(BigDecimal::from_str("abc").is_err());
    }

    #[test]
    fn test_equality_scale_independent() {
        let a = BigDecimal::from_str("1.50").unwrap();
        let b = BigDecimal::from_str("1.5").unwrap();
        assert_eq!(a, b);
        assert_ne!(BigDecimal::NaN, BigDecimal::NaN);
    }

    #[test]
    fn test_add_sub_normalized() {
        let a = BigDecimal::from_str("1.25").unwrap();
        let b = a.negate();
        let sum = a.add(&b).normalized();
        assert_eq!(sum, BigDecimal::zero());
    }

    #[test]
    fn test_mul() {
        let a = BigDecimal::from_str("2.5").unwrap();
        let b = BigDecimal::from_str("4").unwrap();
        assert_eq!(a.mul(&b).normalized().to_string(), "10");
    }

    #[test]
    fn test_div_rounding() {
        let a = BigDecimal::from_str("1").unwrap();
        let b = BigDecimal::from_str("3").unwrap();
        let ctx = RoundingContext {
            precision: 5,
            direction: RoundingDirection::ToNearestOrEven,
        };
        assert_eq!(a.div(&b, ctx).to_string(), "0.33333");
    }

    #[test]
    fn test_div_by_zero() {
        let a = BigDecimal::from_str("5").unwrap();
        let zero = BigDecimal::zero();
        assert!(matches!(a.div(&zero, RoundingContext::default()), BigDecimal::PosInfinity));
        assert!(matches!(zero.div(&zero, RoundingContext::default()), BigDecimal::NaN));
    }

    #[test]
    fn test_ordering() {
        assert!(BigDecimal::from_str("1.1").unwrap() < BigDecimal::from_str("1.10001").unwrap());
        assert!(BigDecimal::NegInfinity < BigDecimal::from_str("-999999").unwrap());
        assert!(BigDecimal::from_str("999999").unwrap() < BigDecimal::PosInfinity);
    }
}
