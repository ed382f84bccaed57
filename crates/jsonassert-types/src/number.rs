use std::fmt;

use serde::{Serialize, Serializer};

/// Upper bound (exclusive) of magnitudes that convert to `i128` without saturation.
const I128_LIMIT: f64 = 1.7e38;

/// A JSON number that keeps the representation it was decoded with.
///
/// Integers that fit `i64` are stored as [`JsonNumber::Int`], larger positive
/// integers as [`JsonNumber::UInt`], everything else as [`JsonNumber::Float`].
/// Equality is numeric and exact: `4` equals `4.0`, but
/// `9007199254740993` does not equal `9007199254740992.0`.
#[derive(Clone, Copy, Debug)]
pub enum JsonNumber {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl JsonNumber {
    /// Convert a decoded `serde_json` number without losing precision.
    pub fn from_serde(number: &serde_json::Number) -> Self {
        number
            .as_i64()
            .map(Self::Int)
            .or_else(|| number.as_u64().map(Self::UInt))
            .or_else(|| number.as_f64().map(Self::Float))
            .unwrap_or(Self::Float(f64::NAN))
    }

    /// The number as a float. Lossy for integers above 2^53.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(i) => i as f64,
            Self::UInt(u) => u as f64,
            Self::Float(f) => f,
        }
    }

    /// The exact integer value, if the number is integral.
    ///
    /// Whole floats count as integral as long as they convert exactly.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            Self::Int(i) => Some(i128::from(i)),
            Self::UInt(u) => Some(i128::from(u)),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < I128_LIMIT => {
                Some(f as i128)
            }
            Self::Float(_) => None,
        }
    }

    /// Returns `true` when the number is stored as a float.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Turn a whole-valued float into an integer representation.
    ///
    /// Values outside the `i64` range but inside `u64` become [`JsonNumber::UInt`];
    /// anything else is returned unchanged.
    pub fn normalized(self) -> Self {
        let Self::Float(f) = self else {
            return self;
        };
        match self.as_integer() {
            Some(i) => i64::try_from(i)
                .map(Self::Int)
                .or_else(|_| u64::try_from(i).map(Self::UInt))
                .unwrap_or(Self::Float(f)),
            None => self,
        }
    }

    /// Canonical text used for hashing: equal numbers produce equal text.
    pub fn canonical(&self) -> String {
        match self.as_integer() {
            Some(i) => i.to_string(),
            None => self.to_string(),
        }
    }
}

impl PartialEq for JsonNumber {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.as_f64() == other.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for JsonNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(v) => match serde_json::Number::from_f64(v) {
                Some(n) => write!(f, "{n}"),
                None => write!(f, "{v}"),
            },
        }
    }
}

impl Serialize for JsonNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Int(i) => serializer.serialize_i64(i),
            Self::UInt(u) => serializer.serialize_u64(u),
            Self::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl From<i64> for JsonNumber {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for JsonNumber {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for JsonNumber {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<f64> for JsonNumber {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_keeps_representation() {
        let n: serde_json::Number = serde_json::from_str("17294094973108486143").unwrap();
        assert!(matches!(JsonNumber::from_serde(&n), JsonNumber::UInt(17294094973108486143)));

        let n: serde_json::Number = serde_json::from_str("-12").unwrap();
        assert!(matches!(JsonNumber::from_serde(&n), JsonNumber::Int(-12)));

        let n: serde_json::Number = serde_json::from_str("1.23").unwrap();
        assert!(matches!(JsonNumber::from_serde(&n), JsonNumber::Float(f) if f == 1.23));
    }

    #[test]
    fn integer_and_whole_float_are_equal() {
        assert_eq!(JsonNumber::Int(4), JsonNumber::Float(4.0));
        assert_ne!(JsonNumber::Int(4), JsonNumber::Float(4.5));
    }

    #[test]
    fn no_precision_loss_above_2_pow_53() {
        let exact = JsonNumber::Int(9_007_199_254_740_993);
        let rounded = JsonNumber::Float(9_007_199_254_740_992.0);
        assert_ne!(exact, rounded);
        assert_eq!(JsonNumber::UInt(17294094973108486143), JsonNumber::from(17294094973108486143u64));
        assert_ne!(JsonNumber::UInt(17294094973108486143), JsonNumber::UInt(17294094973108486144));
    }

    #[test]
    fn normalized_whole_floats() {
        assert!(matches!(JsonNumber::Float(5.0).normalized(), JsonNumber::Int(5)));
        assert!(matches!(JsonNumber::Float(1.23).normalized(), JsonNumber::Float(_)));
        assert!(matches!(
            JsonNumber::Float(1.0e19).normalized(),
            JsonNumber::UInt(10_000_000_000_000_000_000)
        ));
        assert!(matches!(JsonNumber::Float(1.0e30).normalized(), JsonNumber::Float(_)));
        assert!(matches!(JsonNumber::Int(7).normalized(), JsonNumber::Int(7)));
    }

    #[test]
    fn display_literals() {
        assert_eq!(JsonNumber::Int(-3).to_string(), "-3");
        assert_eq!(JsonNumber::UInt(17294094973108486143).to_string(), "17294094973108486143");
        assert_eq!(JsonNumber::Float(1.23).to_string(), "1.23");
        assert_eq!(JsonNumber::Float(4.0).to_string(), "4.0");
    }

    #[test]
    fn canonical_matches_equality() {
        assert_eq!(JsonNumber::Int(4).canonical(), JsonNumber::Float(4.0).canonical());
        assert_ne!(JsonNumber::Int(4).canonical(), JsonNumber::Float(4.5).canonical());
    }
}
