use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A 0-100 integer confidence.
///
/// This is the only confidence unit used inside the crate. Fractional values
/// coming from other call sites are converted at the boundary with
/// [`Confidence::from_f64_lenient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0);
    pub const MAX: Confidence = Confidence(100);

    /// Creates a confidence, clamping to 100.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Converts a fractional reading, treating values up to 1.0 as fractions.
    ///
    /// Returns `None` for NaN, infinities and negatives.
    pub fn from_f64_lenient(value: f64) -> Option<Self> {
        if value <= 1.0 {
            Self::from_percent(value * 100.0)
        } else {
            Self::from_percent(value)
        }
    }

    /// Converts a value already on the 0-100 scale.
    fn from_percent(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Self(value.round().min(100.0) as u8))
    }

    /// Parses `"72"`, `"72%"`, `" 0.72 "` and friends.
    ///
    /// Decimal text without a percent sign is read like a float, so `"1.0"`
    /// is full confidence while `"1"` is one percent.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (number, percent) = match trimmed.strip_suffix('%') {
            Some(number) => (number.trim(), true),
            None => (trimmed, false),
        };
        let value = number.parse::<f64>().ok()?;
        if percent || !number.contains('.') {
            Self::from_percent(value)
        } else {
            Self::from_f64_lenient(value)
        }
    }

    /// Reads a confidence from an untrusted JSON value (number or numeric string).
    ///
    /// Integers are percentages; floats of at most 1.0 are fractions.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.is_f64() => n.as_f64().and_then(Self::from_f64_lenient),
            Value::Number(n) => n.as_f64().and_then(Self::from_percent),
            Value::String(s) => Self::parse_lenient(s),
            _ => None,
        }
    }

    pub fn saturating_add(self, delta: u8) -> Self {
        Self::new(self.0.saturating_add(delta))
    }

    pub fn saturating_sub(self, delta: u8) -> Self {
        Self(self.0.saturating_sub(delta))
    }

    /// Mean of a set of confidences, rounded; zero for an empty set.
    pub fn mean<I: IntoIterator<Item = Confidence>>(values: I) -> Self {
        let (sum, count) = values
            .into_iter()
            .fold((0u32, 0u32), |(sum, count), c| (sum + c.0 as u32, count + 1));
        if count == 0 {
            return Self::ZERO;
        }
        Self(((sum as f64) / (count as f64)).round() as u8)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Confidence {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid confidence: {value}")))
    }
}
