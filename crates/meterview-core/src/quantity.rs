//! Unit-aware byte quantities for table summaries.
//!
//! A `ByteQuantity` keeps the raw number and its unit separately, so sums
//! across rows are computed in bytes and formatted once for display.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeterviewError;

/// Binary (1024-based) byte unit.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ByteUnit {
    /// Bytes.
    B,
    /// Kibibytes, shown as KB.
    KB,
    /// Mebibytes, shown as MB.
    MB,
    /// Gibibytes, shown as GB.
    GB,
    /// Tebibytes, shown as TB.
    TB,
    /// Pebibytes, shown as PB.
    PB,
}

impl ByteUnit {
    /// All units, smallest first.
    pub const ALL: [Self; 6] = [Self::B, Self::KB, Self::MB, Self::GB, Self::TB, Self::PB];

    /// Number of bytes in one of this unit.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::B => 1.0,
            Self::KB => 1024.0,
            Self::MB => 1024.0 * 1024.0,
            Self::GB => 1024.0 * 1024.0 * 1024.0,
            Self::TB => 1024.0 * 1024.0 * 1024.0 * 1024.0,
            Self::PB => 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
        }
    }

    /// Display suffix.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::B => "bytes",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
            Self::PB => "PB",
        }
    }

    fn parse_suffix(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "B" | "BYTE" | "BYTES" => Some(Self::B),
            "KB" => Some(Self::KB),
            "MB" => Some(Self::MB),
            "GB" => Some(Self::GB),
            "TB" => Some(Self::TB),
            "PB" => Some(Self::PB),
            _ => None,
        }
    }
}

/// A number of bytes expressed in some unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ByteQuantity {
    value: f64,
    unit: ByteUnit,
}

impl ByteQuantity {
    /// Create a quantity in the given unit.
    #[must_use]
    pub fn new(value: f64, unit: ByteUnit) -> Self {
        Self { value, unit }
    }

    /// Create a quantity from a raw byte count.
    #[must_use]
    pub fn from_bytes(bytes: f64) -> Self {
        Self::new(bytes, ByteUnit::B)
    }

    /// The number, in `self.unit()`.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The unit the number is expressed in.
    #[must_use]
    pub fn unit(&self) -> ByteUnit {
        self.unit
    }

    /// The quantity in bytes.
    #[must_use]
    pub fn bytes(&self) -> f64 {
        self.value * self.unit.factor()
    }

    /// Re-express the quantity in another unit.
    #[must_use]
    pub fn to_unit(&self, unit: ByteUnit) -> Self {
        Self::new(self.bytes() / unit.factor(), unit)
    }

    /// Largest unit in which the quantity is at least 1.
    #[must_use]
    pub fn display_unit(&self) -> ByteUnit {
        let bytes = self.bytes().abs();
        ByteUnit::ALL
            .iter()
            .rev()
            .copied()
            .find(|unit| bytes >= unit.factor())
            .unwrap_or(ByteUnit::B)
    }
}

impl Add for ByteQuantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.unit == rhs.unit {
            Self::new(self.value + rhs.value, self.unit)
        } else {
            Self::from_bytes(self.bytes() + rhs.bytes())
        }
    }
}

impl Sum for ByteQuantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::from_bytes(0.0), Add::add)
    }
}

/// Round to what `Display` prints: whole bytes, one decimal otherwise.
fn rounded(value: f64, unit: ByteUnit) -> f64 {
    if unit == ByteUnit::B {
        value.round()
    } else {
        (value * 10.0).round() / 10.0
    }
}

impl fmt::Display for ByteQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unit = self.display_unit();
        let mut shown = rounded(self.to_unit(unit).value, unit);

        // 1023.96 KB prints as 1.0 MB, not 1024.0 KB.
        if shown.abs() >= 1024.0 {
            let next = ByteUnit::ALL
                .iter()
                .skip_while(|u| **u != unit)
                .nth(1)
                .copied();
            if let Some(next) = next {
                unit = next;
                shown = rounded(self.to_unit(unit).value, unit);
            }
        }

        if unit == ByteUnit::B {
            write!(f, "{shown:.0} {}", unit.suffix())
        } else {
            write!(f, "{shown:.1} {}", unit.suffix())
        }
    }
}

impl FromStr for ByteQuantity {
    type Err = MeterviewError;

    /// Parse strings such as `"1.5 GB"`, `"12KB"` or `"512 bytes"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| MeterviewError::MalformedInput(format!("invalid byte quantity: {s}")))?;
        let unit = ByteUnit::parse_suffix(suffix)
            .ok_or_else(|| MeterviewError::MalformedInput(format!("unknown byte unit: {suffix}")))?;

        Ok(Self::new(value, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unit_follows_rounding() {
        assert_eq!(ByteQuantity::from_bytes(1_048_570.0).to_string(), "1.0 MB");
        assert_eq!(ByteQuantity::from_bytes(1023.6).to_string(), "1.0 KB");
        assert_eq!(ByteQuantity::from_bytes(1023.4).to_string(), "1023 bytes");
        assert_eq!(ByteQuantity::from_bytes(1_048_000.0).to_string(), "1023.4 KB");
    }

    #[test]
    fn same_unit_addition_keeps_unit() {
        let sum = ByteQuantity::new(1.5, ByteUnit::GB) + ByteQuantity::new(2.0, ByteUnit::GB);
        assert_eq!(sum.unit(), ByteUnit::GB);
        assert!((sum.value() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_unit_addition_normalizes_to_bytes() {
        let sum = ByteQuantity::new(1.0, ByteUnit::KB) + ByteQuantity::from_bytes(1024.0);
        assert_eq!(sum.unit(), ByteUnit::B);
        assert!((sum.bytes() - 2048.0).abs() < f64::EPSILON);
        assert_eq!(sum.to_string(), "2.0 KB");
    }

    #[test]
    fn display_picks_largest_unit() {
        assert_eq!(ByteQuantity::from_bytes(512.0).to_string(), "512 bytes");
        assert_eq!(ByteQuantity::from_bytes(1536.0).to_string(), "1.5 KB");
        assert_eq!(ByteQuantity::new(3.0, ByteUnit::TB).to_string(), "3.0 TB");
        assert_eq!(ByteQuantity::from_bytes(0.0).to_string(), "0 bytes");
    }

    #[test]
    fn parses_formatted_strings() {
        let q: ByteQuantity = "1.5 GB".parse().unwrap();
        assert_eq!(q.unit(), ByteUnit::GB);
        assert!((q.value() - 1.5).abs() < f64::EPSILON);

        let q: ByteQuantity = "12KB".parse().unwrap();
        assert_eq!(q.unit(), ByteUnit::KB);

        let q: ByteQuantity = "512 bytes".parse().unwrap();
        assert_eq!(q.unit(), ByteUnit::B);

        assert!("lots".parse::<ByteQuantity>().is_err());
        assert!("3 XB".parse::<ByteQuantity>().is_err());
    }

    #[test]
    fn sums_over_rows() {
        let total: ByteQuantity = ["1 KB", "1 MB", "512 bytes"]
            .iter()
            .map(|s| s.parse::<ByteQuantity>().unwrap())
            .sum();
        assert!((total.bytes() - (1024.0 + 1024.0 * 1024.0 + 512.0)).abs() < f64::EPSILON);
        assert_eq!(total.display_unit(), ByteUnit::MB);
    }
}
