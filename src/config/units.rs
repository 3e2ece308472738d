//! Size and duration literals used by the cache configuration.
//!
//! Sizes are written as `"8MB"`, `"1024KB"` or `"1048576B"` (binary multiples,
//! unit case-insensitive). Durations are written as `"86400S"`. Both accept a
//! bare integer as well, meaning bytes and seconds respectively.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Error produced when a size or time literal is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("invalid size `{0}`: use a format like \"8MB\", \"1024KB\" or \"1048576B\"")]
    InvalidSize(String),

    #[error("invalid time `{0}`: use a format like \"86400S\"")]
    InvalidTime(String),
}

const UNITS: [(&str, u64); 4] = [
    ("GB", 1024 * 1024 * 1024),
    ("MB", 1024 * 1024),
    ("KB", 1024),
    ("B", 1),
];

/// A byte count parsed from a size literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn bytes(n: u64) -> Self {
        Self(n)
    }

    pub const fn kib(n: u64) -> Self {
        Self(n * 1024)
    }

    pub const fn mib(n: u64) -> Self {
        Self(n * 1024 * 1024)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UnitError::InvalidSize(s.to_string());
        let upper = s.trim().to_ascii_uppercase();

        // Longest suffix first so "MB" is not read as "M" + "B".
        let (digits, multiplier) = UNITS
            .iter()
            .find_map(|(unit, mult)| upper.strip_suffix(unit).map(|d| (d, *mult)))
            .ok_or_else(invalid)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let n: u64 = digits.parse().map_err(|_| invalid())?;
        n.checked_mul(multiplier).map(Self).ok_or_else(invalid)
    }
}

impl fmt::Display for ByteSize {
    /// Human-readable size with two decimals, e.g. `10.00MB`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut size = self.0 as f64;
        let mut unit = 0;
        let names = ["B", "KB", "MB", "GB"];
        while size >= 1024.0 && unit < names.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        write!(f, "{:.2}{}", size, names[unit])
    }
}

/// A whole number of seconds parsed from a time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seconds(u64);

impl Seconds {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl FromStr for Seconds {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || UnitError::InvalidTime(s.to_string());
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('S')
            .or_else(|| trimmed.strip_suffix('s'))
            .ok_or_else(invalid)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}S", self.0)
    }
}

// Both literals deserialize from either an integer or a string.

struct LiteralVisitor<T>(&'static str, std::marker::PhantomData<T>);

impl<'de, T> Visitor<'de> for LiteralVisitor<T>
where
    T: FromStr<Err = UnitError> + From<u64>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        Ok(T::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        u64::try_from(v)
            .map(T::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        v.parse().map_err(E::custom)
    }
}

impl From<u64> for ByteSize {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl From<u64> for Seconds {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiteralVisitor(
            "a byte count or a size literal like \"8MB\"",
            std::marker::PhantomData,
        ))
    }
}

impl<'de> Deserialize<'de> for Seconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LiteralVisitor(
            "a number of seconds or a time literal like \"86400S\"",
            std::marker::PhantomData,
        ))
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl Serialize for Seconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size_literals() {
        assert_eq!("8MB".parse::<ByteSize>().unwrap(), ByteSize::mib(8));
        assert_eq!("1024kb".parse::<ByteSize>().unwrap(), ByteSize::mib(1));
        assert_eq!("1048576B".parse::<ByteSize>().unwrap(), ByteSize::mib(1));
        assert_eq!("2GB".parse::<ByteSize>().unwrap().as_u64(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn rejects_malformed_sizes() {
        for bad in ["", "MB", "8", "8 MB", "-1MB", "8TB", "1.5MB", "eightMB"] {
            assert!(bad.parse::<ByteSize>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parses_time_literals() {
        assert_eq!("86400S".parse::<Seconds>().unwrap().as_secs(), 86400);
        assert_eq!("1s".parse::<Seconds>().unwrap().as_duration(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "S", "86400", "1d", "10M", "1.5S"] {
            assert!(bad.parse::<Seconds>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn formats_sizes_for_humans() {
        assert_eq!(ByteSize::mib(10).to_string(), "10.00MB");
        assert_eq!(ByteSize::bytes(512).to_string(), "512.00B");
        assert_eq!(ByteSize::kib(1536).to_string(), "1.50MB");
    }

    #[test]
    fn deserializes_from_integers_and_strings() {
        #[derive(Deserialize)]
        struct Sample {
            size: ByteSize,
            time: Seconds,
        }

        let sample: Sample = toml::from_str("size = \"8MB\"\ntime = 60").unwrap();
        assert_eq!(sample.size, ByteSize::mib(8));
        assert_eq!(sample.time.as_secs(), 60);

        let err = toml::from_str::<Sample>("size = \"8XB\"\ntime = \"1S\"");
        assert!(err.is_err());
    }
}
