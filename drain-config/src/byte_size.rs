use std::fmt;
use std::str::FromStr;

use human_size::{Any, Byte, ParsingError, SpecificSize};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A size in bytes.
///
/// Deserializes from a plain number of bytes or from a human readable string such as `"64 KiB"`.
/// Serializes as a number of bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Create a byte size from bytes.
    pub fn bytes(value: u64) -> Self {
        Self(value)
    }

    /// Create a byte size from kibibytes.
    pub fn kibibytes(value: u64) -> Self {
        Self(value * 1024)
    }

    /// Create a byte size from mebibytes.
    pub fn mebibytes(value: u64) -> Self {
        Self(value * 1024 * 1024)
    }

    /// Return the value in bytes.
    pub fn as_bytes(self) -> usize {
        self.0 as usize
    }
}

impl FromStr for ByteSize {
    type Err = ParsingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Ok(bytes) = value.parse::<u64>() {
            return Ok(Self(bytes));
        }

        let size: SpecificSize<Any> = value.parse()?;
        Ok(Self(size.into::<Byte>().value() as u64))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}B", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteSizeVisitor;

        impl Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number of bytes or a size like `64 KiB`")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<ByteSize, E> {
                u64::try_from(value)
                    .map(ByteSize)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ByteSize, E> {
                value
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_bytes() {
        assert_eq!("4096".parse::<ByteSize>().unwrap(), ByteSize::bytes(4096));
    }

    #[test]
    fn test_parse_human_size() {
        assert_eq!("2 KiB".parse::<ByteSize>().unwrap(), ByteSize::kibibytes(2));
        assert_eq!("1 MiB".parse::<ByteSize>().unwrap(), ByteSize::mebibytes(1));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("lots".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_deserialize() {
        let size: ByteSize = serde_yaml::from_str("65536").unwrap();
        assert_eq!(size.as_bytes(), 65536);

        let size: ByteSize = serde_yaml::from_str("\"64 KiB\"").unwrap();
        assert_eq!(size.as_bytes(), 65536);

        assert!(serde_yaml::from_str::<ByteSize>("-1").is_err());
    }
}
