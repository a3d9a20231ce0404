use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A CRC-32 checksum (zlib polynomial) as stored in the patch catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Crc32(pub u32);

impl Crc32 {
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid CRC32 value '{0}': expected up to 8 hexadecimal digits")]
pub struct InvalidCrc(pub String);

impl FromStr for Crc32 {
    type Err = InvalidCrc;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.len() > 8
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(InvalidCrc(s.to_string()));
        }
        u32::from_str_radix(trimmed, 16)
            .map(Self)
            .map_err(|_| InvalidCrc(s.to_string()))
    }
}

impl Serialize for Crc32 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Crc32 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Patch file format as listed in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchFormat {
    Bps,
    Ips,
    /// A format the catalog lists but no engine can apply
    Other(String),
}

impl PatchFormat {
    /// File extension used for patch files of this format
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::Bps => "bps",
            Self::Ips => "ips",
            Self::Other(ext) => ext,
        }
    }

    /// The engine-supported variant, if any
    #[must_use]
    pub fn supported(&self) -> Option<SupportedFormat> {
        match self {
            Self::Bps => Some(SupportedFormat::Bps),
            Self::Ips => Some(SupportedFormat::Ips),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for PatchFormat {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bps" => Self::Bps,
            "ips" => Self::Ips,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for PatchFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl Serialize for PatchFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

impl<'de> Deserialize<'de> for PatchFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Patch formats the built-in engine can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportedFormat {
    Bps,
    Ips,
}

impl std::fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bps => write!(f, "BPS"),
            Self::Ips => write!(f, "IPS"),
        }
    }
}
