// SPDX-License-Identifier: MIT OR Apache-2.0
//! The AS4 compression-type catalog.
//!
//! AS4 recognizes exactly one compression type for attachment payloads;
//! this module only validates a declared `CompressionType` part property
//! against that catalog. Actual (de)compression is a downstream concern.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized AS4 compression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CompressionType {
    /// `application/gzip` — the sole compression type AS4 recognizes.
    Gzip,
}

impl CompressionType {
    /// The MIME type string AS4 uses to declare gzip compression.
    pub const GZIP_MIME: &'static str = "application/gzip";

    /// Parse a `CompressionType` part-property value against the known
    /// catalog. Returns `None` for any value other than `application/gzip`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value == Self::GZIP_MIME {
            Some(Self::Gzip)
        } else {
            None
        }
    }

    /// The canonical MIME type string for this compression type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => Self::GZIP_MIME,
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_gzip() {
        assert_eq!(CompressionType::parse("application/gzip"), Some(CompressionType::Gzip));
    }

    #[test]
    fn rejects_anything_else() {
        assert_eq!(CompressionType::parse("application/zstd"), None);
        assert_eq!(CompressionType::parse(""), None);
        assert_eq!(CompressionType::parse("application/Gzip"), None);
    }

    #[test]
    fn round_trips_through_as_str() {
        assert_eq!(CompressionType::parse(CompressionType::Gzip.as_str()), Some(CompressionType::Gzip));
    }
}
