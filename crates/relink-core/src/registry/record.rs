//! Persisted registry data model.

use crate::config::RegistryConfig;
use crate::link::LinkKind;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One tracked link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Where the link lives
    pub link: PathBuf,
    /// What the link resolves to
    pub target: PathBuf,
    #[serde(rename = "type")]
    pub kind: LinkKind,
    /// Creation time, UTC with second precision
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Build a record stamped with the current time.
    pub fn new(link: impl Into<PathBuf>, target: impl Into<PathBuf>, kind: LinkKind) -> Self {
        Self {
            link: link.into(),
            target: target.into(),
            kind,
            created_at: Utc::now().trunc_subsecs(0),
        }
    }
}

/// The whole registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default = "current_version")]
    pub config_version: u32,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl Default for RegistryDocument {
    fn default() -> Self {
        Self {
            config_version: RegistryConfig::CURRENT_VERSION,
            links: Vec::new(),
        }
    }
}

fn current_version() -> u32 {
    RegistryConfig::CURRENT_VERSION
}

/// RFC 3339 timestamps with second precision.
///
/// Parsing accepts any RFC 3339 offset and fractional seconds (older files
/// carry microseconds and `+00:00`) and truncates to whole seconds.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(0))
            .map_err(serde::de::Error::custom)
    }
}
