//! Configuration key layout.
//!
//! # Layout
//! ```text
//! <data_prefix><component_label>/<config_type>            subtree root
//! <data_prefix><component_label>/<config_type>/<leaf>     leaf entry
//! ```
//!
//! Construction and parsing live together so the layout has exactly one owner.
//! Labels and config types must not contain `/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path separator between key segments.
pub const SEPARATOR: char = '/';

/// Namespace under a component's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    LogLevel,
    Kafka,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::LogLevel => "loglevel",
            ConfigType::Kafka => "kafka",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigType {
    type Err = MalformedKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loglevel" => Ok(ConfigType::LogLevel),
            "kafka" => Ok(ConfigType::Kafka),
            other => Err(MalformedKeyError::InvalidSegment {
                segment: other.to_string(),
            }),
        }
    }
}

/// A raw key that does not follow the layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKeyError {
    #[error("key {key:?} does not start with prefix {prefix:?}")]
    MissingPrefix { prefix: String, key: String },

    #[error("key {key:?} has no {config_type:?} segment")]
    MissingConfigType { config_type: String, key: String },

    #[error("key {key:?} has an empty component segment")]
    EmptyOwner { key: String },

    #[error("key {key:?} has an empty leaf segment")]
    EmptyLeaf { key: String },

    #[error("segment {segment:?} is empty or contains a separator")]
    InvalidSegment { segment: String },
}

/// Result of parsing a watched key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Leaf config key, empty for the subtree root itself.
    pub leaf: String,
    /// Component label owning the subtree.
    pub owner: String,
}

/// Check that a label can be used as a single key segment.
pub fn validate_segment(segment: &str) -> Result<(), MalformedKeyError> {
    if segment.is_empty() || segment.contains(SEPARATOR) {
        return Err(MalformedKeyError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// Build the subtree root key for a component and config type.
pub fn build_key(prefix: &str, component_label: &str, config_type: ConfigType) -> String {
    format!("{prefix}{component_label}{SEPARATOR}{config_type}")
}

/// Build the key of a single leaf entry below a subtree root.
pub fn leaf_key(root: &str, leaf: &str) -> String {
    format!("{root}{SEPARATOR}{leaf}")
}

/// Split a raw watched key into its leaf and owning component.
///
/// The subtree root parses to an empty leaf. Anything after the config type
/// must be a separator followed by a leaf with no empty segments.
pub fn parse_watch_key(
    prefix: &str,
    config_type: ConfigType,
    raw_key: &str,
) -> Result<ParsedKey, MalformedKeyError> {
    let rest = raw_key
        .strip_prefix(prefix)
        .ok_or_else(|| MalformedKeyError::MissingPrefix {
            prefix: prefix.to_string(),
            key: raw_key.to_string(),
        })?;

    let missing_type = || MalformedKeyError::MissingConfigType {
        config_type: config_type.to_string(),
        key: raw_key.to_string(),
    };

    let (owner, after_owner) = rest.split_once(SEPARATOR).ok_or_else(missing_type)?;
    if owner.is_empty() {
        return Err(MalformedKeyError::EmptyOwner {
            key: raw_key.to_string(),
        });
    }

    let leaf = match after_owner.split_once(SEPARATOR) {
        Some((ty, leaf)) if ty == config_type.as_str() => {
            if leaf.is_empty() || leaf.split(SEPARATOR).any(str::is_empty) {
                return Err(MalformedKeyError::EmptyLeaf {
                    key: raw_key.to_string(),
                });
            }
            leaf
        }
        None if after_owner == config_type.as_str() => "",
        _ => return Err(missing_type()),
    };

    Ok(ParsedKey {
        leaf: leaf.to_string(),
        owner: owner.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "service/config/";

    #[test]
    fn test_build_key_layout() {
        assert_eq!(
            build_key(PREFIX, "adapter", ConfigType::LogLevel),
            "service/config/adapter/loglevel"
        );
        assert_eq!(
            build_key(PREFIX, "global", ConfigType::Kafka),
            "service/config/global/kafka"
        );
        assert_eq!(
            leaf_key("service/config/adapter/loglevel", "default"),
            "service/config/adapter/loglevel/default"
        );
    }

    #[test]
    fn test_root_round_trip() {
        for label in ["global", "rw-core", "adapter_1"] {
            for ty in [ConfigType::LogLevel, ConfigType::Kafka] {
                let key = build_key(PREFIX, label, ty);
                let parsed = parse_watch_key(PREFIX, ty, &key).unwrap();
                assert_eq!(parsed.leaf, "");
                assert_eq!(parsed.owner, label);
            }
        }
    }

    #[test]
    fn test_leaf_round_trip() {
        let root = build_key(PREFIX, "adapter", ConfigType::LogLevel);
        for leaf in ["default", "github.com#opencord#voltha", "pkg.with.dots"] {
            let parsed =
                parse_watch_key(PREFIX, ConfigType::LogLevel, &leaf_key(&root, leaf)).unwrap();
            assert_eq!(parsed.leaf, leaf);
            assert_eq!(parsed.owner, "adapter");
        }
    }

    #[test]
    fn test_missing_prefix() {
        let err = parse_watch_key(PREFIX, ConfigType::LogLevel, "other/adapter/loglevel/x")
            .unwrap_err();
        assert!(matches!(err, MalformedKeyError::MissingPrefix { .. }));

        // Prefix must be at the start, not merely contained.
        let err = parse_watch_key(
            PREFIX,
            ConfigType::LogLevel,
            "x/service/config/adapter/loglevel/x",
        )
        .unwrap_err();
        assert!(matches!(err, MalformedKeyError::MissingPrefix { .. }));
    }

    #[test]
    fn test_wrong_or_missing_config_type() {
        for raw in [
            "service/config/adapter",
            "service/config/adapter/kafka/x",
            "service/config/adapter/loglevelx",
            "service/config/adapter/loglevelx/pkg",
            "service/config/adapter//loglevel/pkg",
        ] {
            let err = parse_watch_key(PREFIX, ConfigType::LogLevel, raw).unwrap_err();
            assert!(
                matches!(err, MalformedKeyError::MissingConfigType { .. }),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn test_empty_segments() {
        let err = parse_watch_key(PREFIX, ConfigType::LogLevel, "service/config//loglevel/x")
            .unwrap_err();
        assert!(matches!(err, MalformedKeyError::EmptyOwner { .. }));

        for raw in [
            "service/config/adapter/loglevel/",
            "service/config/adapter/loglevel//pkg",
            "service/config/adapter/loglevel/pkg/",
        ] {
            let err = parse_watch_key(PREFIX, ConfigType::LogLevel, raw).unwrap_err();
            assert!(matches!(err, MalformedKeyError::EmptyLeaf { .. }), "{raw}");
        }
    }

    #[test]
    fn test_nested_leaf_is_kept_whole() {
        let parsed = parse_watch_key(
            PREFIX,
            ConfigType::Kafka,
            "service/config/adapter/kafka/brokers/primary",
        )
        .unwrap();
        assert_eq!(parsed.leaf, "brokers/primary");
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("adapter").is_ok());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("a/b").is_err());
    }

    #[test]
    fn test_config_type_strings() {
        assert_eq!(ConfigType::LogLevel.to_string(), "loglevel");
        assert_eq!("kafka".parse::<ConfigType>().unwrap(), ConfigType::Kafka);
        assert!("LogLevel".parse::<ConfigType>().is_err());
    }
}
