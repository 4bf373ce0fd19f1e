//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check labels are usable as key segments
//! - Validate value ranges and seeded level values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::SyncConfig;
use crate::kvconfig::keys::{validate_segment, ConfigType};
use crate::loglevel::level::LogLevel;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let label = &config.component.label;
    let global = &config.component.global_label;
    if validate_segment(label).is_err() {
        errors.push(ValidationError::new(
            "component.label",
            "must be set (COMPONENTNAME) and must not contain '/'",
        ));
    }
    if validate_segment(global).is_err() {
        errors.push(ValidationError::new(
            "component.global_label",
            "must be non-empty and must not contain '/'",
        ));
    }
    if !label.is_empty() && label == global {
        errors.push(ValidationError::new(
            "component.label",
            format!("must differ from global label {global:?}"),
        ));
    }

    if config.store.watch_buffer == 0 {
        errors.push(ValidationError::new("store.watch_buffer", "must be greater than 0"));
    }

    for (i, seed) in config.store.seed.iter().enumerate() {
        let field = format!("store.seed[{i}]");
        if validate_segment(&seed.component).is_err() {
            errors.push(ValidationError::new(&field, "component must be a single key segment"));
        }
        if seed.key.is_empty() || seed.key.split('/').any(str::is_empty) {
            errors.push(ValidationError::new(&field, "key must not have empty segments"));
        }
        if seed.config_type == ConfigType::LogLevel && seed.value.parse::<LogLevel>().is_err() {
            errors.push(ValidationError::new(
                &field,
                format!("{:?} is not a log level", seed.value),
            ));
        }
    }

    let controller = &config.controller;
    if controller.restart_base_ms == 0 {
        errors.push(ValidationError::new("controller.restart_base_ms", "must be greater than 0"));
    }
    if controller.restart_base_ms > controller.restart_max_ms {
        errors.push(ValidationError::new(
            "controller.restart_max_ms",
            "must not be lower than restart_base_ms",
        ));
    }

    let observability = &config.observability;
    if observability.log_level.parse::<LogLevel>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("{:?} is not a log level", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SeedEntry;

    fn valid() -> SyncConfig {
        let mut config = SyncConfig::default();
        config.component.label = "adapter".into();
        config
    }

    #[test]
    fn test_defaults_with_label_are_valid() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_missing_label() {
        let errors = validate_config(&SyncConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "component.label");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.component.label = "global".into();
        config.store.watch_buffer = 0;
        config.controller.restart_base_ms = 10_000;
        config.observability.log_level = "LOUD".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "component.label",
                "store.watch_buffer",
                "controller.restart_max_ms",
                "observability.log_level",
                "observability.metrics_address",
            ]
        );
    }

    #[test]
    fn test_seed_entries_checked() {
        let mut config = valid();
        config.store.seed.push(SeedEntry {
            component: "a/b".into(),
            config_type: ConfigType::LogLevel,
            key: "pkg".into(),
            value: "DEBUG".into(),
        });
        config.store.seed.push(SeedEntry {
            component: "adapter".into(),
            config_type: ConfigType::LogLevel,
            key: "pkg".into(),
            value: "chatty".into(),
        });
        config.store.seed.push(SeedEntry {
            component: "adapter".into(),
            config_type: ConfigType::Kafka,
            key: "brokers".into(),
            value: "kafka:9092".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "store.seed[0]");
        assert_eq!(errors[1].field, "store.seed[1]");
    }
}
