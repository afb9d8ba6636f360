//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts and TTLs in 1s..=1 day, parallelism > 0)
//! - Validate addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// Upper bound for any configured duration.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// One failed semantic check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be at most {max} seconds")]
    TooLarge { field: &'static str, max: u64 },

    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is not a valid URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be set")]
    Missing { field: &'static str },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("cache.profile_ttl_secs", config.cache.profile_ttl_secs),
        ("cache.aggregate_ttl_secs", config.cache.aggregate_ttl_secs),
        ("fanout.max_parallelism", config.fanout.max_parallelism as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    let durations = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("cache.profile_ttl_secs", config.cache.profile_ttl_secs),
        ("cache.aggregate_ttl_secs", config.cache.aggregate_ttl_secs),
    ];
    for (field, value) in durations {
        if value > MAX_DURATION_SECS {
            errors.push(ValidationError::TooLarge {
                field,
                max: MAX_DURATION_SECS,
            });
        }
    }

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    match Url::parse(&config.polygon.base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field: "polygon.base_url",
            value: config.polygon.base_url.clone(),
        }),
    }

    if config.polygon.api_key.trim().is_empty() {
        errors.push(ValidationError::Missing {
            field: "polygon.api_key",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.polygon.api_key = "key".into();
        config
    }

    #[test]
    fn test_defaults_with_key_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_missing_key_is_reported() {
        let errors = validate_config(&GatewayConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Missing { field: "polygon.api_key" }]);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.fanout.max_parallelism = 0;
        config.cache.aggregate_ttl_secs = 0;
        config.listener.bind_address = "nowhere".into();
        config.polygon.base_url = "::".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NotPositive { field: "fanout.max_parallelism" }));
        assert!(errors.iter().any(|e| e.to_string().contains("listener.bind_address")));
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        let mut config = valid();
        config.timeouts.request_secs = u64::MAX;
        config.cache.profile_ttl_secs = MAX_DURATION_SECS + 1;
        config.timeouts.upstream_secs = MAX_DURATION_SECS;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::TooLarge { field: "timeouts.request_secs", max: MAX_DURATION_SECS },
                ValidationError::TooLarge { field: "cache.profile_ttl_secs", max: MAX_DURATION_SECS },
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = valid();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());
    }
}
