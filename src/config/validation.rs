//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, including size/time literals)
//! - Check that every rule has a usable prefix and an http(s) target
//! - Validate value ranges (timeouts > 0, min_size <= max_size, bounded max_time)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::ProxyConfig;

/// Longest accepted `cache.max_time` (100 years).
pub const MAX_CACHE_TIME_SECS: u64 = 100 * 365 * 86_400;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("proxies[{index}]: prefix must not be empty")]
    EmptyPrefix { index: usize },

    #[error("proxies[{index}] ({prefix}): invalid target `{target}`: {reason}")]
    InvalidTarget {
        index: usize,
        prefix: String,
        target: String,
        reason: String,
    },

    #[error("proxies[{index}] ({prefix}): raw_redirect must be printable ASCII")]
    InvalidRedirectTemplate { index: usize, prefix: String },

    #[error("cache.min_size ({min}) exceeds cache.max_size ({max})")]
    MinSizeAboveMaxSize { min: u64, max: u64 },

    #[error("cache.max_time ({secs}s) exceeds the {max}s limit")]
    MaxTimeTooLarge { secs: u64, max: u64 },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("observability.log_buffer_size must be greater than zero")]
    EmptyLogBuffer,
}

/// Parse a rule target and require an http(s) base URL.
pub fn parse_target(target: &str) -> Result<Url, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme `{other}`")),
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err("target must be an absolute URL with a host".to_string());
    }
    Ok(url)
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, rule) in config.proxies.iter().enumerate() {
        if rule.prefix.is_empty() {
            errors.push(ValidationError::EmptyPrefix { index });
        }
        if let Err(reason) = parse_target(&rule.target) {
            errors.push(ValidationError::InvalidTarget {
                index,
                prefix: rule.prefix.clone(),
                target: rule.target.clone(),
                reason,
            });
        }
        if let Some(template) = &rule.raw_redirect {
            if !template.bytes().all(|b| (0x20..0x7f).contains(&b)) {
                errors.push(ValidationError::InvalidRedirectTemplate {
                    index,
                    prefix: rule.prefix.clone(),
                });
            }
        }
    }

    let (min, max) = (config.cache.min_size.as_u64(), config.cache.max_size.as_u64());
    if min > max {
        errors.push(ValidationError::MinSizeAboveMaxSize { min, max });
    }
    if let Some(secs) = config.cache.max_time.map(|t| t.as_secs()) {
        if secs > MAX_CACHE_TIME_SECS {
            errors.push(ValidationError::MaxTimeTooLarge {
                secs,
                max: MAX_CACHE_TIME_SECS,
            });
        }
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
        ("request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    if config.observability.log_buffer_size == 0 {
        errors.push(ValidationError::EmptyLogBuffer);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
