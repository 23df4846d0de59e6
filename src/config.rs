// Service configuration

use std::time::Duration;

use crate::error::ConfigError;

// Connection settings for the booking service
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            api_key: String::new(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    // Upper bound on the single availability round-trip of a search
    pub oracle_timeout_ms: u64,
}

impl SearchSettings {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            oracle_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub oracle: OracleConfig,
    pub search: SearchSettings,
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            search: SearchSettings::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Builds the config from any key/value source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("BOOKING_HOST").unwrap_or_else(|| "localhost".to_string());
        let port = lookup("BOOKING_PORT").unwrap_or_else(|| "8001".to_string());
        let port: u16 = parse_value("BOOKING_PORT", &port)?;

        let timeout_ms = match lookup("ORACLE_TIMEOUT_MS") {
            Some(raw) => parse_value("ORACLE_TIMEOUT_MS", &raw)?,
            None => defaults.search.oracle_timeout_ms,
        };

        Ok(Self {
            oracle: OracleConfig {
                base_url: format!("http://{}:{}", host, port),
                api_key: lookup("BOOKING_API_KEY").unwrap_or_default(),
                timeout_ms,
            },
            search: SearchSettings {
                oracle_timeout_ms: timeout_ms,
            },
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.oracle.base_url, "http://localhost:8001");
        assert_eq!(config.oracle.api_key, "");
        assert_eq!(config.search.oracle_timeout_ms, 5000);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_values_from_lookup() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("BOOKING_HOST", "booking-service"),
            ("BOOKING_PORT", "8080"),
            ("BOOKING_API_KEY", "secret"),
            ("ORACLE_TIMEOUT_MS", "250"),
            ("RUST_LOG", "accommodation_search=debug"),
        ]))
        .unwrap();

        assert_eq!(config.oracle.base_url, "http://booking-service:8080");
        assert_eq!(config.oracle.api_key, "secret");
        assert_eq!(config.oracle.timeout_ms, 250);
        assert_eq!(config.search.oracle_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_filter, "accommodation_search=debug");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = ServiceConfig::from_lookup(lookup_from(&[("BOOKING_PORT", "eighty")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidValue {
                key: "BOOKING_PORT".to_string(),
                value: "eighty".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let result = ServiceConfig::from_lookup(lookup_from(&[("ORACLE_TIMEOUT_MS", "-1")]));
        assert!(result.is_err());
    }
}
