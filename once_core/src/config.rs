use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

const ENV_BIND_ADDR: &str = "ONCE_BIND_ADDR";
const ENV_TIMEOUT_SECS: &str = "ONCE_TIMEOUT_SECS";
const ENV_ADVERTISE_HOST: &str = "ONCE_ADVERTISE_HOST";

/// Link lifetime when nobody downloads the file (24 hours)
pub const DEFAULT_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Listen address; port 0 lets the OS pick an ephemeral port
    pub bind_addr: SocketAddr,
    /// Deadline after which the server shuts itself down
    pub timeout: Duration,
    /// Address printed in the share URL instead of the detected outbound IP
    pub advertise_host: Option<IpAddr>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            advertise_host: None,
        }
    }
}

impl ServeConfig {
    /// Load config from the environment (and a `.env` file, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = value.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: ENV_BIND_ADDR,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: ENV_TIMEOUT_SECS,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_TIMEOUT_SECS,
                    value,
                    reason: "timeout must be at least one second".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup(ENV_ADVERTISE_HOST) {
            let host = value.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: ENV_ADVERTISE_HOST,
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.advertise_host = Some(host);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        pairs: &[(&'static str, &str)],
    ) -> impl Fn(&'static str) -> Option<String> + use<> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 0);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.timeout, Duration::from_secs(86_400));
        assert!(config.advertise_host.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServeConfig::from_lookup(lookup_from(&[
            (ENV_BIND_ADDR, "127.0.0.1:9999"),
            (ENV_TIMEOUT_SECS, " 60 "),
            (ENV_ADVERTISE_HOST, "192.168.1.20"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9999".parse().unwrap());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.advertise_host, Some("192.168.1.20".parse().unwrap()));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ServeConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(ServeConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_SECS, "soon")])).is_err());
        assert!(ServeConfig::from_lookup(lookup_from(&[(ENV_BIND_ADDR, "localhost")])).is_err());
        assert!(
            ServeConfig::from_lookup(lookup_from(&[(ENV_ADVERTISE_HOST, "example.com")])).is_err()
        );
    }
}
