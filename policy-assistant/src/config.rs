use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines, the default
    Json,
    /// Human-readable output for local development
    Pretty,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Service settings, read from the environment at startup
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `POLICY_FIXTURE`; the embedded fixture is used when unset
    pub policy_fixture: Option<PathBuf>,
    /// `LOG_FORMAT`
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        let policy_fixture = match lookup("POLICY_FIXTURE") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: "POLICY_FIXTURE",
                    value: path,
                    reason: "path is empty".to_string(),
                });
            }
            Some(path) => Some(PathBuf::from(path)),
            None => None,
        };

        Ok(Self {
            bind_addr,
            policy_fixture,
            log_format: LogFormat::parse(lookup("LOG_FORMAT").as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert!(config.policy_fixture.is_none());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("POLICY_FIXTURE", "/etc/policies.yaml"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.policy_fixture, Some(PathBuf::from("/etc/policies.yaml")));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn unknown_log_format_falls_back_to_json() {
        let config = config_from(&[("LOG_FORMAT", "xml")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let err = config_from(&[("BIND_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));
    }

    #[test]
    fn empty_fixture_path_is_rejected() {
        let err = config_from(&[("POLICY_FIXTURE", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "POLICY_FIXTURE", .. }));
    }
}
