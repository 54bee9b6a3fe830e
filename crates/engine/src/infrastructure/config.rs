//! Server configuration

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Port used when `HTTP_PORT` is unset or not a valid port number.
pub const DEFAULT_HTTP_PORT: u16 = 3443;

/// Wait between bind attempts while the port is held by another listener.
pub const DEFAULT_BIND_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Server configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: IpAddr,
    /// Port shared by HTTP and WebSocket traffic
    pub port: u16,
    /// Delay before retrying a bind that failed with "address in use"
    pub bind_retry_interval: Duration,
    /// CORS allowed origins (`*` for any); `None` disables the CORS layer
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_HTTP_PORT,
            bind_retry_interval: DEFAULT_BIND_RETRY_INTERVAL,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Missing or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: parse_or("HTTP_HOST", lookup("HTTP_HOST"), defaults.host),
            port: parse_nonzero_or("HTTP_PORT", lookup("HTTP_PORT"), defaults.port),
            bind_retry_interval: Duration::from_millis(parse_nonzero_or(
                "BIND_RETRY_INTERVAL_MS",
                lookup("BIND_RETRY_INTERVAL_MS"),
                defaults.bind_retry_interval.as_millis() as u64,
            )),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|origins| !origins.is_empty()),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }
    }
}

/// Like [`parse_or`], but zero also falls back to the default.
///
/// A zero port would bind an ephemeral port and a zero retry interval would spin.
fn parse_nonzero_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display + PartialEq + Default + Copy,
{
    let value = parse_or(key, raw, default);
    if value == T::default() {
        tracing::warn!(key, default = %default, "Zero is not allowed, using default");
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr(), "0.0.0.0:3443".parse().unwrap());
    }

    #[test]
    fn reads_explicit_values() {
        let config = config_from(&[
            ("HTTP_HOST", "127.0.0.1"),
            ("HTTP_PORT", "8080"),
            ("BIND_RETRY_INTERVAL_MS", "250"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]);
        assert_eq!(config.socket_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.bind_retry_interval, Duration::from_millis(250));
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn unparsable_port_falls_back_to_default() {
        assert_eq!(config_from(&[("HTTP_PORT", "not-a-port")]).port, DEFAULT_HTTP_PORT);
        assert_eq!(config_from(&[("HTTP_PORT", "70000")]).port, DEFAULT_HTTP_PORT);
        assert_eq!(config_from(&[("HTTP_PORT", "")]).port, DEFAULT_HTTP_PORT);
    }

    #[test]
    fn blank_cors_list_disables_cors() {
        assert_eq!(config_from(&[("CORS_ALLOWED_ORIGINS", " , ")]).cors_allowed_origins, None);
    }

    #[test]
    fn zero_port_and_retry_interval_fall_back_to_defaults() {
        let config = config_from(&[("HTTP_PORT", "0"), ("BIND_RETRY_INTERVAL_MS", "0")]);
        assert_eq!(config.port, DEFAULT_HTTP_PORT);
        assert_eq!(config.bind_retry_interval, DEFAULT_BIND_RETRY_INTERVAL);
    }

    #[test]
    fn unparsable_retry_interval_falls_back_to_default() {
        let config = config_from(&[("BIND_RETRY_INTERVAL_MS", "soon")]);
        assert_eq!(config.bind_retry_interval, DEFAULT_BIND_RETRY_INTERVAL);
    }
}
