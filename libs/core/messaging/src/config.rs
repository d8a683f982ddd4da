use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use std::time::Duration;

/// NATS connection and command server settings
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// Server URL, or a comma-separated list of them
    pub url: String,
    pub client_name: String,
    /// Queue group every command subscription joins
    pub queue_group: String,
    /// Upper bound on handlers running at once
    pub max_concurrent_requests: usize,
    /// Timeout for client-side requests
    pub request_timeout: Duration,
}

impl NatsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_queue_group(mut self, queue_group: impl Into<String>) -> Self {
        self.queue_group = queue_group.into();
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            client_name: "products-service".to_string(),
            queue_group: "products-service".to_string(),
            max_concurrent_requests: 64,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Load NatsConfig from environment variables
///
/// - `NATS_URL` (default: nats://localhost:4222)
/// - `NATS_CLIENT_NAME` (default: products-service)
/// - `NATS_QUEUE_GROUP` (default: products-service)
/// - `NATS_MAX_CONCURRENT_REQUESTS` (default: 64)
/// - `NATS_REQUEST_TIMEOUT_SECS` (default: 10)
impl FromEnv for NatsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_concurrent_requests: usize = env_parse("NATS_MAX_CONCURRENT_REQUESTS", "64")?;
        if max_concurrent_requests == 0 {
            return Err(ConfigError::ParseError {
                key: "NATS_MAX_CONCURRENT_REQUESTS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            url: env_or_default("NATS_URL", "nats://localhost:4222"),
            client_name: env_or_default("NATS_CLIENT_NAME", "products-service"),
            queue_group: env_or_default("NATS_QUEUE_GROUP", "products-service"),
            max_concurrent_requests,
            request_timeout: Duration::from_secs(env_parse("NATS_REQUEST_TIMEOUT_SECS", "10")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nats_config_defaults() {
        temp_env::with_vars_unset(
            [
                "NATS_URL",
                "NATS_CLIENT_NAME",
                "NATS_QUEUE_GROUP",
                "NATS_MAX_CONCURRENT_REQUESTS",
                "NATS_REQUEST_TIMEOUT_SECS",
            ],
            || {
                let config = NatsConfig::from_env().unwrap();
                assert_eq!(config.url, "nats://localhost:4222");
                assert_eq!(config.client_name, "products-service");
                assert_eq!(config.queue_group, "products-service");
                assert_eq!(config.max_concurrent_requests, 64);
                assert_eq!(config.request_timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_nats_config_from_env_custom() {
        temp_env::with_vars(
            [
                ("NATS_URL", Some("nats://a:4222,nats://b:4222")),
                ("NATS_QUEUE_GROUP", Some("products-eu")),
                ("NATS_MAX_CONCURRENT_REQUESTS", Some("8")),
            ],
            || {
                let config = NatsConfig::from_env().unwrap();
                assert_eq!(config.url, "nats://a:4222,nats://b:4222");
                assert_eq!(config.queue_group, "products-eu");
                assert_eq!(config.max_concurrent_requests, 8);
            },
        );
    }

    #[test]
    fn test_nats_config_rejects_zero_concurrency() {
        temp_env::with_var("NATS_MAX_CONCURRENT_REQUESTS", Some("0"), || {
            let err = NatsConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("NATS_MAX_CONCURRENT_REQUESTS"));
        });
    }

    #[test]
    fn test_nats_config_builders() {
        let config = NatsConfig::new("nats://broker:4222")
            .with_queue_group("q")
            .with_max_concurrent_requests(2);
        assert_eq!(config.url, "nats://broker:4222");
        assert_eq!(config.queue_group, "q");
        assert_eq!(config.max_concurrent_requests, 2);
    }
}
