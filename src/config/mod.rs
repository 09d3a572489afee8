// Configuration module entry point
// Layers built-in defaults, an optional config file and WEBHOOK_* environment
// variables, then validates the result

mod types;

use std::net::SocketAddr;

use crate::error::{ConfigError, ServerError};

// Re-export public types
pub use types::{Config, LoggingConfig};

/// Environment variable prefix, nested keys are separated with `__`
/// (e.g. `WEBHOOK_SERVER__PORT=9000`)
const ENV_PREFIX: &str = "WEBHOOK";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config" (any supported format) when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, None)
    }

    /// Same as [`Config::load_from`] but reads environment overrides from
    /// `env` instead of the process environment when given
    pub fn load_with_env(
        config_path: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.debug", false)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("routes.webhook_path", "/quay")?
            .set_default("routes.health_path", "/_healthz")?
            .set_default("routes.metrics_path", "/metrics")?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.prefix", "webhook_receiver")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }

        let paths = [
            ("routes.webhook_path", &self.routes.webhook_path),
            ("routes.health_path", &self.routes.health_path),
            ("routes.metrics_path", &self.routes.metrics_path),
        ];
        for (key, path) in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{key} must start with '/', got '{path}'"
                )));
            }
        }
        if paths[0].1 == paths[1].1
            || paths[0].1 == paths[2].1
            || (self.metrics.enabled && paths[1].1 == paths[2].1)
        {
            return Err(ConfigError::Invalid("route paths must be distinct".to_string()));
        }

        if self.performance.read_timeout == 0 || self.performance.write_timeout == 0 {
            return Err(ConfigError::Invalid(
                "performance read/write timeouts must be non-zero".to_string(),
            ));
        }

        if !is_metric_name(&self.metrics.prefix) {
            return Err(ConfigError::Invalid(format!(
                "metrics.prefix '{}' is not a valid metric name",
                self.metrics.prefix
            )));
        }

        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::Address { addr, source })
    }

    /// Effective default filter for the application log
    pub fn log_filter(&self) -> &str {
        if self.server.debug {
            "debug"
        } else {
            &self.logging.level
        }
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MISSING: &str = "/nonexistent/webhook-receiver-config";

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_match_quay_receiver() {
        let cfg = Config::load_with_env(MISSING, env(&[])).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert!(!cfg.server.debug);
        assert_eq!(cfg.routes.webhook_path, "/quay");
        assert_eq!(cfg.routes.health_path, "/_healthz");
        assert_eq!(cfg.routes.metrics_path, "/metrics");
        assert!(cfg.metrics.enabled);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.performance.max_connections, None);
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = Config::load_with_env(
            MISSING,
            env(&[
                ("WEBHOOK_SERVER__PORT", "9090"),
                ("WEBHOOK_SERVER__DEBUG", "true"),
                ("WEBHOOK_ROUTES__WEBHOOK_PATH", "/hooks/quay"),
                ("WEBHOOK_PERFORMANCE__MAX_CONNECTIONS", "16"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert!(cfg.server.debug);
        assert_eq!(cfg.routes.webhook_path, "/hooks/quay");
        assert_eq!(cfg.performance.max_connections, Some(16));
        assert_eq!(cfg.log_filter(), "debug");
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8181\n\n[logging]\nlevel = \"warn\"\naccess_log = false\n\n[metrics]\nprefix = \"quay\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let cfg = Config::load_with_env(path, env(&[])).unwrap();
        assert_eq!(cfg.server.port, 8181);
        assert_eq!(cfg.log_filter(), "warn");
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.metrics.prefix, "quay");
        // untouched keys keep their defaults
        assert_eq!(cfg.routes.webhook_path, "/quay");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = [
            ("WEBHOOK_SERVER__PORT", "0"),
            ("WEBHOOK_ROUTES__HEALTH_PATH", "healthz"),
            ("WEBHOOK_ROUTES__METRICS_PATH", "/quay"),
            ("WEBHOOK_PERFORMANCE__READ_TIMEOUT", "0"),
            ("WEBHOOK_METRICS__PREFIX", "9bad-prefix"),
        ];
        for (key, value) in cases {
            let result = Config::load_with_env(MISSING, env(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_socket_address_parsing() {
        let mut cfg = Config::load_with_env(MISSING, env(&[])).unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 9000;
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9000");

        cfg.server.host = "not an ip".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ServerError::Address { .. })
        ));
    }

    #[test]
    fn test_metric_name_check() {
        assert!(is_metric_name("webhook_receiver"));
        assert!(is_metric_name("_x1"));
        assert!(!is_metric_name(""));
        assert!(!is_metric_name("1abc"));
        assert!(!is_metric_name("a-b"));
    }
}
