//! Configuration for Gatehouse
//!
//! CLI arguments and environment variable handling using clap. The library
//! itself only consumes [`ConnectionConfig`]; [`Args`] is the operator-facing
//! surface used by the binary.

use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::types::{GatehouseError, Result};

/// Default connect timeout for outbound clients
pub const DEFAULT_CONNECT_TIMEOUT_MILLIS: u64 = 10_000;

/// Default read timeout for outbound clients
pub const DEFAULT_READ_TIMEOUT_MILLIS: u64 = 20_000;

/// Gatehouse - connection layer for a remote management console
#[derive(Parser, Debug, Clone)]
#[command(name = "gatehouse")]
#[command(about = "Connect to a remote management endpoint and report what it offers")]
pub struct Args {
    /// Connect timeout for the remote endpoint in milliseconds
    #[arg(long, env = "CONNECT_TIMEOUT_MILLIS", default_value_t = DEFAULT_CONNECT_TIMEOUT_MILLIS)]
    pub connect_timeout_millis: u64,

    /// Read timeout for the remote endpoint in milliseconds
    #[arg(long, env = "READ_TIMEOUT_MILLIS", default_value_t = DEFAULT_READ_TIMEOUT_MILLIS)]
    pub read_timeout_millis: u64,

    /// Skip TLS hostname verification for every outbound client
    #[arg(long, env = "DISABLE_HOSTNAME_VERIFICATION", default_value = "false")]
    pub disable_hostname_verification: bool,

    /// Add a SameSite attribute to cookies issued by the console
    #[arg(long, env = "ENABLE_SAME_SITE_COOKIE_VALUE", default_value = "false")]
    pub enable_same_site_cookie_value: bool,

    /// SameSite attribute value (passed through to the HTTP layer as-is)
    #[arg(long, env = "VALUE_SAME_SITE_COOKIE")]
    pub value_same_site_cookie: Option<String>,

    /// Comma-separated list of supported remote versions
    /// e.g. "12.2.1.4.0,14.1.1.0.0"
    /// If unset, the built-in list is used
    #[arg(long, env = "SUPPORTED_VERSIONS")]
    pub supported_versions: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator actions
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Connect with a username and password
    Connect {
        /// Domain URL of the remote management endpoint
        #[arg(long, env = "DOMAIN_URL")]
        domain_url: String,

        #[arg(long, env = "DOMAIN_USERNAME")]
        username: String,

        #[arg(long, env = "DOMAIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Connect by forwarding a raw Authorization header
    ConnectHeader {
        /// Domain URL of the remote management endpoint
        #[arg(long, env = "DOMAIN_URL")]
        domain_url: String,

        /// Authorization header value, e.g. "Basic d2VibG9naWM6..."
        #[arg(long, env = "DOMAIN_AUTHORIZATION", hide_env_values = true)]
        authorization: String,

        /// Preferred locales for user-facing messages
        #[arg(long, value_delimiter = ',')]
        locales: Vec<String>,
    },
}

impl Args {
    /// Get the list of supported remote versions, if overridden
    pub fn supported_version_list(&self) -> Option<Vec<String>> {
        self.supported_versions.as_ref().map(|versions| {
            versions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    /// Build the library-level connection configuration
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_millis),
            read_timeout: Duration::from_millis(self.read_timeout_millis),
            disable_hostname_verification: self.disable_hostname_verification,
            same_site_cookie: if self.enable_same_site_cookie_value {
                self.value_same_site_cookie.clone()
            } else {
                None
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_millis == 0 {
            return Err(GatehouseError::Config(
                "CONNECT_TIMEOUT_MILLIS must be greater than zero".to_string(),
            ));
        }

        if self.read_timeout_millis == 0 {
            return Err(GatehouseError::Config(
                "READ_TIMEOUT_MILLIS must be greater than zero".to_string(),
            ));
        }

        if self.enable_same_site_cookie_value && self.value_same_site_cookie.is_none() {
            return Err(GatehouseError::Config(
                "VALUE_SAME_SITE_COOKIE is required when ENABLE_SAME_SITE_COOKIE_VALUE is set"
                    .to_string(),
            ));
        }

        if let Some(versions) = self.supported_version_list() {
            if versions.is_empty() {
                return Err(GatehouseError::Config(
                    "SUPPORTED_VERSIONS must list at least one version".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Settings consumed by the connection manager and its client factory
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Connect timeout for outbound clients
    pub connect_timeout: Duration,
    /// Read timeout for outbound clients
    pub read_timeout: Duration,
    /// Accept certificates whose hostname does not match the endpoint
    pub disable_hostname_verification: bool,
    /// SameSite cookie attribute, present only when enabled
    pub same_site_cookie: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MILLIS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MILLIS),
            disable_hostname_verification: false,
            same_site_cookie: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["gatehouse"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&[
            "connect",
            "--domain-url",
            "http://localhost:7001",
            "--username",
            "weblogic",
            "--password",
            "welcome1",
        ]);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_timeouts() {
        let config = ConnectionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(20));
        assert!(!config.disable_hostname_verification);
        assert!(config.same_site_cookie.is_none());
    }

    #[test]
    fn test_args_to_connection_config() {
        let args = parse(&[
            "--connect-timeout-millis",
            "500",
            "--read-timeout-millis",
            "1500",
            "--disable-hostname-verification",
        ]);
        let config = args.connection_config();
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.read_timeout, Duration::from_millis(1500));
        assert!(config.disable_hostname_verification);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_same_site_only_when_enabled() {
        let args = parse(&["--value-same-site-cookie", "Lax"]);
        assert!(args.connection_config().same_site_cookie.is_none());

        let args = parse(&["--enable-same-site-cookie-value", "--value-same-site-cookie", "Lax"]);
        assert_eq!(args.connection_config().same_site_cookie.as_deref(), Some("Lax"));
    }

    #[test]
    fn test_validation_errors() {
        assert!(parse(&["--connect-timeout-millis", "0"]).validate().is_err());
        assert!(parse(&["--read-timeout-millis", "0"]).validate().is_err());
        assert!(parse(&["--enable-same-site-cookie-value"]).validate().is_err());
        assert!(parse(&["--supported-versions", " , "]).validate().is_err());
    }

    #[test]
    fn test_supported_version_list() {
        let args = parse(&["--supported-versions", "14.1.1.0.0, 12.2.1.4.0,"]);
        assert_eq!(
            args.supported_version_list(),
            Some(vec!["14.1.1.0.0".to_string(), "12.2.1.4.0".to_string()])
        );
    }
}
