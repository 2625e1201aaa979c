use std::{env, fmt, net::SocketAddr, str::FromStr, time::Duration};

use axum::http::HeaderValue;
use thiserror::Error;

use crate::domain::profiles::{ProfileSettings, DEFAULT_PROFILE_ID, DEFAULT_UPSTREAM_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::InvalidTransport),
        }
    }
}

/// Which capability groups a server instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerVariant {
    /// echo, get_current_time, calculate
    Basic,
    /// get_profile, whoami and the profile resources
    Profile,
    Full,
}

impl ServerVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Profile => "profile",
            Self::Full => "full",
        }
    }

    pub fn includes_utilities(self) -> bool {
        matches!(self, Self::Basic | Self::Full)
    }

    pub fn includes_profiles(self) -> bool {
        matches!(self, Self::Profile | Self::Full)
    }
}

impl fmt::Display for ServerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerVariant {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "profile" => Ok(Self::Profile),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::InvalidVariant),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub bind_addr: String,
    pub bind_port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    pub variant: ServerVariant,
    pub profiles: ProfileSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_TRANSPORT must be one of: stdio, http")]
    InvalidTransport,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("MCP_ALLOWED_ORIGINS contains an invalid origin: {0}")]
    InvalidOrigin(String),
    #[error("MCP_SERVER_VARIANT must be one of: basic, profile, full")]
    InvalidVariant,
    #[error("MCP_DEFAULT_PROFILE_ID must not be empty")]
    EmptyDefaultProfile,
    #[error("MCP_STRICT_PROFILE_LOOKUP must be true or false")]
    InvalidStrictLookup,
    #[error("MCP_UPSTREAM_TIMEOUT_MS must be a positive integer")]
    InvalidUpstreamTimeout,
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let transport = non_empty("MCP_TRANSPORT")
            .map(|value| value.parse::<Transport>())
            .transpose()?
            .unwrap_or(Transport::Http);
        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(3000);
        let allowed_origins = non_empty("MCP_ALLOWED_ORIGINS")
            .map(|value| parse_origins(&value))
            .transpose()?
            .unwrap_or_default();
        let variant = non_empty("MCP_SERVER_VARIANT")
            .map(|value| value.parse::<ServerVariant>())
            .transpose()?
            .unwrap_or(ServerVariant::Full);

        let default_profile_id = match lookup("MCP_DEFAULT_PROFILE_ID") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::EmptyDefaultProfile)
            }
            Some(value) => value.trim().to_string(),
            None => DEFAULT_PROFILE_ID.to_string(),
        };
        let strict_lookup = non_empty("MCP_STRICT_PROFILE_LOOKUP")
            .map(|value| parse_bool(&value).ok_or(ConfigError::InvalidStrictLookup))
            .transpose()?
            .unwrap_or(false);
        let upstream_timeout = non_empty("MCP_UPSTREAM_TIMEOUT_MS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .map(Duration::from_millis)
                    .ok_or(ConfigError::InvalidUpstreamTimeout)
            })
            .transpose()?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT);

        let config = Self {
            transport,
            bind_addr,
            bind_port,
            allowed_origins,
            variant,
            profiles: ProfileSettings {
                default_profile_id,
                strict_lookup,
                upstream_timeout,
            },
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    /// Applies command-line flags; `--stdio` and `--http` override `MCP_TRANSPORT`.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        for arg in args {
            match arg.as_str() {
                "--stdio" => self.transport = Transport::Stdio,
                "--http" => self.transport = Transport::Http,
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }
        Ok(self)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_origins(value: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            if origin == "*" {
                return Err(ConfigError::InvalidOrigin(origin.to_string()));
            }
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = config_from(&[]).expect("config should parse");
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.bind_port, 3000);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.variant, ServerVariant::Full);
        assert_eq!(config.profiles, ProfileSettings::default());
    }

    #[test]
    fn parses_every_setting() {
        let config = config_from(&[
            ("MCP_TRANSPORT", "STDIO"),
            ("BIND_ADDR", "127.0.0.1"),
            ("BIND_PORT", "8081"),
            ("MCP_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("MCP_SERVER_VARIANT", "profile"),
            ("MCP_DEFAULT_PROFILE_ID", "sam-okafor"),
            ("MCP_STRICT_PROFILE_LOOKUP", "true"),
            ("MCP_UPSTREAM_TIMEOUT_MS", "250"),
        ])
        .expect("config should parse");

        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.bind_socket().expect("socket").port(), 8081);
        assert_eq!(
            config.allowed_origins,
            vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ]
        );
        assert_eq!(config.variant, ServerVariant::Profile);
        assert_eq!(config.profiles.default_profile_id, "sam-okafor");
        assert!(config.profiles.strict_lookup);
        assert_eq!(config.profiles.upstream_timeout, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_fail() {
        assert!(matches!(
            config_from(&[("BIND_PORT", "70000")]),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            config_from(&[("BIND_ADDR", "not an address")]),
            Err(ConfigError::InvalidSocket)
        ));
        assert!(matches!(
            config_from(&[("MCP_TRANSPORT", "carrier-pigeon")]),
            Err(ConfigError::InvalidTransport)
        ));
        assert!(matches!(
            config_from(&[("MCP_SERVER_VARIANT", "deluxe")]),
            Err(ConfigError::InvalidVariant)
        ));
        assert!(matches!(
            config_from(&[("MCP_ALLOWED_ORIGINS", "*")]),
            Err(ConfigError::InvalidOrigin(_))
        ));
        assert!(matches!(
            config_from(&[("MCP_DEFAULT_PROFILE_ID", "  ")]),
            Err(ConfigError::EmptyDefaultProfile)
        ));
        assert!(matches!(
            config_from(&[("MCP_STRICT_PROFILE_LOOKUP", "maybe")]),
            Err(ConfigError::InvalidStrictLookup)
        ));
        assert!(matches!(
            config_from(&[("MCP_UPSTREAM_TIMEOUT_MS", "0")]),
            Err(ConfigError::InvalidUpstreamTimeout)
        ));
    }

    #[test]
    fn cli_flags_override_transport() {
        let config = config_from(&[("MCP_TRANSPORT", "http")])
            .expect("config")
            .with_args(["--stdio".to_string()])
            .expect("known flag");
        assert_eq!(config.transport, Transport::Stdio);

        let err = config_from(&[])
            .expect("config")
            .with_args(["--verbose".to_string()])
            .expect_err("unknown flag");
        assert!(matches!(err, ConfigError::UnknownArgument(arg) if arg == "--verbose"));
    }
}
