use std::{env, fmt, time::Duration};
use url::Url;

use crate::domain::throttle::DEFAULT_THROTTLE_WINDOW;
use crate::interface_adapters::view::DEFAULT_RENDER_SCALE;

// Runtime/client constants (not gameplay rules).

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000/ws";
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_millis(1500);
pub const CONSOLE_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl { var: &'static str, error: url::ParseError },
    InvalidNumber { var: &'static str, value: String },
    UnsupportedScheme(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl { var, error } => write!(f, "{var} is not a valid url: {error}"),
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative integer, got {value:?}")
            }
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "server url must use ws:// or wss://, got {scheme}://")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, `client_id` query parameter included.
    pub server_url: Url,
    pub client_id: String,
    pub throttle_window: Duration,
    pub render_scale: i32,
    pub health_url: Option<String>,
    pub health_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("GAME_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let mut server_url = Url::parse(&raw_url).map_err(|error| ConfigError::InvalidUrl {
            var: "GAME_SERVER_URL",
            error,
        })?;
        if !matches!(server_url.scheme(), "ws" | "wss") {
            return Err(ConfigError::UnsupportedScheme(server_url.scheme().to_string()));
        }

        // Servers that track rooms reject sockets without a client id.
        let client_id = lookup("GAME_CLIENT_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        server_url
            .query_pairs_mut()
            .append_pair("client_id", &client_id);

        let throttle_window = parse_millis(&lookup, "INPUT_THROTTLE_MS")?
            .unwrap_or(DEFAULT_THROTTLE_WINDOW);
        let health_timeout =
            parse_millis(&lookup, "HEALTH_TIMEOUT_MS")?.unwrap_or(DEFAULT_HEALTH_TIMEOUT);

        let render_scale = match lookup("RENDER_SCALE") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map(i32::from)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "RENDER_SCALE",
                    value,
                })?,
            None => DEFAULT_RENDER_SCALE,
        };

        let health_url = lookup("GAME_HEALTH_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            server_url,
            client_id,
            throttle_window,
            render_scale,
            health_url,
            health_timeout,
        })
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|millis| Some(Duration::from_millis(millis)))
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn when_nothing_is_set_then_defaults_apply() {
        let config = config_from(&[]).expect("defaults should parse");

        assert_eq!(config.server_url.host_str(), Some("127.0.0.1"));
        assert_eq!(config.server_url.port(), Some(8000));
        assert_eq!(config.server_url.path(), "/ws");
        assert_eq!(config.throttle_window, Duration::from_millis(100));
        assert_eq!(config.render_scale, 10);
        assert!(config.health_url.is_none());
        assert!(!config.client_id.is_empty());
    }

    #[test]
    fn when_client_id_is_set_then_it_is_added_to_the_query() {
        let config = config_from(&[("GAME_CLIENT_ID", "user1")]).expect("config");

        assert_eq!(config.client_id, "user1");
        assert_eq!(config.server_url.query(), Some("client_id=user1"));
    }

    #[test]
    fn when_throttle_is_not_a_number_then_returns_invalid_number() {
        let result = config_from(&[("INPUT_THROTTLE_MS", "fast")]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                var: "INPUT_THROTTLE_MS",
                ..
            })
        ));
    }

    #[test]
    fn when_server_url_uses_http_then_returns_unsupported_scheme() {
        let result = config_from(&[("GAME_SERVER_URL", "http://127.0.0.1:8000/ws")]);

        assert!(matches!(result, Err(ConfigError::UnsupportedScheme(_))));
    }

    #[test]
    fn when_server_url_is_garbage_then_returns_invalid_url() {
        let result = config_from(&[("GAME_SERVER_URL", "::not a url::")]);

        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn when_render_scale_is_set_then_it_overrides_default() {
        let config = config_from(&[("RENDER_SCALE", "4"), ("INPUT_THROTTLE_MS", "250")])
            .expect("config");

        assert_eq!(config.render_scale, 4);
        assert_eq!(config.throttle_window, Duration::from_millis(250));
    }
}
