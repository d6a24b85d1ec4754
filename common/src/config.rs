use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Indicator, MatchMode};

const MIN_POLL_INTERVAL_MS: u64 = 100;
const MIN_HTTP_TIMEOUT_MS: u64 = 1_000;
const MAX_HTTP_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("remote host is empty")]
    EmptyHost,
    #[error("remote port must be non-zero")]
    InvalidPort,
    #[error("invalid GPIO number {pin} for {indicator}")]
    InvalidPin { indicator: &'static str, pin: i32 },
    #[error("GPIO{pin} is assigned to both {first} and {second}")]
    DuplicatePin {
        pin: i32,
        first: &'static str,
        second: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    /// `None` blocks at startup until the station associates.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    pub connect_retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            connect_timeout_ms: None,
            connect_retry_delay_ms: 1_000,
        }
    }
}

impl NetworkConfig {
    pub fn has_station_credentials(&self) -> bool {
        let ssid = self.wifi_ssid.trim();
        !ssid.is_empty() && ssid != "CHANGE_ME"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "leds.example.com".to_string(),
            port: 443,
            path: "/leds.json".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn base_url(&self) -> String {
        if self.port == 443 {
            format!("https://{}", self.host)
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url(), self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndicatorPinConfig {
    pub red_pin: i32,
    pub green_pin: i32,
    pub blue_pin: i32,
}

impl Default for IndicatorPinConfig {
    fn default() -> Self {
        Self {
            red_pin: 25,
            green_pin: 26,
            blue_pin: 27,
        }
    }
}

impl IndicatorPinConfig {
    pub fn pin(&self, indicator: Indicator) -> i32 {
        match indicator {
            Indicator::Red => self.red_pin,
            Indicator::Green => self.green_pin,
            Indicator::Blue => self.blue_pin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub http_timeout_ms: u64,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            http_timeout_ms: 10_000,
            match_mode: MatchMode::Literal,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MirrorConfig {
    pub network: NetworkConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub pins: IndicatorPinConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

impl MirrorConfig {
    pub fn sanitize(&mut self) {
        self.remote.host = self.remote.host.trim().to_string();

        let path = self.remote.path.trim();
        self.remote.path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        self.poll.interval_ms = self.poll.interval_ms.max(MIN_POLL_INTERVAL_MS);
        self.poll.http_timeout_ms = self
            .poll
            .http_timeout_ms
            .clamp(MIN_HTTP_TIMEOUT_MS, MAX_HTTP_TIMEOUT_MS);
        self.network.connect_retry_delay_ms = self.network.connect_retry_delay_ms.max(100);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if self.remote.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        for indicator in Indicator::ALL {
            let pin = self.pins.pin(indicator);
            if pin < 0 {
                return Err(ConfigError::InvalidPin {
                    indicator: indicator.label(),
                    pin,
                });
            }
        }

        for (index, first) in Indicator::ALL.iter().enumerate() {
            for second in &Indicator::ALL[index + 1..] {
                if self.pins.pin(*first) == self.pins.pin(*second) {
                    return Err(ConfigError::DuplicatePin {
                        pin: self.pins.pin(*first),
                        first: first.label(),
                        second: second.label(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_fixed_constants() {
        let config = MirrorConfig::default();
        assert_eq!(config.remote.port, 443);
        assert_eq!(config.remote.path, "/leds.json");
        assert_eq!(config.poll.interval_ms, 2_000);
        assert_eq!(config.poll.match_mode, MatchMode::Literal);
        assert_eq!(config.network.connect_timeout_ms, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_omits_default_port() {
        let mut remote = RemoteConfig::default();
        assert_eq!(remote.url(), "https://leds.example.com/leds.json");

        remote.port = 8443;
        assert_eq!(remote.url(), "https://leds.example.com:8443/leds.json");
    }

    #[test]
    fn sanitize_normalizes_path_and_clamps_timings() {
        let mut config = MirrorConfig::default();
        config.remote.host = "  example.org ".to_string();
        config.remote.path = "state.json".to_string();
        config.poll.interval_ms = 0;
        config.poll.http_timeout_ms = 10;
        config.network.connect_retry_delay_ms = 0;

        config.sanitize();

        assert_eq!(config.remote.host, "example.org");
        assert_eq!(config.remote.path, "/state.json");
        assert_eq!(config.poll.interval_ms, 100);
        assert_eq!(config.poll.http_timeout_ms, 1_000);
        assert_eq!(config.network.connect_retry_delay_ms, 100);
    }

    #[test]
    fn validate_rejects_shared_pins() {
        let mut config = MirrorConfig::default();
        config.pins.blue_pin = config.pins.red_pin;

        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePin {
                pin: 25,
                first: "RED",
                second: "BLUE",
            })
        );
    }

    #[test]
    fn validate_rejects_missing_host_and_port() {
        let mut config = MirrorConfig::default();
        config.remote.host = "   ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyHost));

        let mut config = MirrorConfig::default();
        config.remote.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));

        let mut config = MirrorConfig::default();
        config.pins.green_pin = -1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPin {
                indicator: "GREEN",
                pin: -1,
            })
        );
    }

    #[test]
    fn placeholder_ssid_is_not_a_credential() {
        let mut network = NetworkConfig::default();
        assert!(!network.has_station_credentials());

        network.wifi_ssid = "CHANGE_ME".to_string();
        assert!(!network.has_station_credentials());

        network.wifi_ssid = "workshop".to_string();
        assert!(network.has_station_credentials());
    }

    #[test]
    fn deserializes_partial_config() {
        let json = r#"{
            "network": {"wifi_ssid": "lab", "wifi_pass": "secret", "connect_retry_delay_ms": 500},
            "remote": {"host": "status.local", "port": 443, "path": "/leds.json"}
        }"#;
        let config: MirrorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.network.connect_timeout_ms, None);
        assert_eq!(config.pins, IndicatorPinConfig::default());
        assert_eq!(config.poll, PollConfig::default());
    }
}
