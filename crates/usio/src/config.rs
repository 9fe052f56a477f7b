use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use usio_engine::EngineConfig;
use usio_transport::SerialConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sr90_automation/usio.conf";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can't read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("can't decode config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Daemon settings, read from a TOML file.
///
/// Keys are snake_case; the capitalised spellings of older config files
/// (`Uart_dev`, `Responce_timeout`, ...) are accepted too.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DaemonConfig {
    /// Serial device path.
    #[serde(alias = "Uart_dev")]
    pub uart_dev: PathBuf,

    /// Baud rate; an integer or a decimal string.
    #[serde(alias = "Uart_speed", deserialize_with = "baud_rate")]
    pub uart_speed: u32,

    /// Per-attempt response timeout, in milliseconds.
    #[serde(alias = "Responce_timeout", default = "default_response_timeout")]
    pub response_timeout: u64,

    /// Attempts per controller operation.
    #[serde(alias = "Repeate_count", default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Working directory of the action script.
    #[serde(alias = "Exec_path", default = "default_exec_path")]
    pub exec_path: PathBuf,

    /// Script run on controller events.
    #[serde(alias = "Exec_script", default, deserialize_with = "optional_path")]
    pub exec_script: Option<PathBuf>,

    /// Control socket path.
    #[serde(alias = "Control_socket")]
    pub control_socket: PathBuf,

    /// Drop unclaimed sentences older than this many milliseconds.
    #[serde(default)]
    pub pending_max_age: Option<u64>,

    /// Outgoing command queue capacity.
    #[serde(default = "default_tx_queue_capacity")]
    pub tx_queue_capacity: usize,
}

fn default_response_timeout() -> u64 {
    500
}

fn default_repeat_count() -> u32 {
    3
}

fn default_exec_path() -> PathBuf {
    PathBuf::from("/")
}

fn default_tx_queue_capacity() -> usize {
    16
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BaudValue {
    Number(u32),
    Text(String),
}

fn baud_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match BaudValue::deserialize(deserializer)? {
        BaudValue::Number(rate) => Ok(rate),
        BaudValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid baud rate {text:?}"))),
    }
}

// An empty string means no script.
fn optional_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from))
}

impl DaemonConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repeat_count == 0 {
            return Err(ConfigError::Invalid(
                "repeat_count must be at least 1".to_string(),
            ));
        }
        if self.tx_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "tx_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.uart_speed == 0 {
            return Err(ConfigError::Invalid("uart_speed must be positive".to_string()));
        }
        if self.uart_dev.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("uart_dev is empty".to_string()));
        }
        if self.control_socket.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("control_socket is empty".to_string()));
        }
        Ok(())
    }

    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::new(self.uart_dev.clone(), self.uart_speed)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            response_timeout: (self.response_timeout > 0)
                .then(|| Duration::from_millis(self.response_timeout)),
            attempts: self.repeat_count,
            tx_queue_capacity: self.tx_queue_capacity,
            pending_max_age: self.pending_max_age.map(Duration::from_millis),
            ..EngineConfig::default()
        }
    }
}
