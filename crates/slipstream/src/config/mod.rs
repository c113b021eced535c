use error::ConfigError;
use serde::{Deserialize, Serialize};
use slipwire::consts::{PAYLOAD_MAX, WINDOW_MAX, WINDOW_MIN};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod error;

const CONFIG_FILE_NAME: &str = "slipstream.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub window: WindowConfig,
    pub transfer: TransferConfig,
    pub loss: LossConfig,
}

/// Window sizes for the two engine halves.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WindowConfig {
    pub send: usize,
    pub receive: usize,
}

/// Shape of the demo transfer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    pub payload_count: usize,
    pub payload_size: usize,
}

/// Artificial loss injected into every outgoing datagram.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LossConfig {
    pub probability: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            send: 32,
            receive: 32,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            payload_count: 1024,
            payload_size: PAYLOAD_MAX,
        }
    }
}

impl Default for LossConfig {
    fn default() -> Self {
        Self { probability: 0.0 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            transfer: TransferConfig::default(),
            loss: LossConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, size) in [("send", self.window.send), ("receive", self.window.receive)] {
            if !(WINDOW_MIN..=WINDOW_MAX).contains(&size) {
                return Err(ConfigError::Validation(format!(
                    "{name} window size {size} out of range ({WINDOW_MIN}..={WINDOW_MAX})"
                )));
            }
        }

        if self.transfer.payload_count == 0 {
            return Err(ConfigError::Validation(
                "payload count must be greater than 0".to_string(),
            ));
        }

        if !(1..=PAYLOAD_MAX).contains(&self.transfer.payload_size) {
            return Err(ConfigError::Validation(format!(
                "payload size {} out of range (1..={PAYLOAD_MAX})",
                self.transfer.payload_size
            )));
        }

        if !(0.0..1.0).contains(&self.loss.probability) {
            return Err(ConfigError::Validation(format!(
                "loss probability {} out of range (0.0..1.0)",
                self.loss.probability
            )));
        }

        Ok(())
    }
}

/// Loads `slipstream.toml` from the working directory, writing the defaults
/// there first when the file does not exist yet.
pub fn handle() -> Result<Config, ConfigError> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    if config_path.exists() {
        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    } else {
        let config = Config::default();
        save(&config, &config_path)?;
        Ok(config)
    }
}

fn save(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let config_content = toml::to_string_pretty(config)?;
    let mut file = fs::File::create(path)?;
    file.write_all(config_content.as_bytes())?;
    Ok(())
}
