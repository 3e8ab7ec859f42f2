//! Dispatcher service configuration loading.
//!
//! TOML is the sole config source. Default config path:
//! `/etc/bermudafunk/dispatcher.toml` (spec.md §6 "Configuration inputs").

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct DispatcherServiceConfig {
    pub local_addr: SocketAddr,
    pub remote_addr: SocketAddr,
    pub selector_controller_number: u32,
    pub selector_position_count: u32,
    pub automat_selector_position: u32,
    pub studios: Vec<StudioConfig>,
    pub immediate_state_duration: Duration,
    pub immediate_release_duration: Duration,
    pub persistence_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub name: String,
    pub selector_position: u32,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    local_addr: Option<String>,
    remote_addr: Option<String>,
    selector: Option<RawSelectorConfig>,
    automat_selector_position: Option<u32>,
    studios: Option<Vec<RawStudioConfig>>,
    immediate_state_duration_secs: Option<u64>,
    immediate_release_duration_secs: Option<u64>,
    persistence_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSelectorConfig {
    controller_number: Option<u32>,
    position_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawStudioConfig {
    name: Option<String>,
    selector_position: Option<u32>,
}

/// Loads config from the default path `/etc/bermudafunk/dispatcher.toml`.
pub fn load_config() -> Result<DispatcherServiceConfig, ConfigError> {
    load_config_from_path(Path::new("/etc/bermudafunk/dispatcher.toml"))
}

pub fn load_config_from_path(path: &Path) -> Result<DispatcherServiceConfig, ConfigError> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("reading config file '{}': {e}", path.display())))?;
    load_config_from_str(&toml_str)
}

pub fn load_config_from_str(toml_str: &str) -> Result<DispatcherServiceConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let local_addr = raw
        .local_addr
        .ok_or_else(|| ConfigError::MissingField("local_addr".to_owned()))?
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("local_addr: {e}")))?;
    let remote_addr = raw
        .remote_addr
        .ok_or_else(|| ConfigError::MissingField("remote_addr".to_owned()))?
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("remote_addr: {e}")))?;

    let raw_selector = raw.selector.ok_or_else(|| ConfigError::MissingField("selector".to_owned()))?;
    let selector_controller_number = raw_selector
        .controller_number
        .ok_or_else(|| ConfigError::MissingField("selector.controller_number".to_owned()))?;
    let selector_position_count = raw_selector
        .position_count
        .ok_or_else(|| ConfigError::MissingField("selector.position_count".to_owned()))?;
    if selector_position_count < 2 {
        return Err(ConfigError::InvalidValue("selector.position_count must be >= 2".to_owned()));
    }

    let automat_selector_position = raw.automat_selector_position.unwrap_or(1);

    let raw_studios = raw.studios.unwrap_or_default();
    let mut studios = Vec::with_capacity(raw_studios.len());
    for (i, s) in raw_studios.into_iter().enumerate() {
        let name = s.name.ok_or_else(|| ConfigError::MissingField(format!("studios[{i}].name")))?;
        let selector_position = s
            .selector_position
            .ok_or_else(|| ConfigError::MissingField(format!("studios[{i}].selector_position")))?;
        studios.push(StudioConfig { name, selector_position });
    }

    Ok(DispatcherServiceConfig {
        local_addr,
        remote_addr,
        selector_controller_number,
        selector_position_count,
        automat_selector_position,
        studios,
        immediate_state_duration: Duration::from_secs(raw.immediate_state_duration_secs.unwrap_or(300)),
        immediate_release_duration: Duration::from_secs(raw.immediate_release_duration_secs.unwrap_or(30)),
        persistence_path: raw.persistence_path.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("state.json")),
    })
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingField(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(s) => write!(f, "IO error: {s}"),
            ConfigError::Parse(s) => write!(f, "parse error: {s}"),
            ConfigError::MissingField(s) => write!(f, "missing required field: {s}"),
            ConfigError::InvalidValue(s) => write!(f, "invalid config value: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_config_with_defaults() {
        let toml = r#"
            local_addr = "0.0.0.0:9001"
            remote_addr = "192.168.1.50:9000"

            [selector]
            controller_number = 1
            position_count = 3

            [[studios]]
            name = "studio-a"
            selector_position = 2

            [[studios]]
            name = "studio-b"
            selector_position = 3
        "#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.automat_selector_position, 1);
        assert_eq!(config.immediate_state_duration, Duration::from_secs(300));
        assert_eq!(config.immediate_release_duration, Duration::from_secs(30));
        assert_eq!(config.persistence_path, PathBuf::from("state.json"));
        assert_eq!(config.studios.len(), 2);
    }

    #[test]
    fn missing_selector_is_an_error() {
        let toml = r#"
            local_addr = "0.0.0.0:9001"
            remote_addr = "192.168.1.50:9000"
        "#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn position_count_below_two_is_rejected() {
        let toml = r#"
            local_addr = "0.0.0.0:9001"
            remote_addr = "192.168.1.50:9000"

            [selector]
            controller_number = 1
            position_count = 1
        "#;
        assert!(load_config_from_str(toml).is_err());
    }
}
