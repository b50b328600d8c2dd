use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SemanticConfig {
    #[serde(default = "default_semantic_enabled")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_health_timeout_seconds")]
    pub health_timeout_seconds: u64,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_max_hints")]
    pub max_hints: usize,
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: default_semantic_enabled(),
            base_url: default_base_url(),
            model: default_model(),
            timeout_seconds: default_timeout_seconds(),
            health_timeout_seconds: default_health_timeout_seconds(),
            confidence_threshold: default_confidence_threshold(),
            cache_capacity: default_cache_capacity(),
            max_hints: default_max_hints(),
            max_entities: default_max_entities(),
        }
    }
}

fn default_semantic_enabled() -> bool {
    true
}
fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}
fn default_model() -> String {
    "llama3.2".to_string()
}
fn default_timeout_seconds() -> u64 {
    5
}
fn default_health_timeout_seconds() -> u64 {
    2
}
fn default_confidence_threshold() -> f32 {
    0.8
}
fn default_cache_capacity() -> usize {
    100
}
fn default_max_hints() -> usize {
    10
}
fn default_max_entities() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FingerprintConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_manual_weight")]
    pub manual_weight: u32,
    #[serde(default = "default_frequency_flush_interval")]
    pub frequency_flush_interval: u32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            path: None,
            min_confidence: default_min_confidence(),
            manual_weight: default_manual_weight(),
            frequency_flush_interval: default_frequency_flush_interval(),
        }
    }
}

fn default_min_confidence() -> f64 {
    0.5
}
fn default_manual_weight() -> u32 {
    3
}
fn default_frequency_flush_interval() -> u32 {
    10
}

impl FingerprintConfig {
    /// Configured path, or `<data_dir>/voxroute/voice_fingerprint.json`.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join("voxroute").join("voice_fingerprint.json"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct PlayerConfig {
    /// playerctl player name; None lets playerctl pick the active one.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct GameConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bindings: Vec<GameBinding>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GameBinding {
    pub phrase: String,
    pub action: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Configured path, else the XDG runtime dir, else /tmp.
    pub fn resolve_socket_path(&self) -> PathBuf {
        if let Some(path) = &self.socket_path {
            return path.clone();
        }
        match dirs::runtime_dir() {
            Some(runtime_dir) => runtime_dir.join("voxrouted.sock"),
            None => PathBuf::from("/tmp/voxrouted.sock"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RateLimitConfig {
    #[serde(default = "default_commands_per_second")]
    pub commands_per_second: u32,
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity: u32,
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            commands_per_second: default_commands_per_second(),
            burst_capacity: default_burst_capacity(),
            enabled: default_rate_limit_enabled(),
        }
    }
}

fn default_commands_per_second() -> u32 {
    10
}

fn default_burst_capacity() -> u32 {
    20
}

fn default_rate_limit_enabled() -> bool {
    true
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path()?;
    load_config_from(&config_path)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    info!("Loading config from {:?}", config_path);
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

    info!("Config loaded successfully");
    Ok(config)
}

fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to get config directory")?;
    Ok(config_dir.join("voxroute").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.semantic.enabled);
        assert_eq!(config.semantic.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.semantic.model, "llama3.2");
        assert_eq!(config.semantic.timeout_seconds, 5);
        assert_eq!(config.semantic.health_timeout_seconds, 2);
        assert_eq!(config.semantic.confidence_threshold, 0.8);
        assert_eq!(config.semantic.cache_capacity, 100);
        assert_eq!(config.semantic.max_hints, 10);
        assert_eq!(config.semantic.max_entities, 50);

        assert!(config.fingerprint.path.is_none());
        assert_eq!(config.fingerprint.min_confidence, 0.5);
        assert_eq!(config.fingerprint.manual_weight, 3);
        assert_eq!(config.fingerprint.frequency_flush_interval, 10);

        assert!(config.player.name.is_none());
        assert!(!config.game.enabled);
        assert!(config.game.bindings.is_empty());
        assert!(config.server.socket_path.is_none());

        assert_eq!(config.rate_limit.commands_per_second, 10);
        assert_eq!(config.rate_limit.burst_capacity, 20);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[semantic]"));
        assert!(toml_str.contains("[fingerprint]"));
        assert!(toml_str.contains("[rate_limit]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_with_custom_values() {
        let toml_str = r#"
            [semantic]
            enabled = false
            base_url = "http://gpu-box:11434"
            model = "qwen2.5"
            timeout_seconds = 3

            [fingerprint]
            path = "/tmp/fp.json"
            manual_weight = 5

            [player]
            name = "spotify"

            [game]
            enabled = true

            [[game.bindings]]
            phrase = "boost"
            action = "key:shift"

            [server]
            socket_path = "/tmp/custom.sock"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert!(!config.semantic.enabled);
        assert_eq!(config.semantic.base_url, "http://gpu-box:11434");
        assert_eq!(config.semantic.model, "qwen2.5");
        assert_eq!(config.semantic.timeout_seconds, 3);
        assert_eq!(config.semantic.cache_capacity, 100);
        assert_eq!(config.fingerprint.path, Some(PathBuf::from("/tmp/fp.json")));
        assert_eq!(config.fingerprint.manual_weight, 5);
        assert_eq!(config.fingerprint.min_confidence, 0.5);
        assert_eq!(config.player.name.as_deref(), Some("spotify"));
        assert!(config.game.enabled);
        assert_eq!(
            config.game.bindings,
            vec![GameBinding {
                phrase: "boost".to_string(),
                action: "key:shift".to_string(),
            }]
        );
        assert_eq!(
            config.server.resolve_socket_path(),
            PathBuf::from("/tmp/custom.sock")
        );
    }

    #[test]
    fn test_config_with_missing_fields_uses_defaults() {
        let toml_str = r#"
            [semantic]
            model = "phi3"

            [rate_limit]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.semantic.model, "phi3");
        assert!(config.semantic.enabled);
        assert_eq!(config.semantic.confidence_threshold, 0.8);
        assert_eq!(config.rate_limit.commands_per_second, 10);
        assert_eq!(config.fingerprint.frequency_flush_interval, 10);
    }

    #[test]
    fn test_config_with_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid toml content [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_with_invalid_types() {
        let toml_str = r#"
            [semantic]
            timeout_seconds = "soon"
        "#;
        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_game_binding_requires_action() {
        let toml_str = r#"
            [[game.bindings]]
            phrase = "fire"
        "#;
        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_fingerprint_path_prefers_configured_value() {
        let config = FingerprintConfig {
            path: Some(PathBuf::from("/data/fp.json")),
            ..FingerprintConfig::default()
        };
        assert_eq!(config.resolve_path().unwrap(), PathBuf::from("/data/fp.json"));
    }

    #[test]
    fn test_load_config_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[semantic]\nenabled = false\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert!(!config.semantic.enabled);
    }

    #[test]
    fn test_load_config_from_broken_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[semantic\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
