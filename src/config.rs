//! Configuration management for prompt-relay.
//!
//! Configuration is read once at startup from a JSON file (default
//! `config.json`, override with `RELAY_CONFIG`). Recognized keys:
//! - `api_key` - Required. OpenRouter API key.
//! - `huggingface_api_key` - Optional. Enables `/describe_image`.
//! - `default_model` - Model used when a session has not picked one.
//! - `default_persona` - Persona used when a session has not picked one.
//! - `personas` - Map of persona name to instruction text.
//! - `working_directory` - Directory for `/run`, `/show` and downloads.
//! - `allowed_commands` - Program names `/run` may execute.
//!
//! A few environment variables override the file:
//! - `OPENROUTER_API_KEY`, `HOST`, `PORT`, `WORKING_DIRECTORY`,
//!   `REQUEST_TIMEOUT_SECS`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instruction used when no persona map entry matches and none is configured.
pub const FALLBACK_PERSONA_INSTRUCTION: &str = "You are an advanced AI assistant.";

/// Prefix of the placeholder values written into a fresh config template.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found at {0}; a default template was written there, edit it and restart")]
    NotFound(String),

    #[error("Failed to access {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(String, #[source] serde_json::Error),

    #[error("Missing required setting: {0}")]
    MissingValue(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Immutable server configuration, shared by every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenRouter API key
    #[serde(default)]
    pub api_key: String,

    /// Hugging Face inference key for image captioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface_api_key: Option<String>,

    /// Default LLM model identifier (OpenRouter format)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Name of the persona sessions start with
    #[serde(default = "default_persona")]
    pub default_persona: String,

    /// Persona name to system instruction
    #[serde(default = "default_personas")]
    pub personas: HashMap<String, String>,

    /// Directory files are produced in and downloaded from
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    /// Program names `/run` is allowed to start
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on one outbound LLM call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on one `/run` command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Base URL of the OpenRouter-compatible API
    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,

    /// Base URL of the Hugging Face inference API
    #[serde(default = "default_huggingface_base_url")]
    pub huggingface_base_url: String,

    /// Captioning model used by `/describe_image`
    #[serde(default = "default_huggingface_model")]
    pub huggingface_model: String,
}

fn default_model() -> String {
    "mistralai/mistral-7b-instruct".to_string()
}

fn default_persona() -> String {
    "autonomous assistant".to_string()
}

fn default_personas() -> HashMap<String, String> {
    HashMap::from([(default_persona(), FALLBACK_PERSONA_INSTRUCTION.to_string())])
}

fn default_working_directory() -> PathBuf {
    PathBuf::from("./jha2_workspace")
}

fn default_allowed_commands() -> Vec<String> {
    [
        "ls", "pwd", "cat", "echo", "mkdir", "touch", "rm", "cp", "mv", "python", "node", "git",
        "grep", "find",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_command_timeout_secs() -> u64 {
    25
}

fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_huggingface_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_huggingface_model() -> String {
    "Salesforce/blip-image-captioning-large".to_string()
}

impl Config {
    /// Load configuration from the file named by `RELAY_CONFIG`
    /// (or `config.json`), then apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("RELAY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"));
        let mut config = Self::load(&path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a config file without environment overrides or validation.
    ///
    /// A missing file gets a default template written in its place and is
    /// reported as [`ConfigError::NotFound`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::write_template(path)?;
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(display.clone(), e))?;
        Self::from_json(&contents).map_err(|e| ConfigError::Parse(display, e))
    }

    /// Parse configuration from a JSON document.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    fn write_template(path: &Path) -> Result<(), ConfigError> {
        let mut template = Self::new(
            "YOUR_OPENROUTER_API_KEY".to_string(),
            default_model(),
            default_working_directory(),
        );
        template.huggingface_api_key = Some("YOUR_HUGGINGFACE_API_KEY".to_string());
        let json = serde_json::to_string_pretty(&template)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e))?;
        std::fs::write(path, json).map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        tracing::info!("Default config written to {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            self.api_key = key;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;
        }
        if let Ok(dir) = std::env::var("WORKING_DIRECTORY") {
            self.working_directory = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse().map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;
        }
        Ok(())
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_unset(&self.api_key) {
            return Err(ConfigError::MissingValue("api_key".to_string()));
        }
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::MissingValue("default_model".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Create the working directory if it does not exist yet.
    pub fn prepare_workspace(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.working_directory)
            .map_err(|e| ConfigError::Io(self.working_directory.display().to_string(), e))?;
        if !self.working_directory.is_dir() {
            return Err(ConfigError::InvalidValue(
                "working_directory".to_string(),
                format!("{} is not a directory", self.working_directory.display()),
            ));
        }
        Ok(())
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, working_directory: PathBuf) -> Self {
        Self {
            api_key,
            huggingface_api_key: None,
            default_model,
            default_persona: default_persona(),
            personas: default_personas(),
            working_directory,
            allowed_commands: default_allowed_commands(),
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            openrouter_base_url: default_openrouter_base_url(),
            huggingface_base_url: default_huggingface_base_url(),
            huggingface_model: default_huggingface_model(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Resolve a persona name to its instruction text.
    ///
    /// Names missing from `personas` are used verbatim as the instruction.
    pub fn persona_instruction(&self, name: &str) -> String {
        self.personas
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// The Hugging Face key, if one is configured and not a placeholder.
    pub fn huggingface_key(&self) -> Option<&str> {
        self.huggingface_api_key
            .as_deref()
            .filter(|key| !is_unset(key))
    }

    pub fn is_command_allowed(&self, program: &str) -> bool {
        self.allowed_commands.iter().any(|c| c == program)
    }
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_in_defaults() {
        let config = Config::from_json(r#"{"api_key": "sk-or-test"}"#).expect("parse");
        assert_eq!(config.default_model, "mistralai/mistral-7b-instruct");
        assert_eq!(config.default_persona, "autonomous assistant");
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.is_command_allowed("ls"));
        assert!(!config.is_command_allowed("bash"));
        config.validate().expect("valid");
    }

    #[test]
    fn placeholder_api_key_is_rejected() {
        let config = Config::from_json(r#"{"api_key": "YOUR_OPENROUTER_API_KEY"}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue(ref key)) if key == "api_key"
        ));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = Config::from_json("{}").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::new("k".into(), "m".into(), PathBuf::from("."));
        config.request_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn unknown_persona_is_its_own_instruction() {
        let config = Config::new("k".into(), "m".into(), PathBuf::from("."));
        assert_eq!(
            config.persona_instruction("autonomous assistant"),
            FALLBACK_PERSONA_INSTRUCTION
        );
        assert_eq!(config.persona_instruction("a pirate"), "a pirate");
    }

    #[test]
    fn placeholder_huggingface_key_counts_as_missing() {
        let mut config = Config::new("k".into(), "m".into(), PathBuf::from("."));
        config.huggingface_api_key = Some("YOUR_HUGGINGFACE_API_KEY".into());
        assert_eq!(config.huggingface_key(), None);
        config.huggingface_api_key = Some("hf_abc".into());
        assert_eq!(config.huggingface_key(), Some("hf_abc"));
    }

    #[test]
    fn missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(matches!(Config::load(&path), Err(ConfigError::NotFound(_))));
        let written = Config::load(&path).expect("template parses");
        assert_eq!(written.api_key, "YOUR_OPENROUTER_API_KEY");
        assert!(written.validate().is_err());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(..))));
    }
}
