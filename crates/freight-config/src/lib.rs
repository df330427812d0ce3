//! Configuration types and loader for the marketplace service.

use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
	#[serde(default)]
	pub server: ServerConfig,
	#[serde(default)]
	pub storage: StorageConfig,
	#[serde(default)]
	pub email: EmailConfig,
	#[serde(default)]
	pub live: LiveConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	3001
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
		}
	}
}

/// Which persistence backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	#[default]
	Memory,
	File,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
	#[serde(default)]
	pub backend: StorageBackend,
	/// Data directory, required for the file backend.
	pub path: Option<String>,
}

/// Which mail provider to hand messages to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailProvider {
	#[default]
	Log,
	Resend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
	#[serde(default)]
	pub provider: EmailProvider,
	pub api_key: Option<String>,
	#[serde(default = "default_email_from")]
	pub from: String,
}

fn default_email_from() -> String {
	"Freight Match <noreply@freightmatch.example>".to_string()
}

impl Default for EmailConfig {
	fn default() -> Self {
		Self {
			provider: EmailProvider::Log,
			api_key: None,
			from: default_email_from(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiveConfig {
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
	2
}

impl Default for LiveConfig {
	fn default() -> Self {
		Self {
			poll_interval_secs: default_poll_interval_secs(),
		}
	}
}

/// Configuration loader with environment variable overrides.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "FREIGHT_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads the base file if one was given, applies environment overrides,
	/// and validates the result. Without a file the defaults are used.
	pub async fn load(&self) -> Result<MarketConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			MarketConfig::default()
		};

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<MarketConfig, ConfigError> {
		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.to_string()));
		}
		let content = tokio::fs::read_to_string(file_path).await?;
		toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut MarketConfig) -> Result<(), ConfigError> {
		if let Ok(host) = env::var(format!("{}HOST", self.env_prefix)) {
			config.server.host = host;
		}

		if let Ok(port) = env::var(format!("{}PORT", self.env_prefix)) {
			config.server.port = port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid port: {}", e)))?;
		}

		if let Ok(path) = env::var(format!("{}STORAGE_PATH", self.env_prefix)) {
			config.storage.backend = StorageBackend::File;
			config.storage.path = Some(path);
		}

		if let Ok(key) = env::var(format!("{}RESEND_API_KEY", self.env_prefix)) {
			config.email.provider = EmailProvider::Resend;
			config.email.api_key = Some(key);
		}

		Ok(())
	}

	fn validate_config(&self, config: &MarketConfig) -> Result<(), ConfigError> {
		if config.storage.backend == StorageBackend::File && config.storage.path.is_none() {
			return Err(ConfigError::ValidationError(
				"File storage backend requires storage.path".to_string(),
			));
		}

		if config.email.provider == EmailProvider::Resend && config.email.api_key.is_none() {
			return Err(ConfigError::ValidationError(
				"Resend email provider requires email.api_key".to_string(),
			));
		}

		if config.live.poll_interval_secs == 0 {
			return Err(ConfigError::ValidationError(
				"live.poll_interval_secs must be at least 1".to_string(),
			));
		}

		Ok(())
	}
}
