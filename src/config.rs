use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::ClientError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6606;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// Environment overrides
pub const ENV_CONFIG: &str = "NOTIFICATIOND_CONFIG";
pub const ENV_HOST: &str = "NOTIFICATIOND_HOST";
pub const ENV_HOST_FALLBACK: &str = "HOST";
pub const ENV_PORT: &str = "NOTIFICATIOND_PORT";
pub const ENV_TIMEOUT: &str = "NOTIFICATIOND_TIMEOUT";

/// Host and port of a notificationd server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl Endpoint {
	pub fn new(host: &str, port: u16) -> Self {
		Endpoint {
			host: host.to_string(),
			port,
		}
	}
}

impl Default for Endpoint {
	fn default() -> Self {
		Endpoint::new(DEFAULT_HOST, DEFAULT_PORT)
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Connection settings shared by sends and subscriptions
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
	pub endpoint: Endpoint,
	pub connect_timeout: Duration,
	pub read_timeout: Duration,
	pub write_timeout: Duration,
	/// Read timeout of a subscription once consume mode is active. `None` waits forever.
	pub idle_timeout: Option<Duration>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		ClientConfig {
			endpoint: Endpoint::default(),
			connect_timeout: DEFAULT_TIMEOUT,
			read_timeout: DEFAULT_TIMEOUT,
			write_timeout: DEFAULT_TIMEOUT,
			idle_timeout: None,
		}
	}
}

// On-disk representation, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
	host: Option<String>,
	port: Option<u16>,
	connect_timeout_secs: Option<u64>,
	read_timeout_secs: Option<u64>,
	write_timeout_secs: Option<u64>,
	idle_timeout_secs: Option<u64>,
}

impl ClientConfig {
	pub fn new(host: &str, port: u16) -> Self {
		ClientConfig {
			endpoint: Endpoint::new(host, port),
			..ClientConfig::default()
		}
	}

	/// Set connect, read and write timeouts at once
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;
		self.read_timeout = timeout;
		self.write_timeout = timeout;
		self
	}

	pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.idle_timeout = timeout;
		self
	}

	/// Parse a JSON document on top of the defaults
	pub fn from_json(input: &str) -> Result<Self, ClientError> {
		let file: ConfigFile = serde_json::from_str(input)
			.map_err(|e| ClientError::Config(format!("invalid config: {}", e)))?;

		let mut config = ClientConfig::default();
		config.merge(file)?;
		Ok(config)
	}

	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
		let path = path.as_ref();
		let input = fs::read_to_string(path).map_err(|e| {
			ClientError::Config(format!("failed to read {}: {}", path.display(), e))
		})?;

		debug!("Loaded client config from {}", path.display());
		Self::from_json(&input)
	}

	/// Defaults, then the file named by `NOTIFICATIOND_CONFIG`, then environment overrides
	pub fn load() -> Result<Self, ClientError> {
		let config = match env::var(ENV_CONFIG) {
			Ok(path) if !path.is_empty() => Self::from_path(path)?,
			_ => ClientConfig::default(),
		};

		config.apply_env_with(|key| env::var(key).ok())
	}

	/// Apply environment overrides read through `lookup`
	pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ClientError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		if let Some(host) = non_empty(ENV_HOST).or_else(|| non_empty(ENV_HOST_FALLBACK)) {
			self.endpoint.host = host.trim().to_string();
		}

		if let Some(port) = non_empty(ENV_PORT) {
			self.endpoint.port = port
				.trim()
				.parse::<u16>()
				.map_err(|e| ClientError::Config(format!("{}={:?}: {}", ENV_PORT, port, e)))?;
		}

		if let Some(secs) = non_empty(ENV_TIMEOUT) {
			let secs = secs
				.trim()
				.parse::<u64>()
				.map_err(|e| ClientError::Config(format!("{}={:?}: {}", ENV_TIMEOUT, secs, e)))?;
			self = self.with_timeout(positive_secs(ENV_TIMEOUT, secs)?);
		}

		Ok(self)
	}

	fn merge(&mut self, file: ConfigFile) -> Result<(), ClientError> {
		if let Some(host) = file.host {
			if host.trim().is_empty() {
				return Err(ClientError::Config("host must not be empty".to_string()));
			}
			self.endpoint.host = host;
		}
		if let Some(port) = file.port {
			self.endpoint.port = port;
		}
		if let Some(secs) = file.connect_timeout_secs {
			self.connect_timeout = positive_secs("connect_timeout_secs", secs)?;
		}
		if let Some(secs) = file.read_timeout_secs {
			self.read_timeout = positive_secs("read_timeout_secs", secs)?;
		}
		if let Some(secs) = file.write_timeout_secs {
			self.write_timeout = positive_secs("write_timeout_secs", secs)?;
		}
		if let Some(secs) = file.idle_timeout_secs {
			self.idle_timeout = Some(positive_secs("idle_timeout_secs", secs)?);
		}
		Ok(())
	}
}

// A zero socket timeout is rejected by std, so catch it here
fn positive_secs(key: &str, secs: u64) -> Result<Duration, ClientError> {
	if secs == 0 {
		return Err(ClientError::Config(format!("{} must be greater than zero", key)));
	}
	Ok(Duration::from_secs(secs))
}
