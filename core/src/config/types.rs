use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mothership: MothershipConfig,

    #[serde(default)]
    pub datastore: DataStoreConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MothershipConfig {
    #[serde(default = "default_mothership_host")]
    pub host: String,

    #[serde(default = "default_mothership_port")]
    pub port: u16,

    /// Per-request timeout for both fetch and post.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,

    /// Response bodies larger than this are rejected.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_mothership_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mothership_port() -> u16 {
    8080
}

fn default_http_timeout_ms() -> u64 {
    30_000
}

fn default_max_response_bytes() -> usize {
    1024 * 1024
}

impl Default for MothershipConfig {
    fn default() -> Self {
        Self {
            host: default_mothership_host(),
            port: default_mothership_port(),
            timeout_ms: default_http_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl MothershipConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host.trim(), self.port)
    }

    /// Applies a `host:port` address. A bare host keeps the current port.
    pub fn set_address(&mut self, addr: &str) -> Result<(), ConfigurationError> {
        let addr = addr.trim();
        match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    ConfigurationError::Invalid(format!("invalid mothership port in {addr:?}"))
                })?;
                if host.is_empty() {
                    return Err(ConfigurationError::Invalid(format!(
                        "missing mothership host in {addr:?}"
                    )));
                }
                self.host = host.to_string();
                self.port = port;
            }
            None => {
                if addr.is_empty() {
                    return Err(ConfigurationError::Invalid(
                        "empty mothership address".to_string(),
                    ));
                }
                self.host = addr.to_string();
            }
        }
        Ok(())
    }
}

/// Backing stores the agent knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStoreKind {
    Athena,
}

impl DataStoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataStoreKind::Athena => "ATHENA",
        }
    }
}

impl fmt::Display for DataStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataStoreKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ATHENA" => Ok(DataStoreKind::Athena),
            _ => Err(ConfigurationError::UnsupportedStoreKind(s.to_string())),
        }
    }
}

/// Connection parameters for the query delegate.
///
/// `kind` stays a plain string here; it is checked when the delegate is
/// built so an unknown kind fails startup with a configuration error.
#[derive(Clone, Serialize, Deserialize)]
pub struct DataStoreConfig {
    #[serde(default = "default_datastore_kind")]
    pub kind: String,

    #[serde(default = "default_region_name")]
    pub region_name: String,

    #[serde(default)]
    pub aws_access_key_id: String,

    #[serde(default)]
    pub aws_secret_access_key: String,

    /// Query output location, e.g. `s3://bucket/folder`.
    #[serde(default)]
    pub s3_staging_dir: String,

    /// Target schema.
    #[serde(default = "default_dbname")]
    pub dbname: String,

    #[serde(default)]
    pub workgroup: Option<String>,

    /// Overrides the regional endpoint (VPC endpoints, local emulators).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_datastore_kind() -> String {
    DataStoreKind::Athena.as_str().to_string()
}

fn default_region_name() -> String {
    "us-west-2".to_string()
}

fn default_dbname() -> String {
    "default".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_query_timeout_ms() -> u64 {
    300_000
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            kind: default_datastore_kind(),
            region_name: default_region_name(),
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            s3_staging_dir: String::new(),
            dbname: default_dbname(),
            workgroup: None,
            endpoint_url: None,
            poll_interval_ms: default_poll_interval_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

// Hand-written so the secret never reaches a log line.
impl fmt::Debug for DataStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStoreConfig")
            .field("kind", &self.kind)
            .field("region_name", &self.region_name)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("s3_staging_dir", &self.s3_staging_dir)
            .field("dbname", &self.dbname)
            .field("workgroup", &self.workgroup)
            .field("endpoint_url", &self.endpoint_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("query_timeout_ms", &self.query_timeout_ms)
            .finish()
    }
}

impl DataStoreConfig {
    pub fn kind(&self) -> Result<DataStoreKind, ConfigurationError> {
        self.kind.parse()
    }

    /// Static credentials, when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        let id = self.aws_access_key_id.trim();
        let secret = self.aws_secret_access_key.trim();
        if id.is_empty() || secret.is_empty() {
            None
        } else {
            Some((id, secret))
        }
    }

    pub fn workgroup(&self) -> Option<&str> {
        non_blank(self.workgroup.as_deref())
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        non_blank(self.endpoint_url.as_deref())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock spacing between cycle starts.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Run budget used when no duration argument is given.
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
}

fn default_interval_ms() -> u64 {
    2_000
}

fn default_duration_secs() -> u64 {
    3_600
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            default_duration_secs: default_duration_secs(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.interval_ms == 0 {
            return Err(ConfigurationError::Invalid(
                "runner.interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "dbagent_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
