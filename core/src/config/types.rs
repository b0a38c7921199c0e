use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum TransportConfig {
    #[serde(rename = "http")]
    Http(HttpTransportConfig),
    #[serde(rename = "replay")]
    Replay(ReplayTransportConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Http(HttpTransportConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_generate_path")]
    pub path: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl HttpTransportConfig {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_generate_path() -> String {
    "/api/generate-challenge-statements".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_generate_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayTransportConfig {
    pub events_file: String,

    #[serde(default = "default_replay_chunk_bytes")]
    pub chunk_bytes: usize,
}

fn default_replay_chunk_bytes() -> usize {
    512
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay applied before publishing each generated statement.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_pacing_ms() -> u64 {
    1_500
}

fn default_command_buffer() -> usize {
    16
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            pacing_ms: default_pacing_ms(),
            command_buffer: default_command_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: String,

    #[serde(default = "default_generator_config_key")]
    pub generator_config_key: String,
}

fn default_settings_path() -> String {
    dirs::home_dir()
        .map(|home| {
            home.join(".challenge-stream")
                .join("settings.json")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "settings.json".to_string())
}

fn default_generator_config_key() -> String {
    "challenge_model_config".to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
            generator_config_key: default_generator_config_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, tracing output is also written to a daily rolling file here.
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_file_prefix() -> String {
    "challenge-stream.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}
