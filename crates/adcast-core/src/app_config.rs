use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory holding `campaigns.csv`, `ads.csv` and `ad_events.csv`.
    pub data_dir: PathBuf,
    /// Directory the training run writes to and the server loads from.
    pub artifact_dir: PathBuf,
    /// Optional YAML file overriding [`crate::PipelineConfig`] defaults.
    pub pipeline_path: PathBuf,
    pub rate_limit_per_minute: u32,
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("artifact_dir", &self.artifact_dir)
            .field("pipeline_path", &self.pipeline_path)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field(
                "api_keys",
                &format_args!("[{} redacted]", self.api_keys.len()),
            )
            .finish()
    }
}
