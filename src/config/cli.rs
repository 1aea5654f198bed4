use crate::adapters::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "scalp-advisor")]
#[command(about = "Scalp photo analysis relay and dermatologist directory service")]
pub struct ServerConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub provider_base_url: String,

    #[arg(long, default_value = "30", help = "Provider call timeout")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "1", help = "Retries for transient provider failures (0 or 1)")]
    pub retry_attempts: u32,

    #[arg(long, env = "DOCTORS_CSV", default_value = "data/zocdoc.csv")]
    pub doctors_csv: String,

    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "https://hair-analyzer-mern.vercel.app,http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long, default_value = "15")]
    pub body_limit_mb: usize,

    #[arg(long, short, help = "TOML configuration file; replaces the flags above")]
    pub config: Option<String>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for ServerConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_base_url(&self) -> &str {
        &self.provider_base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn doctors_csv(&self) -> &str {
        &self.doctors_csv
    }

    fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        super::validate_provider_settings(self)?;
        crate::utils::validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        crate::utils::validation::validate_range(
            "body_limit_mb",
            self.body_limit_mb,
            1,
            super::MAX_BODY_LIMIT_MB,
        )?;
        Ok(())
    }
}
