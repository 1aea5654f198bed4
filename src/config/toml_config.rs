use crate::adapters::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::ConfigProvider;
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub provider: ProviderSection,
    #[serde(default)]
    pub directory: DirectorySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySection {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_origins() -> Vec<String> {
    vec![
        "https://hair-analyzer-mern.vercel.app".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_body_limit_mb() -> usize {
    15
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_csv_path() -> String {
    "data/zocdoc.csv".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_origins(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdvisorError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.server.host
    }

    fn port(&self) -> u16 {
        self.server.port
    }

    fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.provider.model
    }

    fn provider_base_url(&self) -> &str {
        &self.provider.base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.provider.retry_attempts
    }

    fn doctors_csv(&self) -> &str {
        &self.directory.csv_path
    }

    fn allowed_origins(&self) -> &[String] {
        &self.server.allowed_origins
    }

    fn body_limit_bytes(&self) -> usize {
        self.server.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        super::validate_provider_settings(self)?;
        crate::utils::validation::validate_range(
            "provider.timeout_seconds",
            self.provider.timeout_seconds,
            1,
            300,
        )?;
        crate::utils::validation::validate_range(
            "server.body_limit_mb",
            self.server.body_limit_mb,
            1,
            super::MAX_BODY_LIMIT_MB,
        )?;
        Ok(())
    }
}
