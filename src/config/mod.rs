#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::ServerConfig;
pub use toml_config::TomlConfig;

use crate::core::ConfigProvider;
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_origins, validate_path,
    validate_range, validate_required_field, validate_url,
};

/// Upper bound for the request body limit, in MiB.
pub const MAX_BODY_LIMIT_MB: usize = 1024;

/// Checks shared by every configuration source.
pub(crate) fn validate_provider_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    let api_key = config.api_key().map(str::to_string);
    let api_key = validate_required_field("api_key", &api_key)?;
    validate_non_empty_string("api_key", api_key)?;
    // An unresolved `${GEMINI_API_KEY}` placeholder means the variable was not set.
    if api_key.starts_with("${") {
        return Err(AdvisorError::MissingConfigError {
            field: "api_key".to_string(),
        });
    }

    validate_non_empty_string("host", config.host())?;
    validate_range("port", config.port(), 1, u16::MAX)?;
    validate_non_empty_string("model", config.model())?;
    validate_url("provider_base_url", config.provider_base_url())?;
    validate_range("retry_attempts", config.retry_attempts(), 0, 1)?;
    validate_path("doctors_csv", config.doctors_csv())?;
    validate_file_extension("doctors_csv", config.doctors_csv(), &["csv"])?;
    validate_origins("allowed_origins", config.allowed_origins())?;

    Ok(())
}
