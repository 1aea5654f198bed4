use crate::utils::error::{AdvisorError, Result};
use axum::http::HeaderValue;
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AdvisorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| AdvisorError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AdvisorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// CORS origins must be usable as `Access-Control-Allow-Origin` values and
/// spelled exactly as a browser sends them in the `Origin` header.
pub fn validate_origins(field_name: &str, origins: &[String]) -> Result<()> {
    for origin in origins {
        validate_url(field_name, origin)?;
        let serialized = Url::parse(origin)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_default();
        if serialized != *origin {
            return Err(AdvisorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: origin.clone(),
                reason: format!(
                    "Origin must be scheme://host[:port] with no path or trailing slash (expected '{}')",
                    serialized
                ),
            });
        }
        if HeaderValue::from_str(origin).is_err() {
            return Err(AdvisorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: origin.clone(),
                reason: "Origin is not a valid header value".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("provider_base_url", "https://example.com").is_ok());
        assert!(validate_url("provider_base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("provider_base_url", "").is_err());
        assert!(validate_url("provider_base_url", "invalid-url").is_err());
        assert!(validate_url("provider_base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("retry_attempts", 1u32, 0, 1).is_ok());
        assert!(validate_range("retry_attempts", 2u32, 0, 1).is_err());
        assert!(validate_range("timeout_seconds", 0u64, 1, 300).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("doctors_csv", "data/zocdoc.csv", &["csv"]).is_ok());
        assert!(validate_file_extension("doctors_csv", "data/ZOCDOC.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("doctors_csv", "data/zocdoc.txt", &["csv"]).is_err());
        assert!(validate_file_extension("doctors_csv", "data/zocdoc", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_origins() {
        let origins = vec![
            "https://hair-analyzer-mern.vercel.app".to_string(),
            "http://localhost:5173".to_string(),
        ];
        assert!(validate_origins("allowed_origins", &origins).is_ok());
        assert!(validate_origins("allowed_origins", &["localhost".to_string()]).is_err());

        for rejected in [
            "https://hair-analyzer-mern.vercel.app/",
            "https://hair-analyzer-mern.vercel.app/app",
            "https://hair-analyzer-mern.vercel.app:443",
        ] {
            assert!(
                validate_origins("allowed_origins", &[rejected.to_string()]).is_err(),
                "{rejected}"
            );
        }
    }

    #[test]
    fn test_validate_required_field() {
        let key: Option<String> = None;
        assert!(matches!(
            validate_required_field("api_key", &key),
            Err(AdvisorError::MissingConfigError { .. })
        ));
        let key = Some("abc".to_string());
        assert_eq!(validate_required_field("api_key", &key).unwrap(), "abc");
    }
}
