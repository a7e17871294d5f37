use crate::utils::error::{OscError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(OscError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Check a wildcard domain pattern list ("*.esa.int", "zenodo.org", ...).
pub fn validate_domain_patterns(field_name: &str, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        let stripped = pattern.trim();
        if stripped.is_empty() {
            return Err(OscError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: pattern.clone(),
                reason: "Domain pattern cannot be empty".to_string(),
            });
        }
        if stripped.contains("://") || stripped.contains('/') {
            return Err(OscError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: pattern.clone(),
                reason: "Domain pattern must be a hostname, not a URL".to_string(),
            });
        }
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
        return Err(OscError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("editor.base_url", "https://example.com").is_ok());
        assert!(validate_url("editor.base_url", "http://example.com").is_ok());
        assert!(validate_url("editor.base_url", "").is_err());
        assert!(validate_url("editor.base_url", "invalid-url").is_err());
        assert!(validate_url("editor.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("audit.max_asset_checks", 5, 1).is_ok());
        assert!(validate_positive_number("audit.max_asset_checks", 0, 1).is_err());
    }

    #[test]
    fn test_validate_domain_patterns() {
        let ok = vec!["*.esa.int".to_string(), "zenodo.org".to_string()];
        assert!(validate_domain_patterns("domains.data", &ok).is_ok());

        let url_like = vec!["https://zenodo.org".to_string()];
        assert!(validate_domain_patterns("domains.data", &url_like).is_err());

        let empty = vec!["  ".to_string()];
        assert!(validate_domain_patterns("domains.data", &empty).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("audit.timeout_seconds", 5u64, 1, 300).is_ok());
        assert!(validate_range("audit.timeout_seconds", 0u64, 1, 300).is_err());
    }
}
