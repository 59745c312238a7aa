use crate::utils::error::{BridgeError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BridgeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BridgeError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BridgeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BridgeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
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
        return Err(BridgeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| BridgeError::MissingConfig {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("github.api_host", "https://api.github.com").is_ok());
        assert!(validate_url("gitlab.host", "http://gitlab.example.com").is_ok());
        assert!(validate_url("gitlab.host", "").is_err());
        assert!(validate_url("gitlab.host", "not-a-url").is_err());
        assert!(validate_url("gitlab.host", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("http.concurrent_requests", 5, 1).is_ok());
        assert!(validate_positive_number("http.concurrent_requests", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("http.per_page", 100, 1, 100).is_ok());
        assert!(validate_range("http.per_page", 0, 1, 100).is_err());
        assert!(validate_range("http.per_page", 101, 1, 100).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("gitlab".to_string());
        assert!(validate_required_field("backend.provider", &present).is_ok());

        let absent: Option<String> = None;
        assert!(validate_required_field("backend.provider", &absent).is_err());
    }
}
