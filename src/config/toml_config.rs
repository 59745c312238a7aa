use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub backend: BackendSection,
    pub github: Option<GitHubSection>,
    pub gitlab: Option<GitLabSection>,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSection {
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSection {
    #[serde(default = "default_github_api_host")]
    pub api_host: String,
    #[serde(default = "default_github_oauth_host")]
    pub oauth_host: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            api_host: default_github_api_host(),
            oauth_host: default_github_oauth_host(),
            client_id: None,
            client_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabSection {
    pub host: String,
    pub group: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            concurrent_requests: default_concurrent_requests(),
            per_page: default_per_page(),
        }
    }
}

fn default_github_api_host() -> String {
    "https://api.github.com".to_string()
}

fn default_github_oauth_host() -> String {
    "https://github.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_concurrent_requests() -> usize {
    5
}

fn default_per_page() -> usize {
    100
}

impl BridgeConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| BridgeError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` placeholders with environment variable values.
    ///
    /// Unset variables are left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl Validate for BridgeConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("backend.provider", &self.backend.provider)?;

        match self.backend.provider.to_ascii_lowercase().as_str() {
            "github" => {
                let github = self.github.clone().unwrap_or_default();
                validation::validate_url("github.api_host", &github.api_host)?;
                validation::validate_url("github.oauth_host", &github.oauth_host)?;
            }
            "gitlab" => {
                let gitlab = validation::validate_required_field("gitlab", &self.gitlab)?;
                validation::validate_url("gitlab.host", &gitlab.host)?;
                validation::validate_non_empty_string("gitlab.group", &gitlab.group)?;
                validation::validate_non_empty_string("gitlab.name", &gitlab.name)?;
            }
            other => {
                return Err(BridgeError::InvalidConfigValue {
                    field: "backend.provider".to_string(),
                    value: other.to_string(),
                    reason: "expected \"github\" or \"gitlab\"".to_string(),
                });
            }
        }

        validation::validate_positive_number(
            "http.timeout_seconds",
            self.http.timeout_seconds as usize,
            1,
        )?;
        validation::validate_positive_number(
            "http.concurrent_requests",
            self.http.concurrent_requests,
            1,
        )?;
        // GitLab caps per_page at 100.
        validation::validate_range("http.per_page", self.http.per_page, 1, 100)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_gitlab_config() {
        let toml_str = r#"
            [backend]
            provider = "gitlab"

            [gitlab]
            host = "https://gitlab.example.com"
            group = "notes"
            name = "snippets"

            [http]
            timeout_seconds = 30
            concurrent_requests = 8
            per_page = 50
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.backend.provider, "gitlab");
        let gitlab = config.gitlab.as_ref().unwrap();
        assert_eq!(gitlab.host, "https://gitlab.example.com");
        assert_eq!(gitlab.group, "notes");
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.http.per_page, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_github_defaults_apply() {
        let toml_str = r#"
            [backend]
            provider = "github"

            [github]
            client_id = "abc"
            client_secret = "def"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        let github = config.github.as_ref().unwrap();
        assert_eq!(github.api_host, "https://api.github.com");
        assert_eq!(github.oauth_host, "https://github.com");
        assert_eq!(config.http.timeout_seconds, 20);
        assert_eq!(config.http.concurrent_requests, 5);
        assert_eq!(config.http.per_page, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_github_section_may_be_omitted_entirely() {
        let toml_str = r#"
            [backend]
            provider = "github"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        assert!(config.github.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GIST_BRIDGE_TEST_GROUP", "substituted");

        let toml_str = r#"
            [backend]
            provider = "gitlab"

            [gitlab]
            host = "https://gitlab.example.com"
            group = "${GIST_BRIDGE_TEST_GROUP}"
            name = "snippets"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.gitlab.as_ref().unwrap().group, "substituted");
    }

    #[test]
    fn test_unset_env_var_is_left_as_placeholder() {
        let toml_str = r#"
            [backend]
            provider = "gitlab"

            [gitlab]
            host = "https://gitlab.example.com"
            group = "${GIST_BRIDGE_UNSET_VAR}"
            name = "snippets"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(
            config.gitlab.as_ref().unwrap().group,
            "${GIST_BRIDGE_UNSET_VAR}"
        );
    }

    #[test]
    fn test_unknown_provider_fails_validation() {
        let toml_str = r#"
            [backend]
            provider = "bitbucket"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_gitlab_provider_requires_gitlab_section() {
        let toml_str = r#"
            [backend]
            provider = "gitlab"
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BridgeError::MissingConfig { .. }));
    }

    #[test]
    fn test_per_page_out_of_range_fails_validation() {
        let toml_str = r#"
            [backend]
            provider = "github"

            [http]
            per_page = 200
        "#;

        let config = BridgeConfig::from_toml_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
                [backend]
                provider = "github"
            "#
        )
        .unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend.provider, "github");
    }

    #[test]
    fn test_invalid_toml_reports_config_error() {
        let err = BridgeConfig::from_toml_str("backend = not toml").unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
    }
}
