use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::audit::AuditSettings;
use crate::core::editor::EDITOR_BASE_URL;
use crate::utils::error::{OscError, Result};
use crate::utils::validation::{
    validate_domain_patterns, validate_positive_number, validate_range, validate_url, Validate,
};

/// Optional TOML configuration for the audit tooling.
///
/// ```toml
/// [audit]
/// timeout_seconds = 5
/// max_asset_checks = 10
/// seed = 123
///
/// [domains]
/// data = ["*.esa.int", "zenodo.org"]
/// metadata = ["*.esa.int"]
///
/// [editor]
/// base_url = "https://workspace.example.org/osc-editor"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub audit: Option<AuditSection>,
    pub domains: Option<DomainsSection>,
    pub editor: Option<EditorSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSection {
    pub timeout_seconds: Option<u64>,
    pub max_asset_checks: Option<usize>,
    pub seed: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainsSection {
    pub data: Option<Vec<String>>,
    pub metadata: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorSection {
    pub base_url: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OscError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OscError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` placeholders from the environment; unknown
    /// variables stay as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Merge the file's audit section over the built-in defaults.
    pub fn audit_settings(&self) -> AuditSettings {
        let mut settings = AuditSettings::default();

        if let Some(audit) = &self.audit {
            if let Some(timeout) = audit.timeout_seconds {
                settings.timeout = Duration::from_secs(timeout);
            }
            if let Some(max_checks) = audit.max_asset_checks {
                settings.max_asset_checks = max_checks;
            }
            if audit.seed.is_some() {
                settings.seed = audit.seed;
            }
            if let Some(user_agent) = &audit.user_agent {
                settings.user_agent = user_agent.clone();
            }
        }
        if let Some(domains) = &self.domains {
            if let Some(data) = &domains.data {
                settings.approved_data_domains = data.clone();
            }
            if let Some(metadata) = &domains.metadata {
                settings.approved_metadata_domains = metadata.clone();
            }
        }

        settings
    }

    pub fn editor_base_url(&self) -> &str {
        self.editor
            .as_ref()
            .and_then(|e| e.base_url.as_deref())
            .unwrap_or(EDITOR_BASE_URL)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(audit) = &self.audit {
            if let Some(timeout) = audit.timeout_seconds {
                validate_range("audit.timeout_seconds", timeout, 1, 300)?;
            }
            if let Some(max_checks) = audit.max_asset_checks {
                validate_positive_number("audit.max_asset_checks", max_checks, 1)?;
            }
        }
        if let Some(domains) = &self.domains {
            if let Some(data) = &domains.data {
                validate_domain_patterns("domains.data", data)?;
            }
            if let Some(metadata) = &domains.metadata {
                validate_domain_patterns("domains.metadata", metadata)?;
            }
        }
        validate_url("editor.base_url", self.editor_base_url())?;
        Ok(())
    }
}
