pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

/// Command line configuration of the catalog validator.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "osc-tools")]
#[command(about = "Validate an Open Science Catalog checkout")]
pub struct CliConfig {
    /// Path to the catalog checkout root
    #[arg(default_value = "open-science-catalog-metadata")]
    pub catalog_root: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("catalog_root", &self.catalog_root)?;
        Ok(())
    }
}

/// Shared configuration for the audit and index pipelines, assembled by the
/// binaries from their flags and the optional TOML file.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub catalog_root: String,
    pub output_path: String,
    pub groups: Vec<String>,
}

impl ConfigProvider for JobConfig {
    fn catalog_root(&self) -> &str {
        &self.catalog_root
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_path("catalog_root", &self.catalog_root)?;
        validate_path("output_path", &self.output_path)?;
        for group in &self.groups {
            crate::utils::validation::validate_non_empty_string("groups", group)?;
        }
        Ok(())
    }
}
