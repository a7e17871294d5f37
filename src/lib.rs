pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{cli::LocalStorage, CliConfig};
pub use crate::config::{toml_config::TomlConfig, JobConfig};

pub use crate::core::builder::{
    product_collection, project_collection, workflow_record, ProductLinks, ProductSpec,
    ProjectSpec, WorkflowSpec,
};
pub use crate::core::engine::PipelineEngine;
pub use crate::core::publish::CatalogTree;
pub use crate::core::search::{SearchIndex, SearchQuery};
pub use crate::domain::model::{Catalog, Collection, Contact, Extent, Link, Record, Theme};
pub use crate::utils::error::{OscError, Result};
