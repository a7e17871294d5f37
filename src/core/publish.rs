//! Persisting new entries into a local catalog checkout.
//!
//! Saving an entry touches several files: the entry itself, the group
//! catalog, the owning project, and the theme / variable / EO mission
//! catalogs that gain backlinks. Group catalogs are written with their
//! `self` link pointing at the published site, not the local checkout.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::domain::model::Collection;
use crate::utils::error::{OscError, Result};

/// Canonical URL of the published catalog.
pub const REMOTE_URL: &str = "https://esa-earthcode.github.io/open-science-catalog-metadata/";

pub struct CatalogTree {
    root: PathBuf,
}

impl CatalogTree {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_value(&self, rel: &str) -> Result<Value> {
        let raw = fs::read_to_string(self.root.join(rel))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_value(&self, rel: &str, value: &Value) -> Result<()> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    /// Rewrite the `self` link to the published URL, then write.
    fn write_with_remote_self(&self, rel: &str, mut value: Value) -> Result<()> {
        if let Some(links) = value.get_mut("links").and_then(Value::as_array_mut) {
            for link in links {
                if link.get("rel").and_then(Value::as_str) == Some("self") {
                    link["href"] = json!(format!("{}{}", REMOTE_URL, rel));
                }
            }
        }
        self.write_value(rel, &value)
    }

    fn append_child_link(&self, catalog_rel: &str, target: &str, title: &str) -> Result<()> {
        let mut catalog = self.read_value(catalog_rel)?;
        let links = catalog
            .get_mut("links")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                OscError::entry(format!("Catalog {} has no links array", catalog_rel))
            })?;
        links.push(json!({
            "rel": "child",
            "href": target,
            "type": "application/json",
            "title": title,
        }));
        self.write_with_remote_self(catalog_rel, catalog)
    }

    /// Add a backlink to a product unless one already mentions its id.
    fn ensure_backlink(&self, catalog_rel: &str, product_id: &str, title: &str) -> Result<bool> {
        let mut catalog = self.read_value(catalog_rel)?;
        let links = catalog
            .get_mut("links")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                OscError::entry(format!("Catalog {} has no links array", catalog_rel))
            })?;

        let exists = links.iter().any(|link| {
            link.get("href")
                .and_then(Value::as_str)
                .map(|href| href.contains(product_id))
                .unwrap_or(false)
        });
        if exists {
            return Ok(false);
        }

        links.push(json!({
            "rel": "child",
            "href": format!("../../products/{}/collection.json", product_id),
            "type": "application/json",
            "title": title,
        }));
        self.write_with_remote_self(catalog_rel, catalog)?;
        Ok(true)
    }

    fn create_entry_dir(&self, group: &str, id: &str) -> Result<PathBuf> {
        let dir = self.root.join(group).join(id);
        if dir.exists() {
            return Err(OscError::entry(format!(
                "{}/{} already exists in the catalog",
                group, id
            )));
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Save a new project collection and register it with the projects
    /// catalog.
    pub fn save_project(&self, collection: &Collection) -> Result<PathBuf> {
        let dir = self.create_entry_dir("projects", &collection.id)?;

        let entry_path = dir.join("collection.json");
        fs::write(&entry_path, serde_json::to_string_pretty(&collection.to_value()?)?)?;

        let title = collection.title.clone().unwrap_or_else(|| collection.id.clone());
        self.append_child_link(
            "projects/catalog.json",
            &format!("./{}/collection.json", collection.id),
            &title,
        )?;

        tracing::info!("Saved project '{}' to {}", collection.id, dir.display());
        Ok(entry_path)
    }

    /// Save a new product collection: registers it with the products
    /// catalog, links it from the owning project, and backlinks every
    /// referenced theme, variable, and EO mission catalog.
    pub fn save_product(&self, collection: &Collection) -> Result<PathBuf> {
        let project_id = collection
            .field("osc:project")
            .and_then(Value::as_str)
            .ok_or_else(|| OscError::entry("Product has no 'osc:project' field"))?
            .to_string();

        let themes: Vec<String> = collection
            .themes
            .as_ref()
            .map(|themes| {
                themes
                    .iter()
                    .flat_map(|t| t.concepts.iter().map(|c| c.id.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let variables = string_list(collection.field("osc:variables"));
        let missions = string_list(collection.field("osc:missions"));

        let dir = self.create_entry_dir("products", &collection.id)?;
        let title = collection.title.clone().unwrap_or_else(|| collection.id.clone());

        self.append_child_link(
            "products/catalog.json",
            &format!("./{}/collection.json", collection.id),
            &title,
        )?;

        // link the product from its project
        let project_rel = format!("projects/{}/collection.json", project_id);
        let mut project = self.read_value(&project_rel)?;
        project
            .get_mut("links")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| OscError::entry(format!("Project {} has no links array", project_id)))?
            .push(json!({
                "rel": "child",
                "href": format!("../../products/{}/collection.json", collection.id),
                "type": "application/json",
                "title": title,
            }));
        self.write_value(&project_rel, &project)?;

        for theme in &themes {
            self.ensure_backlink(&format!("themes/{}/catalog.json", theme), &collection.id, &title)?;
        }
        for variable in &variables {
            self.ensure_backlink(
                &format!("variables/{}/catalog.json", variable),
                &collection.id,
                &title,
            )?;
        }
        for mission in &missions {
            self.ensure_backlink(
                &format!("eo-missions/{}/catalog.json", mission),
                &collection.id,
                &title,
            )?;
        }

        // pick up display titles from the referenced catalogs
        let mut value = collection.to_value()?;
        self.refresh_related_titles(&mut value)?;

        let entry_path = dir.join("collection.json");
        fs::write(&entry_path, serde_json::to_string_pretty(&value)?)?;

        tracing::info!("Saved product '{}' to {}", collection.id, dir.display());
        Ok(entry_path)
    }

    /// Replace variable / EO mission link titles with the target catalog's
    /// title.
    fn refresh_related_titles(&self, value: &mut Value) -> Result<()> {
        let links = match value.get_mut("links").and_then(Value::as_array_mut) {
            Some(links) => links,
            None => return Ok(()),
        };

        for link in links {
            if link.get("rel").and_then(Value::as_str) != Some("related") {
                continue;
            }
            let href = link.get("href").and_then(Value::as_str).unwrap_or("");
            let segments: Vec<&str> = href.split('/').collect();
            // "../../<group>/<id>/catalog.json"
            if segments.len() < 4 {
                continue;
            }
            let (group, id) = (segments[2], segments[3]);
            let prefix = match group {
                "variables" => "Variable: ",
                "eo-missions" => "EO Mission: ",
                _ => continue,
            };
            let target = self.read_value(&format!("{}/{}/catalog.json", group, id))?;
            if let Some(target_title) = target.get("title").and_then(Value::as_str) {
                link["title"] = json!(format!("{}{}", prefix, target_title));
            }
        }
        Ok(())
    }

    /// Re-add any missing theme / variable / mission backlinks for an
    /// already-saved product. Returns how many links were added.
    pub fn repair_backlinks(&self, product_id: &str) -> Result<usize> {
        let product = self.read_value(&format!("products/{}/collection.json", product_id))?;
        let title = product
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(product_id);
        let backlink_title = format!("Product: {}", title);

        let themes: Vec<String> = product
            .get("themes")
            .and_then(Value::as_array)
            .map(|themes| {
                themes
                    .iter()
                    .filter_map(|t| t.get("concepts").and_then(Value::as_array))
                    .flatten()
                    .filter_map(|c| c.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let variables = string_list(product.get("osc:variables"));
        let missions = string_list(product.get("osc:missions"));

        let mut added = 0;
        for (group, ids) in [
            ("themes", &themes),
            ("variables", &variables),
            ("eo-missions", &missions),
        ] {
            for id in ids {
                if self.ensure_backlink(
                    &format!("{}/{}/catalog.json", group, id),
                    product_id,
                    &backlink_title,
                )? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
