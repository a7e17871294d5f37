//! Catalog tree validation.
//!
//! Files are classified by their location in the tree, then checked against
//! global STAC rules plus a per-kind rule set. Validation works on raw JSON
//! values so broken documents are reported instead of failing at parse.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::utils::error::Result;

const ACCEPTED_STAC_VERSIONS: [&str; 2] = ["1.0.0", "1.1.0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RootCatalog,
    /// Group-level catalog, e.g. `products/catalog.json`.
    GroupCatalog,
    MissionCatalog,
    ProductCollection,
    ProjectCollection,
    ThemeCatalog,
    VariableCatalog,
    WorkflowRecord,
    ExperimentRecord,
    Unknown,
}

/// Classify a file by its path relative to the tree root.
pub fn classify(root: &Path, path: &Path) -> EntryKind {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => return EntryKind::Unknown,
    };

    let components: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    match components.as_slice() {
        ["catalog.json"] => EntryKind::RootCatalog,
        [_, "catalog.json"] => EntryKind::GroupCatalog,
        ["eo-missions", .., "catalog.json"] => EntryKind::MissionCatalog,
        ["products", .., "collection.json"] => EntryKind::ProductCollection,
        ["projects", .., "collection.json"] => EntryKind::ProjectCollection,
        ["themes", .., "catalog.json"] => EntryKind::ThemeCatalog,
        ["variables", .., "catalog.json"] => EntryKind::VariableCatalog,
        ["workflows", .., "record.json"] => EntryKind::WorkflowRecord,
        ["experiments", .., "record.json"] => EntryKind::ExperimentRecord,
        _ => EntryKind::Unknown,
    }
}

fn get_link<'a>(data: &'a Value, rel: &str) -> Option<&'a Value> {
    data.get("links")?
        .as_array()?
        .iter()
        .find(|link| link.get("rel").and_then(Value::as_str) == Some(rel))
}

fn has_extension(data: &Value, partial: &str) -> bool {
    data.get("stac_extensions")
        .and_then(Value::as_array)
        .map(|exts| {
            exts.iter()
                .filter_map(Value::as_str)
                .any(|e| e.contains(partial))
        })
        .unwrap_or(false)
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Structural checks every document must pass before kind rules apply.
fn check_structure(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();

    if !data.is_object() {
        errs.push("Document is not a JSON object".to_string());
        return errs;
    }
    match str_field(data, "id") {
        Some(id) if !id.is_empty() => {}
        _ => errs.push("Missing or empty 'id'".to_string()),
    }
    if str_field(data, "type").is_none() {
        errs.push("Missing 'type' property".to_string());
    }

    if let Some(links) = data.get("links") {
        match links.as_array() {
            Some(links) => {
                for link in links {
                    if str_field(link, "rel").is_none() || str_field(link, "href").is_none() {
                        errs.push("Link without 'rel' or 'href'".to_string());
                    }
                }
            }
            None => errs.push("'links' must be an array".to_string()),
        }
    }

    match str_field(data, "type") {
        Some("Catalog") => {
            if str_field(data, "description").is_none() {
                errs.push("Catalog is missing 'description'".to_string());
            }
        }
        Some("Collection") => {
            if str_field(data, "description").is_none() {
                errs.push("Collection is missing 'description'".to_string());
            }
            if str_field(data, "license").is_none() {
                errs.push("Collection is missing 'license'".to_string());
            }
            let bbox_ok = data
                .get("extent")
                .and_then(|e| e.get("spatial"))
                .and_then(|s| s.get("bbox"))
                .and_then(Value::as_array)
                .map(|b| !b.is_empty())
                .unwrap_or(false);
            if !bbox_ok {
                errs.push("Collection extent has no spatial bbox".to_string());
            }
        }
        Some("Feature") => {
            if !data.get("properties").map(Value::is_object).unwrap_or(false) {
                errs.push("Feature is missing 'properties'".to_string());
            }
        }
        _ => {}
    }

    errs
}

fn check_global_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();

    match str_field(data, "stac_version") {
        Some(v) if ACCEPTED_STAC_VERSIONS.contains(&v) => {}
        // records carry no stac_version
        _ if str_field(data, "type") == Some("Feature") => {}
        _ => errs.push("Invalid or missing stac_version".to_string()),
    }

    if matches!(str_field(data, "type"), Some("Catalog") | Some("Collection"))
        && str_field(data, "title").map(str::trim).unwrap_or("").is_empty()
    {
        errs.push("Missing 'title' property".to_string());
    }

    if let Some(links) = data.get("links").and_then(Value::as_array) {
        for link in links {
            let rel = str_field(link, "rel").unwrap_or("");
            if matches!(rel, "child" | "item" | "parent" | "root")
                && str_field(link, "href").unwrap_or("").contains("://")
            {
                errs.push(format!("Link {} must be relative path", rel));
            }
        }
    }

    errs
}

fn check_root_catalog_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if str_field(data, "id") != Some("osc") {
        errs.push("Root id must be 'osc'".to_string());
    }
    if get_link(data, "parent").is_some() {
        errs.push("Root catalog cannot have a parent link".to_string());
    }
    errs
}

fn check_mission_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if get_link(data, "via").is_none() {
        errs.push("Missing 'via' link".to_string());
    }
    if get_link(data, "parent").is_none() {
        errs.push("Missing 'parent' link".to_string());
    }
    errs
}

fn check_product_rules(data: &Value, root: &Path) -> Vec<String> {
    let mut errs = Vec::new();
    if str_field(data, "type") != Some("Collection") {
        errs.push("Product must be Collection".to_string());
    }
    if str_field(data, "osc:type") != Some("product") {
        errs.push("osc:type must be 'product'".to_string());
    }
    if get_link(data, "via").is_none() {
        errs.push("Missing 'via' link".to_string());
    }

    match str_field(data, "osc:project") {
        None => errs.push("Missing 'osc:project' field".to_string()),
        Some(project_id) => {
            let project_path = root.join("projects").join(project_id).join("collection.json");
            if !project_path.exists() {
                errs.push(format!(
                    "Referenced project '{}' not found at {}",
                    project_id,
                    project_path.display()
                ));
            }
        }
    }

    if !has_extension(data, "osc") {
        errs.push("Missing required extension containing 'osc'".to_string());
    }
    errs
}

fn check_project_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if str_field(data, "osc:type") != Some("project") {
        errs.push("osc:type must be 'project'".to_string());
    }
    if !has_extension(data, "contacts") {
        errs.push("Missing required extension containing 'contacts'".to_string());
    }

    let has_officer = data
        .get("contacts")
        .and_then(Value::as_array)
        .map(|contacts| {
            contacts.iter().any(|c| {
                c.get("roles")
                    .and_then(Value::as_array)
                    .map(|roles| roles.iter().any(|r| r == "technical_officer"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false);
    if !has_officer {
        errs.push("Missing Contact with role 'technical_officer'".to_string());
    }
    errs
}

fn check_theme_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if get_link(data, "parent").is_none() {
        errs.push("Missing 'parent' link".to_string());
    }

    if let Some(preview) = get_link(data, "preview") {
        if str_field(preview, "type") != Some("image/webp") {
            errs.push("Preview image must be 'image/webp'".to_string());
        }
        if preview.get("proj:epsg").map(|v| !v.is_null()).unwrap_or(false) {
            errs.push("Preview image proj:epsg must be null".to_string());
        }
    }
    errs
}

fn check_variable_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if !has_extension(data, "themes") {
        errs.push("Missing required extension containing 'themes'".to_string());
    }
    if get_link(data, "via").is_none() {
        errs.push("Missing 'via' link".to_string());
    }
    errs
}

fn check_workflow_rules(data: &Value, root: &Path) -> Vec<String> {
    let mut errs = Vec::new();
    if str_field(data, "type") != Some("Feature") {
        errs.push("Workflow must be Feature".to_string());
    }

    let props = data.get("properties").cloned().unwrap_or(Value::Null);
    match str_field(&props, "osc:project") {
        None => errs.push("Missing 'osc:project' in properties".to_string()),
        Some(project_id) => {
            let project_path = root.join("projects").join(project_id).join("collection.json");
            if !project_path.exists() {
                errs.push(format!("Referenced project '{}' not found", project_id));
            }
        }
    }
    errs
}

fn check_experiment_rules(data: &Value) -> Vec<String> {
    let mut errs = Vec::new();
    if str_field(data, "type") != Some("Feature") {
        errs.push("Experiment must be Feature".to_string());
    }
    let has_workflow = data
        .get("properties")
        .and_then(|p| p.get("osc:workflow"))
        .is_some();
    if !has_workflow {
        errs.push("Missing 'osc:workflow' in properties".to_string());
    }
    errs
}

/// Run all applicable rule sets on an already-parsed document.
pub fn validate_value(kind: EntryKind, data: &Value, root: &Path) -> Vec<String> {
    let mut errors = check_structure(data);
    errors.extend(check_global_rules(data));

    match kind {
        EntryKind::RootCatalog => errors.extend(check_root_catalog_rules(data)),
        EntryKind::MissionCatalog => errors.extend(check_mission_rules(data)),
        EntryKind::ProductCollection => errors.extend(check_product_rules(data, root)),
        EntryKind::ProjectCollection => errors.extend(check_project_rules(data)),
        EntryKind::ThemeCatalog => errors.extend(check_theme_rules(data)),
        EntryKind::VariableCatalog => errors.extend(check_variable_rules(data)),
        EntryKind::WorkflowRecord => errors.extend(check_workflow_rules(data, root)),
        EntryKind::ExperimentRecord => errors.extend(check_experiment_rules(data)),
        EntryKind::GroupCatalog | EntryKind::Unknown => {}
    }

    errors
}

/// Validate a single file. IO failures bubble up; malformed JSON is a
/// finding, not an abort.
pub fn validate_file(root: &Path, path: &Path) -> Result<Vec<String>> {
    let kind = classify(root, path);
    if kind == EntryKind::Unknown {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)?;
    let data: Value = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(e) => return Ok(vec![format!("Invalid JSON: {}", e)]),
    };

    Ok(validate_value(kind, &data, root))
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of JSON files examined.
    pub checked: usize,
    /// Files that produced errors, in walk order.
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.files.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum()
    }
}

fn walk_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk_json_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Validate every JSON file under the tree root. One broken file does not
/// stop the walk.
pub fn validate_tree(root: &Path) -> Result<ValidationReport> {
    let mut files = Vec::new();
    walk_json_files(root, &mut files)?;

    let mut report = ValidationReport::default();
    for path in files {
        report.checked += 1;
        let errors = match validate_file(root, &path) {
            Ok(errors) => errors,
            Err(e) => vec![format!("Could not read file: {}", e)],
        };
        if !errors.is_empty() {
            tracing::debug!("{}: {} errors", path.display(), errors.len());
            report.files.push(FileReport { path, errors });
        }
    }

    Ok(report)
}
