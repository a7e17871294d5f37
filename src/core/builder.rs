//! Builders for new catalog entries.
//!
//! Each builder produces a complete entry with the canonical link layout the
//! validator expects: structural links stay relative, external data and
//! documentation hang off `via` links.

use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::model::{Collection, Contact, Extent, Link, Record, Theme};

pub const OSC_EXTENSION: &str = "https://stac-extensions.github.io/osc/v1.0.0/schema.json";
pub const THEMES_EXTENSION: &str = "https://stac-extensions.github.io/themes/v1.0.0/schema.json";
pub const CONTACTS_EXTENSION: &str =
    "https://stac-extensions.github.io/contacts/v0.1.1/schema.json";
pub const CF_EXTENSION: &str = "https://stac-extensions.github.io/cf/v0.2.0/schema.json";

pub fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// "ocean-heat-budget" -> "Ocean Heat Budget"
fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Add theme concepts to the entry fields and link each theme catalog.
pub fn add_themes(collection: &mut Collection, themes: &[String]) {
    for theme in themes {
        collection.add_link(Link::json(
            "related",
            format!("../../themes/{}/catalog.json", theme),
            format!("Theme: {}", capitalize(theme)),
        ));
    }
    collection.themes = Some(vec![Theme::osc(themes)]);
}

/// Add EO mission references: one related link per mission plus the
/// `osc:missions` field.
pub fn add_product_missions(collection: &mut Collection, missions: &[String]) {
    for mission in missions {
        collection.add_link(Link::json(
            "related",
            format!("../../eo-missions/{}/catalog.json", mission),
            format!("EO Mission: {}", capitalize(mission)),
        ));
    }
    collection.set_field("osc:missions", json!(missions));
}

/// Add variable references: one related link per variable plus the
/// `osc:variables` field.
pub fn add_product_variables(collection: &mut Collection, variables: &[String]) {
    for variable in variables {
        collection.add_link(Link::json(
            "related",
            format!("../../variables/{}/catalog.json", variable),
            format!("Variable: {}", title_case(variable)),
        ));
    }
    collection.set_field("osc:variables", json!(variables));
}

#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub id: String,
    pub title: String,
    pub description: String,
    /// "ongoing" or "completed"
    pub status: String,
    pub license: String,
    pub extent: Extent,
    pub themes: Vec<String>,
    /// Technical officer (name, email).
    pub technical_officer: (String, String),
    /// Consortium members as (name, email) pairs.
    pub consortium: Vec<(String, String)>,
    pub website: String,
    pub eo4society_link: Option<String>,
}

pub fn project_collection(spec: &ProjectSpec) -> Collection {
    let mut collection = Collection::new(
        &spec.id,
        &spec.title,
        &spec.description,
        &spec.license,
        spec.extent.clone(),
    );

    collection.stac_extensions = vec![
        OSC_EXTENSION.to_string(),
        THEMES_EXTENSION.to_string(),
        CONTACTS_EXTENSION.to_string(),
    ];

    collection.set_field("osc:status", json!(spec.status));
    collection.set_field("osc:type", json!("project"));
    collection.set_field("updated", json!(timestamp_now()));

    collection.add_links([
        Link::json("root", "../../catalog.json", "Open Science Catalog"),
        Link::json("parent", "../catalog.json", "Projects"),
    ]);

    collection.add_link(Link::new("via", &spec.website).with_title("Website"));
    if let Some(eo4society) = &spec.eo4society_link {
        collection.add_link(Link::new("via", eo4society).with_title("EO4Society Link"));
    }

    add_themes(&mut collection, &spec.themes);

    let (to_name, to_email) = &spec.technical_officer;
    let mut contacts = vec![Contact::new(
        to_name,
        vec!["technical_officer".to_string()],
        vec![to_email.clone()],
    )];
    contacts.extend(spec.consortium.iter().map(|(name, email)| {
        Contact::new(
            name,
            vec!["consortium_member".to_string()],
            vec![email.clone()],
        )
    }));
    collection.contacts = Some(contacts);

    collection
}

#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub id: String,
    pub title: String,
    pub description: String,
    pub extent: Extent,
    pub license: String,
    pub keywords: Vec<String>,
    pub status: String,
    /// Semantic region label, e.g. "Global" or "Belgium".
    pub region: String,
    pub themes: Vec<String>,
    pub missions: Vec<String>,
    pub variables: Vec<String>,
    pub project_id: String,
    pub project_title: String,
    /// cf:parameter names; empty when not applicable.
    pub parameters: Vec<String>,
    pub doi: Option<String>,
}

pub fn product_collection(spec: &ProductSpec) -> Collection {
    let mut collection = Collection::new(
        &spec.id,
        &spec.title,
        &spec.description,
        &spec.license,
        spec.extent.clone(),
    );
    collection.keywords = spec.keywords.clone();

    collection.stac_extensions = vec![
        OSC_EXTENSION.to_string(),
        THEMES_EXTENSION.to_string(),
        CF_EXTENSION.to_string(),
    ];

    collection.add_links([
        Link::json("root", "../../catalog.json", "Open Science Catalog"),
        Link::json("parent", "../catalog.json", "Products"),
        Link::json(
            "related",
            format!("../../projects/{}/collection.json", spec.project_id),
            format!("Project: {}", spec.project_title),
        ),
    ]);

    let now = timestamp_now();
    collection.set_field("osc:project", json!(spec.project_id));
    collection.set_field("osc:status", json!(spec.status));
    collection.set_field("osc:region", json!(spec.region));
    collection.set_field("osc:type", json!("product"));
    collection.set_field("created", json!(now));
    collection.set_field("updated", json!(now));

    if let Some(doi) = &spec.doi {
        collection.set_field("sci:doi", json!(doi));
    }

    if !spec.parameters.is_empty() {
        let params: Vec<Value> = spec
            .parameters
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        collection.set_field("cf:parameter", Value::Array(params));
    }

    add_themes(&mut collection, &spec.themes);
    add_product_missions(&mut collection, &spec.missions);
    add_product_variables(&mut collection, &spec.variables);

    collection
}

#[derive(Debug, Clone)]
pub struct ProductLinks {
    /// Required link to data access.
    pub access: String,
    pub documentation: Option<String>,
    /// External STAC collection with the product's items.
    pub item: Option<String>,
}

/// Append the data access links a product needs before it can be published.
pub fn add_product_links(collection: &mut Collection, links: &ProductLinks) {
    collection.add_link(Link::new("via", &links.access).with_title("Access"));
    if let Some(documentation) = &links.documentation {
        collection.add_link(Link::new("via", documentation).with_title("Documentation"));
    }
    if let Some(item) = &links.item {
        collection.add_link(Link::new("child", item).with_title("Data collection"));
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowSpec {
    pub id: String,
    pub title: String,
    pub description: String,
    pub license: String,
    pub keywords: Vec<String>,
    /// Input/output data formats, e.g. "netcdf", "GeoTIFF".
    pub formats: Vec<String>,
    pub themes: Vec<String>,
    pub code_url: String,
    pub project_id: String,
    pub project_title: String,
}

pub fn workflow_record(spec: &WorkflowSpec) -> Record {
    let mut record = Record::new(&spec.id);

    let now = timestamp_now();
    record.set_property("title", json!(spec.title));
    record.set_property("description", json!(spec.description));
    record.set_property("osc:type", json!("workflow"));
    record.set_property("osc:project", json!(spec.project_id));
    record.set_property("osc:status", json!("completed"));
    record.set_property(
        "formats",
        json!(spec
            .formats
            .iter()
            .map(|f| json!({ "name": f }))
            .collect::<Vec<_>>()),
    );
    record.set_property("updated", json!(now));
    record.set_property("created", json!(now));
    record.set_property("keywords", json!(spec.keywords));
    record.set_property("license", json!(spec.license));
    record.set_property("version", json!("1"));
    record.set_property(
        "themes",
        serde_json::to_value(vec![Theme::osc(&spec.themes)]).unwrap_or(Value::Null),
    );

    record.add_link(Link::json("root", "../../catalog.json", "Open Science Catalog"));
    record.add_link(Link::json("parent", "../catalog.json", "Workflows"));
    record.add_link(Link::json(
        "related",
        format!("../../projects/{}/collection.json", spec.project_id),
        format!("Project: {}", spec.project_title),
    ));
    record.add_link(Link::new("git", &spec.code_url).with_title("Git source repository"));

    for theme in &spec.themes {
        record.add_link(Link::json(
            "related",
            format!("../../themes/{}/catalog.json", theme),
            format!("Theme: {}", capitalize(theme)),
        ));
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_extent() -> Extent {
        Extent::new(
            vec![vec![-180.0, -90.0, 180.0, 90.0]],
            Some("2021-01-01T00:00:00Z".to_string()),
            Some("2021-12-31T00:00:00Z".to_string()),
        )
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ocean-heat-budget"), "Ocean Heat Budget");
        assert_eq!(title_case("grace"), "Grace");
        assert_eq!(capitalize("oceans"), "Oceans");
    }

    #[test]
    fn test_add_themes_links_and_field() {
        let mut collection = Collection::new("x", "X", "d", "proprietary", global_extent());
        add_themes(&mut collection, &["oceans".to_string()]);

        let link = collection.links.last().unwrap();
        assert_eq!(link.rel, "related");
        assert_eq!(link.href, "../../themes/oceans/catalog.json");
        assert_eq!(link.title.as_deref(), Some("Theme: Oceans"));

        let themes = collection.themes.as_ref().unwrap();
        assert_eq!(themes[0].concepts[0].id, "oceans");
    }

    #[test]
    fn test_project_collection_contacts() {
        let spec = ProjectSpec {
            id: "proj".to_string(),
            title: "Proj".to_string(),
            description: "d".to_string(),
            status: "completed".to_string(),
            license: "proprietary".to_string(),
            extent: global_extent(),
            themes: vec!["oceans".to_string()],
            technical_officer: ("Roberto Sabia".to_string(), "roberto.sabia@esa.int".to_string()),
            consortium: vec![("Magellium".to_string(), "contact@magellium.fr".to_string())],
            website: "https://example.org/".to_string(),
            eo4society_link: None,
        };
        let collection = project_collection(&spec);

        let contacts = collection.contacts.as_ref().unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].roles, vec!["technical_officer"]);
        assert_eq!(contacts[1].roles, vec!["consortium_member"]);
        assert_eq!(
            collection.field("osc:type").and_then(|v| v.as_str()),
            Some("project")
        );
        // a single via link when there is no EO4Society page
        assert_eq!(collection.links.iter().filter(|l| l.rel == "via").count(), 1);
    }

    #[test]
    fn test_product_links_required_and_optional() {
        let mut collection = Collection::new("p", "P", "d", "proprietary", global_extent());
        add_product_links(
            &mut collection,
            &ProductLinks {
                access: "https://data.example.org/p".to_string(),
                documentation: None,
                item: Some("https://stac.example.org/p/collection.json".to_string()),
            },
        );

        assert_eq!(collection.links.iter().filter(|l| l.rel == "via").count(), 1);
        let child = collection.link("child").unwrap();
        assert_eq!(child.title.as_deref(), Some("Data collection"));
    }

    #[test]
    fn test_workflow_record_shape() {
        let spec = WorkflowSpec {
            id: "wf".to_string(),
            title: "WF".to_string(),
            description: "d".to_string(),
            license: "CC-BY-4.0".to_string(),
            keywords: vec!["ocean".to_string()],
            formats: vec!["netcdf".to_string()],
            themes: vec!["oceans".to_string()],
            code_url: "https://github.com/example/wf".to_string(),
            project_id: "proj".to_string(),
            project_title: "Proj".to_string(),
        };
        let record = workflow_record(&spec);

        assert_eq!(record.kind, "Feature");
        assert_eq!(
            record.properties.get("osc:project").and_then(|v| v.as_str()),
            Some("proj")
        );
        let related: Vec<_> = record.links.iter().filter(|l| l.rel == "related").collect();
        assert_eq!(related[0].href, "../../projects/proj/collection.json");
        assert_eq!(related[1].href, "../../themes/oceans/catalog.json");
        assert!(record.links.iter().any(|l| l.rel == "git"));
    }
}
