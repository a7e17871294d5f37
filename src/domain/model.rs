use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::Result;

/// STAC version stamped on generated entries. The published catalog still
/// carries 1.0.0 documents; the validator accepts 1.0.0 and 1.1.0.
pub const STAC_VERSION: &str = "1.0.0";

/// Theme concept scheme used across the catalog.
pub const THEME_SCHEME: &str = "https://github.com/stac-extensions/osc#theme";

/// Conformance class declared by workflow and experiment records.
pub const RECORD_CORE: &str = "http://www.opengis.net/spec/ogcapi-records-1/1.0/req/record-core";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new<R: Into<String>, H: Into<String>>(rel: R, href: H) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
            title: None,
        }
    }

    /// Catalog-internal link: always `application/json` with a display title.
    pub fn json<R: Into<String>, H: Into<String>, T: Into<String>>(
        rel: R,
        href: H,
        title: T,
    ) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: Some("application/json".to_string()),
            title: Some(title.into()),
        }
    }

    pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// One or more `[w, s, e, n]` boxes plus a single RFC 3339 interval.
    pub fn new(bboxes: Vec<Vec<f64>>, start: Option<String>, end: Option<String>) -> Self {
        Self {
            spatial: SpatialExtent { bbox: bboxes },
            temporal: TemporalExtent {
                interval: vec![vec![start, end]],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<EmailAddress>>,
}

impl Contact {
    pub fn new<N: Into<String>>(name: N, roles: Vec<String>, emails: Vec<String>) -> Self {
        let emails = if emails.is_empty() {
            None
        } else {
            Some(emails.into_iter().map(|value| EmailAddress { value }).collect())
        };
        Self {
            name: name.into(),
            roles,
            emails,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub scheme: String,
    pub concepts: Vec<Concept>,
}

impl Theme {
    pub fn osc(concept_ids: &[String]) -> Self {
        Self {
            scheme: THEME_SCHEME.to_string(),
            concepts: concept_ids
                .iter()
                .map(|id| Concept { id: id.clone() })
                .collect(),
        }
    }
}

/// A catalog node: groups entries, carries no extent of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub stac_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new<I: Into<String>, D: Into<String>>(id: I, description: D) -> Self {
        Self {
            kind: "Catalog".to_string(),
            id: id.into(),
            stac_version: STAC_VERSION.to_string(),
            title: None,
            description: description.into(),
            links: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A collection entry: projects and products are stored as collections.
///
/// Unknown extension fields round-trip through `extra`, so documents written
/// by other tooling survive a load/save cycle untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub stac_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub license: String,
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<Contact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<Theme>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    pub fn new<I, T, D, L>(id: I, title: T, description: D, license: L, extent: Extent) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        D: Into<String>,
        L: Into<String>,
    {
        Self {
            kind: "Collection".to_string(),
            id: id.into(),
            stac_version: STAC_VERSION.to_string(),
            title: Some(title.into()),
            description: description.into(),
            keywords: Vec::new(),
            license: license.into(),
            extent,
            stac_extensions: Vec::new(),
            links: Vec::new(),
            contacts: None,
            themes: None,
            extra: Map::new(),
        }
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn add_links<I: IntoIterator<Item = Link>>(&mut self, links: I) {
        self.links.extend(links);
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }

    pub fn set_field<K: Into<String>>(&mut self, key: K, value: Value) {
        self.extra.insert(key.into(), value);
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// An OGC API record (GeoJSON feature): workflows and experiments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub geometry: Value,
    #[serde(rename = "conformsTo", default, skip_serializing_if = "Vec::is_empty")]
    pub conforms_to: Vec<String>,
    pub properties: Map<String, Value>,
    #[serde(rename = "linkTemplates", default)]
    pub link_templates: Vec<Value>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Record {
    pub fn new<I: Into<String>>(id: I) -> Self {
        Self {
            kind: "Feature".to_string(),
            id: id.into(),
            geometry: Value::Null,
            conforms_to: vec![RECORD_CORE.to_string()],
            properties: Map::new(),
            link_templates: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn add_link(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn set_property<K: Into<String>>(&mut self, key: K, value: Value) {
        self.properties.insert(key.into(), value);
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_serializes_with_type_tag() {
        let extent = Extent::new(
            vec![vec![-180.0, -90.0, 180.0, 90.0]],
            Some("2021-01-01T00:00:00Z".to_string()),
            Some("2021-12-31T00:00:00Z".to_string()),
        );
        let collection = Collection::new("ocean-heat", "Ocean Heat", "desc", "proprietary", extent);

        let value = collection.to_value().unwrap();
        assert_eq!(value["type"], "Collection");
        assert_eq!(value["stac_version"], STAC_VERSION);
        assert_eq!(value["extent"]["spatial"]["bbox"][0][2], 180.0);
        // empty keyword list stays out of the document
        assert!(value.get("keywords").is_none());
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let extent = Extent::new(vec![vec![0.0, 0.0, 1.0, 1.0]], None, None);
        let mut collection = Collection::new("x", "X", "d", "proprietary", extent);
        collection.set_field("osc:type", Value::String("product".to_string()));

        let text = serde_json::to_string(&collection).unwrap();
        let back: Collection = serde_json::from_str(&text).unwrap();
        assert_eq!(
            back.field("osc:type").and_then(|v| v.as_str()),
            Some("product")
        );
    }

    #[test]
    fn test_record_is_null_geometry_feature() {
        let record = Record::new("wf-1");
        let value = record.to_value().unwrap();
        assert_eq!(value["type"], "Feature");
        assert!(value["geometry"].is_null());
        assert_eq!(value["conformsTo"][0], RECORD_CORE);
    }

    #[test]
    fn test_catalog_round_trip() {
        let mut catalog = Catalog::new("products", "Products of ESA-funded projects");
        catalog.title = Some("Products".to_string());
        catalog.links.push(Link::json("parent", "../catalog.json", "Open Science Catalog"));

        let text = serde_json::to_string(&catalog).unwrap();
        let back: Catalog = serde_json::from_str(&text).unwrap();
        assert_eq!(back.kind, "Catalog");
        assert_eq!(back.id, "products");
        assert_eq!(back.links[0].media_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_contact_without_emails_omits_field() {
        let contact = Contact::new("Roberto Sabia", vec!["technical_officer".to_string()], vec![]);
        let value = serde_json::to_value(&contact).unwrap();
        assert!(value.get("emails").is_none());
    }
}
