//! Hand-off of prepared entries to the hosted catalog editor.
//!
//! Contribution runs through the catalog's web editor: the entry travels in
//! the URL as URL-safe base64, and the editor opens an "add file" session
//! with it. Child and item links are stripped first so the payload is a
//! plain entry document.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

use crate::domain::model::Collection;
use crate::utils::error::Result;

pub const EDITOR_BASE_URL: &str =
    "https://workspace.earthcode-staging.earthcode.eox.at/osc-editor";

pub fn product_handoff_url(collection: &Collection) -> Result<String> {
    product_handoff_url_with_base(EDITOR_BASE_URL, collection)
}

pub fn product_handoff_url_with_base(base_url: &str, collection: &Collection) -> Result<String> {
    let mut payload = collection.clone();
    payload.links.retain(|l| l.rel != "child" && l.rel != "item");

    let session = payload
        .title
        .clone()
        .unwrap_or_else(|| payload.id.clone());
    let session: String = url::form_urlencoded::byte_serialize(session.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    let document = serde_json::to_string(&payload.to_value()?)?;
    let encoded = URL_SAFE.encode(document.as_bytes());

    Ok(format!(
        "{}?session={}&automation=add-file&type=product&file={}",
        base_url, session, encoded
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Extent, Link};

    fn collection() -> Collection {
        let extent = Extent::new(vec![vec![-180.0, -90.0, 180.0, 90.0]], None, None);
        let mut collection =
            Collection::new("ohc-product", "Ocean Heat Content", "d", "proprietary", extent);
        collection.add_link(Link::new("via", "https://data.example.org/x").with_title("Access"));
        collection.add_link(
            Link::new("child", "https://stac.example.org/x/collection.json")
                .with_title("Data collection"),
        );
        collection
    }

    #[test]
    fn test_handoff_url_shape_and_payload() {
        let url = product_handoff_url(&collection()).unwrap();

        assert!(url.starts_with(EDITOR_BASE_URL));
        assert!(url.contains("session=Ocean%20Heat%20Content"));
        assert!(url.contains("automation=add-file"));
        assert!(url.contains("type=product"));

        // the payload decodes back to the entry, minus child/item links
        let encoded = url.rsplit("file=").next().unwrap();
        let decoded = URL_SAFE.decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["id"], "ohc-product");
        let rels: Vec<&str> = value["links"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["rel"].as_str().unwrap())
            .collect();
        assert!(rels.contains(&"via"));
        assert!(!rels.contains(&"child"));
    }
}
