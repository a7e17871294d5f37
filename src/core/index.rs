//! Search index construction.
//!
//! Entries from the group directories are flattened into one row each: the
//! searchable text, bbox columns for spatial filtering, and the entry JSON
//! verbatim so search results decode back into full documents. Rows persist
//! as JSON lines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{OscError, Result};

pub const DEFAULT_GROUPS: [&str; 4] = ["products", "variables", "eo-missions", "projects"];

pub const DEFAULT_INDEX_FILE: &str = "index.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: String,
    pub group: String,
    pub title: String,
    pub description: String,
    pub path: String,
    pub bbox_minx: Option<f64>,
    pub bbox_miny: Option<f64>,
    pub bbox_maxx: Option<f64>,
    pub bbox_maxy: Option<f64>,
    /// The entry document, verbatim.
    pub item_json: String,
    /// Flattened searchable text, one fragment per line.
    pub text: String,
}

/// Flatten the searchable parts of an entry into plain text.
pub fn flatten_metadata(data: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    let mut push_str = |value: Option<&Value>| {
        if let Some(s) = value.and_then(Value::as_str) {
            if !s.is_empty() {
                parts.push(s.to_string());
            }
        }
    };
    push_str(data.get("id"));
    push_str(data.get("title"));
    push_str(data.get("description"));

    let mut push_list = |value: Option<&Value>| {
        if let Some(items) = value.and_then(Value::as_array) {
            for item in items {
                if let Some(s) = item.as_str() {
                    if !s.is_empty() {
                        parts.push(s.to_string());
                    }
                }
            }
        }
    };
    push_list(data.get("keywords"));
    push_list(data.get("osc:variables"));
    push_list(data.get("osc:missions"));

    if let Some(themes) = data.get("themes").and_then(Value::as_array) {
        for theme in themes {
            if let Some(concepts) = theme.get("concepts").and_then(Value::as_array) {
                for concept in concepts {
                    if let Some(id) = concept.get("id").and_then(Value::as_str) {
                        if !id.is_empty() {
                            parts.push(id.to_string());
                        }
                    }
                }
            }
        }
    }

    parts.join("\n")
}

fn bbox_bound(bboxes: &[Vec<f64>], index: usize, min: bool) -> Option<f64> {
    let values = bboxes.iter().filter(|b| b.len() >= 4).map(|b| b[index]);
    if min {
        values.fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        })
    } else {
        values.fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        })
    }
}

/// Build an index row from one entry document.
pub fn row_from_entry(path: &str, group: &str, data: &Value) -> Result<IndexRow> {
    let extent_bboxes = data
        .get("extent")
        .and_then(|e| e.get("spatial"))
        .and_then(|s| s.get("bbox"))
        .and_then(Value::as_array);
    let bboxes: Vec<Vec<f64>> = match extent_bboxes {
        Some(listed) if !listed.is_empty() => listed
            .iter()
            .filter_map(|b| {
                b.as_array()
                    .map(|vals| vals.iter().filter_map(Value::as_f64).collect())
            })
            .collect(),
        // catalogs carry no extent; treat them as global
        _ => vec![vec![-180.0, -90.0, 180.0, 90.0]],
    };

    let fallback_id = std::path::Path::new(path)
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");

    Ok(IndexRow {
        id: data
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(fallback_id)
            .to_string(),
        group: group.to_string(),
        title: data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        description: data
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        path: path.to_string(),
        bbox_minx: bbox_bound(&bboxes, 0, true),
        bbox_miny: bbox_bound(&bboxes, 1, true),
        bbox_maxx: bbox_bound(&bboxes, 2, false),
        bbox_maxy: bbox_bound(&bboxes, 3, false),
        item_json: serde_json::to_string(data)?,
        text: flatten_metadata(data),
    })
}

pub fn encode_rows(rows: &[IndexRow]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn decode_rows(text: &str) -> Result<Vec<IndexRow>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

/// Walk the configured group directories and write the index file.
pub struct IndexPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> IndexPipeline<S, C> {
    /// `source` is rooted at the catalog checkout, `sink` at the output
    /// directory.
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }
}

#[async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for IndexPipeline<S, C> {
    type Item = (String, String, Value);
    type Output = Vec<IndexRow>;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let mut items = Vec::new();

        for group in self.config.groups() {
            let mut paths = self.source.list_files(group, "collection.json").await?;
            paths.extend(self.source.list_files(group, "catalog.json").await?);
            paths.sort();

            if paths.is_empty() {
                return Err(OscError::processing(format!(
                    "No collections or catalogs found under {}",
                    group
                )));
            }

            tracing::debug!("Group {}: {} entries", group, paths.len());
            for path in paths {
                let raw = self.source.read_file(&path).await?;
                let data: Value = serde_json::from_slice(&raw)?;
                items.push((group.clone(), path, data));
            }
        }

        Ok(items)
    }

    async fn transform(&self, items: Vec<Self::Item>) -> Result<Vec<IndexRow>> {
        let mut rows = Vec::with_capacity(items.len());
        for (group, path, data) in &items {
            rows.push(row_from_entry(path, group, data)?);
        }
        tracing::info!("Indexed {} entries", rows.len());
        Ok(rows)
    }

    async fn load(&self, rows: Vec<IndexRow>) -> Result<String> {
        let encoded = encode_rows(&rows)?;
        self.sink
            .write_file(DEFAULT_INDEX_FILE, encoded.as_bytes())
            .await?;
        Ok(format!(
            "{}/{}",
            self.config.output_path(),
            DEFAULT_INDEX_FILE
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Value {
        json!({
            "type": "Collection",
            "id": "seasfire-cube",
            "title": "SeasFire Cube",
            "description": "Global fire danger datacube",
            "keywords": ["seasonal fire modeling"],
            "osc:variables": ["burned-area"],
            "osc:missions": ["sentinel-2"],
            "themes": [{"scheme": "s", "concepts": [{"id": "land"}]}],
            "extent": {
                "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
                "temporal": {"interval": [[null, null]]}
            }
        })
    }

    #[test]
    fn test_flatten_metadata_collects_search_fields() {
        let text = flatten_metadata(&product());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "seasfire-cube");
        assert!(lines.contains(&"SeasFire Cube"));
        assert!(lines.contains(&"seasonal fire modeling"));
        assert!(lines.contains(&"burned-area"));
        assert!(lines.contains(&"sentinel-2"));
        assert!(lines.contains(&"land"));
    }

    #[test]
    fn test_row_from_entry_bbox_columns() {
        let row = row_from_entry("products/seasfire-cube/collection.json", "products", &product())
            .unwrap();
        assert_eq!(row.id, "seasfire-cube");
        assert_eq!(row.bbox_minx, Some(-180.0));
        assert_eq!(row.bbox_maxy, Some(90.0));

        // multiple boxes aggregate to the hull
        let mut multi = product();
        multi["extent"]["spatial"]["bbox"] = json!([[0.0, 0.0, 10.0, 10.0], [-20.0, 5.0, 5.0, 30.0]]);
        let row = row_from_entry("p", "products", &multi).unwrap();
        assert_eq!(row.bbox_minx, Some(-20.0));
        assert_eq!(row.bbox_miny, Some(0.0));
        assert_eq!(row.bbox_maxx, Some(10.0));
        assert_eq!(row.bbox_maxy, Some(30.0));
    }

    #[test]
    fn test_row_from_entry_without_extent_defaults_to_global() {
        let data = json!({"type": "Catalog", "id": "land", "title": "Land", "description": "d"});
        let row = row_from_entry("themes/land/catalog.json", "themes", &data).unwrap();
        assert_eq!(row.bbox_minx, Some(-180.0));
        assert_eq!(row.bbox_maxx, Some(180.0));
    }

    #[test]
    fn test_row_id_falls_back_to_directory_name() {
        let data = json!({"type": "Catalog", "title": "t", "description": "d"});
        let row = row_from_entry("variables/burned-area/catalog.json", "variables", &data).unwrap();
        assert_eq!(row.id, "burned-area");
    }

    #[test]
    fn test_rows_round_trip_as_json_lines() {
        let row = row_from_entry("products/x/collection.json", "products", &product()).unwrap();
        let encoded = encode_rows(&[row.clone()]).unwrap();
        let decoded = decode_rows(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, row.id);
        assert_eq!(decoded[0].item_json, row.item_json);
    }
}
