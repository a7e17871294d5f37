//! Query side of the search index.
//!
//! A linear scan over the index rows: structured filters first (group, ids,
//! bbox, theme, variable, keyword), then lexical ranking of the flattened
//! text with boosts for title and description matches.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::core::index::{decode_rows, IndexRow};
use crate::utils::error::Result;

const TITLE_BOOST: f32 = 3.0;
const DESCRIPTION_BOOST: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub group: String,
    pub limit: usize,
    pub ids: Option<Vec<String>>,
    /// `[minx, miny, maxx, maxy]` in EPSG:4326.
    pub bbox: Option<[f64; 4]>,
    /// true: entry bbox overlaps the query bbox; false: entry bbox must be
    /// contained in it.
    pub intersects: bool,
    pub theme: Option<String>,
    pub variable: Option<String>,
    pub keyword: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            group: "products".to_string(),
            limit: 10,
            ids: None,
            bbox: None,
            intersects: true,
            theme: None,
            variable: None,
            keyword: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub group: String,
    pub title: String,
    pub score: f32,
    /// The full entry document.
    pub entry: Value,
}

pub struct SearchIndex {
    rows: Vec<IndexRow>,
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Substring occurrences, retrying the singular form of plural tokens.
fn count_matches(haystack: &str, token: &str) -> usize {
    let count = haystack.match_indices(token).count();
    if count == 0 && token.len() > 3 && token.ends_with('s') {
        return haystack.match_indices(&token[..token.len() - 1]).count();
    }
    count
}

fn score_row(row: &IndexRow, tokens: &[String]) -> f32 {
    let title = row.title.to_lowercase();
    let description = row.description.to_lowercase();
    let text = row.text.to_lowercase();

    let mut score = 0.0;
    for token in tokens {
        let in_title = count_matches(&title, token);
        let in_description = count_matches(&description, token);
        let in_text = count_matches(&text, token);
        let elsewhere = in_text.saturating_sub(in_title + in_description);

        score += TITLE_BOOST * in_title as f32
            + DESCRIPTION_BOOST * in_description as f32
            + elsewhere as f32;
    }
    score
}

fn bbox_matches(row: &IndexRow, query: &[f64; 4], intersects: bool) -> bool {
    let (minx, miny, maxx, maxy) = match (row.bbox_minx, row.bbox_miny, row.bbox_maxx, row.bbox_maxy)
    {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return false,
    };
    let [qminx, qminy, qmaxx, qmaxy] = *query;

    if intersects {
        minx <= qmaxx && maxx >= qminx && miny <= qmaxy && maxy >= qminy
    } else {
        minx >= qminx && maxx <= qmaxx && miny >= qminy && maxy <= qmaxy
    }
}

fn entry_has_theme(entry: &Value, theme: &str) -> bool {
    entry
        .get("themes")
        .and_then(Value::as_array)
        .map(|themes| {
            themes
                .iter()
                .filter_map(|t| t.get("concepts").and_then(Value::as_array))
                .flatten()
                .any(|c| c.get("id").and_then(Value::as_str) == Some(theme))
        })
        .unwrap_or(false)
}

fn entry_has_in_list(entry: &Value, key: &str, wanted: &str) -> bool {
    entry
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .any(|item| item.eq_ignore_ascii_case(wanted))
        })
        .unwrap_or(false)
}

impl SearchIndex {
    pub fn new(rows: Vec<IndexRow>) -> Self {
        Self { rows }
    }

    pub fn from_jsonl(text: &str) -> Result<Self> {
        Ok(Self::new(decode_rows(text)?))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_jsonl(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<SearchHit> {
        let tokens = query
            .query
            .as_deref()
            .map(tokenize)
            .filter(|t| !t.is_empty());

        let mut hits: Vec<SearchHit> = Vec::new();
        for row in &self.rows {
            if row.group != query.group {
                continue;
            }
            if let Some(ids) = &query.ids {
                if !ids.iter().any(|id| id == &row.id) {
                    continue;
                }
            }
            if let Some(bbox) = &query.bbox {
                if !bbox_matches(row, bbox, query.intersects) {
                    continue;
                }
            }

            // structured filters need the decoded entry
            let entry: Value = match serde_json::from_str(&row.item_json) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unparseable row {}: {}", row.id, e);
                    continue;
                }
            };
            if let Some(theme) = &query.theme {
                if !entry_has_theme(&entry, theme) {
                    continue;
                }
            }
            if let Some(variable) = &query.variable {
                if !entry_has_in_list(&entry, "osc:variables", variable) {
                    continue;
                }
            }
            if let Some(keyword) = &query.keyword {
                if !entry_has_in_list(&entry, "keywords", keyword) {
                    continue;
                }
            }

            let score = match &tokens {
                Some(tokens) => {
                    let score = score_row(row, tokens);
                    if score <= 0.0 {
                        continue;
                    }
                    score
                }
                None => 0.0,
            };

            hits.push(SearchHit {
                id: row.id.clone(),
                group: row.group.clone(),
                title: row.title.clone(),
                score,
                entry,
            });
        }

        if tokens.is_some() {
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        hits.truncate(query.limit);
        hits
    }
}
