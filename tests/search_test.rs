//! Index build + search over a small catalog checkout.

use std::fs;
use std::path::Path;

use osc_tools::core::index::IndexPipeline;
use osc_tools::{JobConfig, LocalStorage, PipelineEngine, SearchIndex, SearchQuery};
use serde_json::{json, Value};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, value: Value) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn seed_checkout(root: &Path) {
    write(
        root,
        "products/catalog.json",
        json!({
            "type": "Catalog",
            "id": "products",
            "title": "Products",
            "description": "Products"
        }),
    );
    write(
        root,
        "products/seasfire-cube/collection.json",
        json!({
            "type": "Collection",
            "id": "seasfire-cube",
            "title": "SeasFire Cube",
            "description": "Datacube for seasonal fire forecasting in Europe",
            "keywords": ["seasonal fire modeling"],
            "osc:variables": ["burned-area"],
            "themes": [{"scheme": "s", "concepts": [{"id": "land"}]}],
            "extent": {"spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
                       "temporal": {"interval": [[null, null]]}}
        }),
    );
    write(
        root,
        "products/binary-wet-snow/collection.json",
        json!({
            "type": "Collection",
            "id": "binary-wet-snow",
            "title": "Binary Wet Snow Maps",
            "description": "Wet snow extent over the Alps from Sentinel-1",
            "keywords": ["snow"],
            "osc:variables": ["snow-cover"],
            "themes": [{"scheme": "s", "concepts": [{"id": "cryosphere"}]}],
            "extent": {"spatial": {"bbox": [[4.0, 43.0, 17.0, 49.0]]},
                       "temporal": {"interval": [[null, null]]}}
        }),
    );
    write(
        root,
        "variables/burned-area/catalog.json",
        json!({
            "type": "Catalog",
            "id": "burned-area",
            "title": "Burned Area",
            "description": "Area affected by fire"
        }),
    );
}

async fn build_index(checkout: &Path, output: &Path, groups: &[&str]) -> String {
    let config = JobConfig {
        catalog_root: checkout.to_string_lossy().into_owned(),
        output_path: output.to_string_lossy().into_owned(),
        groups: groups.iter().map(|g| g.to_string()).collect(),
    };
    let pipeline = IndexPipeline::new(
        LocalStorage::new(config.catalog_root.clone()),
        LocalStorage::new(config.output_path.clone()),
        config,
    );
    PipelineEngine::new(pipeline).run().await.unwrap()
}

#[tokio::test]
async fn test_index_build_and_semantic_filters() {
    let checkout = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_checkout(checkout.path());

    let index_path = build_index(checkout.path(), output.path(), &["products", "variables"]).await;
    assert!(index_path.ends_with("index.jsonl"));

    let index = SearchIndex::from_file(&output.path().join("index.jsonl")).unwrap();
    // two products, their group catalog, and one variable
    assert_eq!(index.len(), 4);

    // id lookup without a text query
    let hits = index.search(&SearchQuery {
        ids: Some(vec!["seasfire-cube".to_string()]),
        limit: 1,
        ..Default::default()
    });
    assert_eq!(hits[0].id, "seasfire-cube");

    // text search ranks the fire product first
    let hits = index.search(&SearchQuery {
        query: Some("forest fires".to_string()),
        limit: 3,
        ..Default::default()
    });
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, "seasfire-cube");

    // variable group search
    let hits = index.search(&SearchQuery {
        query: Some("burned area".to_string()),
        group: "variables".to_string(),
        limit: 2,
        ..Default::default()
    });
    assert_eq!(hits[0].id, "burned-area");
}

#[tokio::test]
async fn test_bbox_intersects_hits_expected_product() {
    let checkout = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_checkout(checkout.path());
    build_index(checkout.path(), output.path(), &["products"]).await;

    let index = SearchIndex::from_file(&output.path().join("index.jsonl")).unwrap();
    let alps_bbox = [5.95591129, 45.81799493, 10.49229402, 47.80846475];

    let hits = index.search(&SearchQuery {
        query: Some("snow data".to_string()),
        bbox: Some(alps_bbox),
        limit: 10,
        ..Default::default()
    });
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&"binary-wet-snow"));

    // containment excludes the product whose extent spills past the box
    let hits = index.search(&SearchQuery {
        query: Some("snow data".to_string()),
        bbox: Some(alps_bbox),
        intersects: false,
        limit: 10,
        ..Default::default()
    });
    assert!(!hits.iter().any(|h| h.id == "binary-wet-snow"));
}

#[tokio::test]
async fn test_combined_filters() {
    let checkout = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_checkout(checkout.path());
    build_index(checkout.path(), output.path(), &["products"]).await;

    let index = SearchIndex::from_file(&output.path().join("index.jsonl")).unwrap();

    let land = index.search(&SearchQuery {
        query: Some("fire".to_string()),
        theme: Some("land".to_string()),
        limit: 5,
        ..Default::default()
    });
    assert_eq!(land.len(), 1);

    let oceans = index.search(&SearchQuery {
        query: Some("fire".to_string()),
        theme: Some("oceans".to_string()),
        limit: 5,
        ..Default::default()
    });
    assert!(oceans.is_empty());

    let by_variable = index.search(&SearchQuery {
        variable: Some("burned-area".to_string()),
        limit: 5,
        ..Default::default()
    });
    assert!(by_variable.iter().any(|h| h.id == "seasfire-cube"));

    let by_keyword = index.search(&SearchQuery {
        keyword: Some("seasonal fire modeling".to_string()),
        limit: 5,
        ..Default::default()
    });
    assert!(by_keyword.iter().any(|h| h.id == "seasfire-cube"));
}

#[tokio::test]
async fn test_missing_group_directory_fails_the_build() {
    let checkout = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_checkout(checkout.path());

    let config = JobConfig {
        catalog_root: checkout.path().to_string_lossy().into_owned(),
        output_path: output.path().to_string_lossy().into_owned(),
        groups: vec!["workflows".to_string()],
    };
    let pipeline = IndexPipeline::new(
        LocalStorage::new(config.catalog_root.clone()),
        LocalStorage::new(config.output_path.clone()),
        config,
    );
    assert!(PipelineEngine::new(pipeline).run().await.is_err());
}
