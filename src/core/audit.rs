//! FAIR auditing of catalog products.
//!
//! Each product is analysed on its own: link resolution, hosting domains,
//! DOI, then a bounded sample of its data assets is probed for readability
//! and cloud-native format. Per-product results roll up into a catalog-wide
//! report keyed by the `fair:*` metric names.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::core::probe::{is_cloud_native, AssetProber, DEFAULT_ASSET_TYPE};
use crate::core::remote_zip::HttpRangeClient;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{OscError, Result};

pub const APPROVED_DATA_HOSTING_DOMAINS: [&str; 7] = [
    "*.esa.int",
    "s3.waw4-1.cloudferro.com",
    "zenodo.org",
    "doi.org",
    "*.pangaea.de",
    "*.copernicus.eu",
    "*.ac.uk",
];

pub const APPROVED_METADATA_HOSTING_DOMAINS: [&str; 3] =
    ["*.esa.int", "s3.waw4-1.cloudferro.com", "*.github.org"];

/// Some hosts refuse HEAD requests from non-browser agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0";

/// Metric keys with their meaning, in report column order.
pub const FAIR_DESCRIPTIONS: [(&str, &str); 9] = [
    (
        "fair:product_url_resolves",
        "Test whether the dataset URL resolves successfully.",
    ),
    (
        "fair:product_has_doi",
        "Test whether the dataset has an associated DOI.",
    ),
    (
        "fair:product_has_documentation",
        "Test whether the dataset has documentation.",
    ),
    (
        "fair:product_approved_metadata_domain",
        "Test whether the metadata is hosted on an approved domain.",
    ),
    (
        "fair:product_approved_data_domain",
        "Test whether the data is hosted on an approved domain.",
    ),
    (
        "fair:file_access",
        "Test whether the metadata has per-file metadata, or if the data is a raw dump.",
    ),
    (
        "fair:file_acessible_files_rate",
        "Percent of assets that could be opened in tests.",
    ),
    (
        "fair:file_cloud_assets_rate",
        "Percent of assets that are in cloud-optimised format.",
    ),
    ("fair:workflow_exists", "Dataset has associated workflow."),
];

#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub approved_data_domains: Vec<String>,
    pub approved_metadata_domains: Vec<String>,
    pub timeout: Duration,
    pub max_asset_checks: usize,
    /// Fixed seed for reproducible asset sampling.
    pub seed: Option<u64>,
    pub user_agent: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            approved_data_domains: APPROVED_DATA_HOSTING_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            approved_metadata_domains: APPROVED_METADATA_HOSTING_DOMAINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: Duration::from_secs(5),
            max_asset_checks: 10,
            seed: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRef {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetAudit {
    pub child_link: String,
    pub is_prr: bool,
    pub checked: Vec<AssetRef>,
    pub success_flags: Vec<bool>,
    pub success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Complete analysis result for a single product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductAudit {
    pub product_id: String,
    pub via_href: Option<String>,
    pub child_href: Option<String>,
    pub has_doc: bool,
    pub has_workflow: bool,
    pub has_doi: bool,
    pub via_response_ok: bool,
    pub child_response_ok: bool,
    pub via_domain_ok: bool,
    pub child_domain_ok: bool,
    pub asset_audit: Option<AssetAudit>,
    pub cloud_score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditSummary {
    pub num_products_with_via: usize,
    pub num_products_with_child: usize,
}

/// Catalog-wide aggregation, one map per metric keyed by product id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub access_ok: BTreeMap<String, bool>,
    pub child_ok: BTreeMap<String, bool>,
    pub data_domain_ok: BTreeMap<String, bool>,
    pub metadata_domain_ok: BTreeMap<String, bool>,
    pub has_documentation: BTreeMap<String, bool>,
    pub has_workflow: BTreeMap<String, bool>,
    pub has_doi: BTreeMap<String, bool>,
    pub per_child_asset_checks: BTreeMap<String, AssetAudit>,
    pub cloud_assets: BTreeMap<String, f64>,
}

impl AuditReport {
    pub fn from_audits(audits: &[ProductAudit]) -> Self {
        let mut report = AuditReport::default();
        for audit in audits {
            let id = audit.product_id.clone();
            if audit.via_href.is_some() {
                report.summary.num_products_with_via += 1;
                report.access_ok.insert(id.clone(), audit.via_response_ok);
                report.data_domain_ok.insert(id.clone(), audit.via_domain_ok);
            }
            if audit.child_href.is_some() {
                report.summary.num_products_with_child += 1;
                report.child_ok.insert(id.clone(), audit.child_response_ok);
                report
                    .metadata_domain_ok
                    .insert(id.clone(), audit.child_domain_ok);
                if let Some(asset_audit) = &audit.asset_audit {
                    report
                        .per_child_asset_checks
                        .insert(id.clone(), asset_audit.clone());
                    report.cloud_assets.insert(id.clone(), audit.cloud_score);
                }
            }
            report.has_documentation.insert(id.clone(), audit.has_doc);
            report.has_workflow.insert(id.clone(), audit.has_workflow);
            report.has_doi.insert(id, audit.has_doi);
        }
        report
    }
}

/// Render one product's audit as the nine `fair:*` metrics.
pub fn fair_metrics(audit: &ProductAudit) -> BTreeMap<String, Value> {
    let accessible_rate = audit
        .asset_audit
        .as_ref()
        .and_then(|a| a.success_rate)
        .unwrap_or(0.0);

    let mut metrics = BTreeMap::new();
    metrics.insert(
        "fair:product_url_resolves".to_string(),
        Value::Bool(audit.via_response_ok),
    );
    metrics.insert(
        "fair:product_has_doi".to_string(),
        Value::Bool(audit.has_doi),
    );
    metrics.insert(
        "fair:product_has_documentation".to_string(),
        Value::Bool(audit.has_doc),
    );
    metrics.insert(
        "fair:product_approved_metadata_domain".to_string(),
        Value::Bool(audit.child_domain_ok),
    );
    metrics.insert(
        "fair:product_approved_data_domain".to_string(),
        Value::Bool(audit.via_domain_ok),
    );
    metrics.insert(
        "fair:file_access".to_string(),
        Value::Bool(audit.child_response_ok),
    );
    metrics.insert(
        "fair:file_acessible_files_rate".to_string(),
        serde_json::json!(accessible_rate),
    );
    metrics.insert(
        "fair:file_cloud_assets_rate".to_string(),
        serde_json::json!(audit.cloud_score),
    );
    metrics.insert(
        "fair:workflow_exists".to_string(),
        Value::Bool(audit.has_workflow),
    );
    metrics
}

/// CSV table: one row per product, one column per metric.
pub fn fair_metrics_csv(audits: &[ProductAudit]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["product_id".to_string()];
    header.extend(FAIR_DESCRIPTIONS.iter().map(|(key, _)| key.to_string()));
    writer.write_record(&header)?;

    for audit in audits {
        let metrics = fair_metrics(audit);
        let mut row = vec![audit.product_id.clone()];
        for (key, _) in FAIR_DESCRIPTIONS {
            let cell = match metrics.get(key) {
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            row.push(cell);
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OscError::processing(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| OscError::processing(format!("CSV is not UTF-8: {}", e)))
}

fn is_prr(link: &str) -> bool {
    link.contains("https://eoresults.esa.int")
}

/// Wildcard hostname check ("*.esa.int" matches "eoresults.esa.int").
pub fn check_domain(url: &str, allowed_patterns: &[String]) -> bool {
    if url.is_empty() {
        return false;
    }
    let hostname = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_string(),
            None => return false,
        },
        Err(_) => return false,
    };

    allowed_patterns.iter().any(|pattern| {
        let anchored = format!("^{}$", regex::escape(pattern).replace("\\*", ".*"));
        regex::Regex::new(&anchored)
            .map(|re| re.is_match(&hostname))
            .unwrap_or(false)
    })
}

/// Resolve an asset href against its hosting conventions.
pub fn resolve_asset_href(feature: &Value, asset: &Value) -> String {
    let href = asset.get("href").and_then(Value::as_str).unwrap_or("");

    if href.contains("EarthCODE/OSCAssets") && !href.starts_with('/') {
        return format!("https://s3.waw4-1.cloudferro.com/{}", href);
    }
    if !href.starts_with('/') {
        return href.to_string();
    }

    // root-relative: resolve against the feature's first link origin
    let root_href = feature
        .get("links")
        .and_then(Value::as_array)
        .and_then(|links| links.first())
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
        .unwrap_or("");
    match Url::parse(root_href) {
        Ok(root) => format!("{}{}", root.origin().ascii_serialization(), href),
        Err(_) => href.to_string(),
    }
}

// Deterministic sampling without an external RNG: splitmix64 driving a
// partial Fisher-Yates shuffle.
struct SplitMix64(u64);

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

pub fn sample_assets<T: Clone>(items: &[T], max_checks: usize, seed: Option<u64>) -> Vec<T> {
    if items.len() <= max_checks {
        return items.to_vec();
    }

    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut rng = SplitMix64::new(seed);

    let mut indices: Vec<usize> = (0..items.len()).collect();
    for i in 0..max_checks {
        let j = i + (rng.next_u64() as usize) % (indices.len() - i);
        indices.swap(i, j);
    }
    indices[..max_checks]
        .iter()
        .map(|&i| items[i].clone())
        .collect()
}

pub struct FairAuditor {
    client: reqwest::Client,
    prober: AssetProber<HttpRangeClient>,
    settings: AuditSettings,
}

impl FairAuditor {
    pub fn new(settings: AuditSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let prober = AssetProber::new(HttpRangeClient::with_client(client.clone()));
        Ok(Self {
            client,
            prober,
            settings,
        })
    }

    /// HEAD a URL, retrying the way the hosting quirks demand: result
    /// archives only answer GET, other picky hosts want a browser agent.
    pub async fn try_response(&self, url: &str) -> Result<StatusCode> {
        if let Ok(response) = self.client.head(url).send().await {
            if response.status() == StatusCode::OK {
                return Ok(response.status());
            }
        }

        let response = if is_prr(url) {
            self.client.get(url).send().await?
        } else {
            self.client
                .head(url)
                .header(USER_AGENT, self.settings.user_agent.as_str())
                .send()
                .await?
        };
        Ok(response.status())
    }

    async fn url_resolves(&self, url: &str) -> bool {
        matches!(self.try_response(url).await, Ok(status) if status == StatusCode::OK)
    }

    /// A product has a usable DOI when `sci:doi` is set and resolves.
    pub async fn check_doi(&self, product: &Value) -> bool {
        match product.get("sci:doi").and_then(Value::as_str) {
            Some(doi) if !doi.is_empty() => {
                self.url_resolves(&format!("https://doi.org/{}", doi)).await
            }
            _ => false,
        }
    }

    /// Collect (resolved href, media type) for every data asset reachable
    /// from a child link.
    async fn load_asset_refs(&self, child_href: &str) -> Result<(bool, Vec<AssetRef>)> {
        let prr = is_prr(child_href);

        let document: Value = if prr {
            let url = format!("{}/items?limit=10000", child_href);
            self.client.get(url).send().await?.error_for_status()?.json().await?
        } else {
            self.client
                .get(child_href)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?
        };

        let mut features: Vec<Value> = Vec::new();
        if let Some(listed) = document.get("features").and_then(Value::as_array) {
            features.extend(listed.iter().cloned());
        } else if document.get("type").and_then(Value::as_str) == Some("Feature") {
            features.push(document.clone());
        } else if let Some(links) = document.get("links").and_then(Value::as_array) {
            // a collection document: fetch each item link
            let base = Url::parse(child_href)
                .map_err(|e| OscError::processing(format!("Bad child link: {}", e)))?;
            for link in links {
                if link.get("rel").and_then(Value::as_str) != Some("item") {
                    continue;
                }
                let href = link.get("href").and_then(Value::as_str).unwrap_or("");
                let item_url = base
                    .join(href)
                    .map_err(|e| OscError::processing(format!("Bad item link: {}", e)))?;
                let item: Value = self
                    .client
                    .get(item_url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                features.push(item);
            }
        }

        let mut refs = Vec::new();
        for feature in &features {
            let assets = match feature.get("assets").and_then(Value::as_object) {
                Some(assets) => assets,
                None => continue,
            };
            for asset in assets.values() {
                let is_data = asset
                    .get("roles")
                    .and_then(Value::as_array)
                    .map(|roles| roles.len() == 1 && roles[0] == "data")
                    .unwrap_or(false);
                if !is_data {
                    continue;
                }
                refs.push(AssetRef {
                    href: resolve_asset_href(feature, asset),
                    media_type: asset
                        .get("type")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }

        Ok((prr, refs))
    }

    /// Analyse a single product collection document.
    pub async fn analyse_product(&self, product: &Value) -> ProductAudit {
        let product_id = product
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let links = product
            .get("links")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let first_href = |rel: &str| -> Option<String> {
            links
                .iter()
                .find(|l| l.get("rel").and_then(Value::as_str) == Some(rel))
                .and_then(|l| l.get("href").and_then(Value::as_str))
                .map(str::to_string)
        };
        let via_href = first_href("via");
        let child_href = first_href("child");

        let mut has_doc = false;
        let mut has_workflow = false;
        for link in &links {
            let title = link.get("title").and_then(Value::as_str);
            if title == Some("Documentation") {
                has_doc = true;
            }
            if link.get("rel").and_then(Value::as_str) == Some("related")
                && title.map(|t| t.contains("Experiment: ")).unwrap_or(false)
            {
                has_workflow = true;
            }
        }

        let has_doi = self.check_doi(product).await;

        let via_response_ok = match &via_href {
            Some(href) => self.url_resolves(href).await,
            None => false,
        };
        let child_response_ok = match &child_href {
            Some(href) => self.url_resolves(href).await,
            None => false,
        };

        let via_domain_ok = via_href
            .as_deref()
            .map(|href| check_domain(href, &self.settings.approved_data_domains))
            .unwrap_or(false);
        let child_domain_ok = child_href
            .as_deref()
            .map(|href| check_domain(href, &self.settings.approved_metadata_domains))
            .unwrap_or(false);

        let mut asset_audit = None;
        let mut cloud_score = 0.0;

        if let Some(child) = &child_href {
            match self.load_asset_refs(child).await {
                Ok((prr, assets)) => {
                    // missing media type means legacy netcdf
                    let assets: Vec<AssetRef> = assets
                        .into_iter()
                        .map(|a| AssetRef {
                            media_type: a
                                .media_type
                                .or_else(|| Some(DEFAULT_ASSET_TYPE.to_string())),
                            ..a
                        })
                        .collect();

                    let subset =
                        sample_assets(&assets, self.settings.max_asset_checks, self.settings.seed);
                    let mut success_flags = Vec::with_capacity(subset.len());
                    for asset in &subset {
                        success_flags.push(
                            self.prober
                                .check(&asset.href, asset.media_type.as_deref(), prr)
                                .await,
                        );
                    }

                    let success_rate = if subset.is_empty() {
                        None
                    } else {
                        let ok = success_flags.iter().filter(|&&b| b).count();
                        Some(ok as f64 / success_flags.len() as f64)
                    };

                    if !subset.is_empty() {
                        let cloud = subset
                            .iter()
                            .filter(|a| {
                                a.media_type
                                    .as_deref()
                                    .map(is_cloud_native)
                                    .unwrap_or(false)
                            })
                            .count();
                        cloud_score = cloud as f64 / subset.len() as f64;
                    }

                    asset_audit = Some(AssetAudit {
                        child_link: child.clone(),
                        is_prr: prr,
                        checked: subset,
                        success_flags,
                        success_rate,
                        error: None,
                    });
                }
                Err(e) => {
                    asset_audit = Some(AssetAudit {
                        child_link: child.clone(),
                        is_prr: is_prr(child),
                        checked: Vec::new(),
                        success_flags: Vec::new(),
                        success_rate: None,
                        error: Some(format!("Failed to load items: {}", e)),
                    });
                    cloud_score = 0.0;
                }
            }
        }

        ProductAudit {
            product_id,
            via_href,
            child_href,
            has_doc,
            has_workflow,
            has_doi,
            via_response_ok,
            child_response_ok,
            via_domain_ok,
            child_domain_ok,
            asset_audit,
            cloud_score,
        }
    }
}

/// Join a relative href onto a directory path within the catalog tree.
fn join_relative(base_dir: &str, href: &str) -> String {
    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

/// Walks a catalog checkout's products and audits each one.
pub struct AuditPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
    auditor: FairAuditor,
    format: ReportFormat,
}

impl<S: Storage, C: ConfigProvider> AuditPipeline<S, C> {
    /// `source` is rooted at the catalog checkout, `sink` at the output
    /// directory.
    pub fn new(
        source: S,
        sink: S,
        config: C,
        auditor: FairAuditor,
        format: ReportFormat,
    ) -> Self {
        Self {
            source,
            sink,
            config,
            auditor,
            format,
        }
    }

    async fn read_json(&self, path: &str) -> Result<Value> {
        let raw = self.source.read_file(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn child_hrefs(document: &Value) -> Vec<String> {
        document
            .get("links")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .filter(|l| l.get("rel").and_then(Value::as_str) == Some("child"))
                    .filter_map(|l| l.get("href").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AuditPipeline<S, C> {
    type Item = Value;
    type Output = Vec<ProductAudit>;

    async fn extract(&self) -> Result<Vec<Value>> {
        let root = self.read_json("catalog.json").await?;

        // locate the products catalog among the root's children
        let mut products_dir = None;
        for href in Self::child_hrefs(&root) {
            if href.contains("://") {
                continue;
            }
            let path = join_relative("", &href);
            let child = self.read_json(&path).await?;
            if child.get("id").and_then(Value::as_str) == Some("products") {
                let dir = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("").to_string();
                products_dir = Some((dir, child));
                break;
            }
        }
        let (products_dir, products_catalog) = products_dir
            .ok_or_else(|| OscError::processing("Catalog has no child named 'products'"))?;

        let mut products = Vec::new();
        for href in Self::child_hrefs(&products_catalog) {
            if href.contains("://") {
                continue;
            }
            let path = join_relative(&products_dir, &href);
            products.push(self.read_json(&path).await?);
        }
        Ok(products)
    }

    async fn transform(&self, products: Vec<Value>) -> Result<Vec<ProductAudit>> {
        let mut audits = Vec::with_capacity(products.len());
        for product in &products {
            let id = product.get("id").and_then(Value::as_str).unwrap_or("?");
            tracing::info!("Auditing product '{}'", id);
            audits.push(self.auditor.analyse_product(product).await);
        }
        Ok(audits)
    }

    async fn load(&self, audits: Vec<ProductAudit>) -> Result<String> {
        let (file_name, body) = match self.format {
            ReportFormat::Json => {
                let report = AuditReport::from_audits(&audits);
                ("fair_report.json", serde_json::to_string_pretty(&report)?)
            }
            ReportFormat::Csv => ("fair_report.csv", fair_metrics_csv(&audits)?),
        };
        self.sink.write_file(file_name, body.as_bytes()).await?;
        Ok(format!("{}/{}", self.config.output_path(), file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_check_domain_wildcards() {
        let allowed = patterns(&["*.esa.int", "zenodo.org"]);
        assert!(check_domain("https://eoresults.esa.int/d/x", &allowed));
        assert!(check_domain("https://zenodo.org/record/1", &allowed));
        assert!(!check_domain("https://zenodo.org.evil.com/x", &allowed));
        assert!(!check_domain("https://example.com/", &allowed));
        assert!(!check_domain("", &allowed));
        assert!(!check_domain("not a url", &allowed));
    }

    #[test]
    fn test_resolve_asset_href() {
        let feature = json!({
            "links": [{"rel": "root", "href": "https://data.example.org/catalog/collection.json"}]
        });

        let cloudferro = json!({"href": "EarthCODE/OSCAssets/waposal/a.zarr"});
        assert_eq!(
            resolve_asset_href(&feature, &cloudferro),
            "https://s3.waw4-1.cloudferro.com/EarthCODE/OSCAssets/waposal/a.zarr"
        );

        let absolute = json!({"href": "https://other.example.org/file.nc"});
        assert_eq!(
            resolve_asset_href(&feature, &absolute),
            "https://other.example.org/file.nc"
        );

        let root_relative = json!({"href": "/d/2024/file.nc"});
        assert_eq!(
            resolve_asset_href(&feature, &root_relative),
            "https://data.example.org/d/2024/file.nc"
        );
    }

    #[test]
    fn test_sample_assets_is_seeded_and_bounded() {
        let items: Vec<u32> = (0..100).collect();

        let small = sample_assets(&items[..5], 10, Some(1));
        assert_eq!(small, items[..5].to_vec());

        let a = sample_assets(&items, 10, Some(123));
        let b = sample_assets(&items, 10, Some(123));
        let c = sample_assets(&items, 10, Some(124));
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fair_metrics_mapping() {
        let audit = ProductAudit {
            product_id: "p".to_string(),
            via_href: Some("https://zenodo.org/x".to_string()),
            child_href: None,
            has_doc: true,
            has_workflow: false,
            has_doi: true,
            via_response_ok: true,
            child_response_ok: false,
            via_domain_ok: true,
            child_domain_ok: false,
            asset_audit: None,
            cloud_score: 0.5,
        };

        let metrics = fair_metrics(&audit);
        assert_eq!(metrics["fair:product_url_resolves"], Value::Bool(true));
        assert_eq!(metrics["fair:file_access"], Value::Bool(false));
        assert_eq!(metrics["fair:file_acessible_files_rate"], json!(0.0));
        assert_eq!(metrics["fair:file_cloud_assets_rate"], json!(0.5));
        assert_eq!(metrics.len(), FAIR_DESCRIPTIONS.len());
    }

    #[test]
    fn test_fair_metrics_csv_layout() {
        let audit = ProductAudit {
            product_id: "prod-1".to_string(),
            via_href: None,
            child_href: None,
            has_doc: false,
            has_workflow: false,
            has_doi: false,
            via_response_ok: false,
            child_response_ok: false,
            via_domain_ok: false,
            child_domain_ok: false,
            asset_audit: None,
            cloud_score: 0.0,
        };

        let csv = fair_metrics_csv(&[audit]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("product_id,fair:product_url_resolves"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("prod-1,false"));
    }

    #[test]
    fn test_report_aggregation() {
        let audits = vec![
            ProductAudit {
                product_id: "a".to_string(),
                via_href: Some("https://zenodo.org/a".to_string()),
                child_href: None,
                has_doc: true,
                has_workflow: false,
                has_doi: false,
                via_response_ok: true,
                child_response_ok: false,
                via_domain_ok: true,
                child_domain_ok: false,
                asset_audit: None,
                cloud_score: 0.0,
            },
            ProductAudit {
                product_id: "b".to_string(),
                via_href: None,
                child_href: Some("https://meta.example.org/b.json".to_string()),
                has_doc: false,
                has_workflow: true,
                has_doi: true,
                via_response_ok: false,
                child_response_ok: true,
                via_domain_ok: false,
                child_domain_ok: false,
                asset_audit: Some(AssetAudit {
                    child_link: "https://meta.example.org/b.json".to_string(),
                    is_prr: false,
                    checked: Vec::new(),
                    success_flags: Vec::new(),
                    success_rate: None,
                    error: None,
                }),
                cloud_score: 0.0,
            },
        ];

        let report = AuditReport::from_audits(&audits);
        assert_eq!(report.summary.num_products_with_via, 1);
        assert_eq!(report.summary.num_products_with_child, 1);
        assert_eq!(report.access_ok.get("a"), Some(&true));
        assert!(report.access_ok.get("b").is_none());
        assert!(report.per_child_asset_checks.contains_key("b"));
        assert_eq!(report.has_doi.get("b"), Some(&true));
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("", "./products/catalog.json"), "products/catalog.json");
        assert_eq!(
            join_relative("products", "./seasfire-cube/collection.json"),
            "products/seasfire-cube/collection.json"
        );
        assert_eq!(
            join_relative("products/x", "../../projects/p/collection.json"),
            "projects/p/collection.json"
        );
    }
}
