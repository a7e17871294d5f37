//! Readability probes for data assets.
//!
//! A probe answers one question: could a consumer open this asset? Formats
//! are checked at the transport level, with a ranged read of the leading
//! bytes plus a magic-number check (or a store-layout check for zarr), so a
//! probe never downloads an asset.

use crate::core::remote_zip::RemoteZip;
use crate::domain::ports::RangeFetch;
use crate::utils::error::Result;

/// Media type assumed when an asset declares none.
pub const DEFAULT_ASSET_TYPE: &str = "application/x-netcdf";

/// Formats that allow direct partial access from object storage.
pub const CLOUD_NATIVE_FORMATS: [&str; 3] = [
    "application/vnd.apache.geoparquet",
    "image/cog",
    "application/vnd+zarr",
];

const PRR_BASE: &str = "https://eoresults.esa.int/";

pub fn is_cloud_native(media_type: &str) -> bool {
    CLOUD_NATIVE_FORMATS.contains(&media_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    NetCdf,
    Zarr,
    Tiff,
    Zip,
    Pdf,
    Text,
    Csv,
    Parquet,
    Shapefile,
    GeoJson,
}

/// Probe strategy per media type; unknown types are unreadable.
pub fn probe_kind(media_type: &str) -> Option<ProbeKind> {
    match media_type {
        "application/x-netcdf" => Some(ProbeKind::NetCdf),
        "application/vnd+zarr" => Some(ProbeKind::Zarr),
        "image/tiff" | "image/cog" => Some(ProbeKind::Tiff),
        "application/zip" => Some(ProbeKind::Zip),
        "application/pdf" => Some(ProbeKind::Pdf),
        "text/plain" => Some(ProbeKind::Text),
        "text/csv" => Some(ProbeKind::Csv),
        "application/vnd.apache.parquet" | "application/vnd.apache.geoparquet" => {
            Some(ProbeKind::Parquet)
        }
        "application/x-shapefile" => Some(ProbeKind::Shapefile),
        "application/geo+json" => Some(ProbeKind::GeoJson),
        _ => None,
    }
}

/// Magic-number check on the leading bytes of an asset.
fn sniff(kind: ProbeKind, bytes: &[u8]) -> bool {
    match kind {
        // classic netcdf or netcdf4-over-hdf5
        ProbeKind::NetCdf => {
            bytes.starts_with(b"CDF\x01")
                || bytes.starts_with(b"CDF\x02")
                || bytes.starts_with(b"\x89HDF\r\n\x1a\n")
        }
        ProbeKind::Tiff => {
            bytes.starts_with(b"II*\x00")
                || bytes.starts_with(b"MM\x00*")
                || bytes.starts_with(b"II+\x00")
                || bytes.starts_with(b"MM\x00+")
        }
        ProbeKind::Zip => bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06"),
        ProbeKind::Pdf => bytes.starts_with(b"%PDF"),
        ProbeKind::Parquet => bytes.starts_with(b"PAR1"),
        // shapefile header starts with file code 9994, big-endian
        ProbeKind::Shapefile => bytes.len() >= 4 && bytes[..4] == 9994i32.to_be_bytes(),
        ProbeKind::GeoJson => matches!(
            bytes.iter().find(|b| !b.is_ascii_whitespace()),
            Some(b'{') | Some(b'[')
        ),
        // any readable leading bytes count
        ProbeKind::Text | ProbeKind::Csv => true,
        // zarr is a store layout, not a magic number
        ProbeKind::Zarr => false,
    }
}

pub struct AssetProber<F: RangeFetch> {
    fetch: F,
}

impl<F: RangeFetch> AssetProber<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }

    /// Can the asset be opened? Probe failures are verdicts, not errors.
    pub async fn check(&self, href: &str, media_type: Option<&str>, is_prr: bool) -> bool {
        let media_type = media_type.unwrap_or(DEFAULT_ASSET_TYPE);
        let kind = match probe_kind(media_type) {
            Some(kind) => kind,
            None => {
                tracing::debug!("No probe for media type {} ({})", media_type, href);
                return false;
            }
        };

        let target = if is_prr && !href.starts_with(PRR_BASE) {
            format!("{}{}", PRR_BASE, href.trim_start_matches('/'))
        } else {
            href.to_string()
        };

        match self.check_kind(&target, kind, is_prr).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!("Asset probe failed for {} ({}): {}", target, media_type, e);
                false
            }
        }
    }

    async fn check_kind(&self, href: &str, kind: ProbeKind, is_prr: bool) -> Result<bool> {
        match kind {
            ProbeKind::Zarr => self.check_zarr(href, is_prr).await,
            _ => {
                let head = self.fetch.fetch_range(href, 0, 16).await?;
                Ok(sniff(kind, &head))
            }
        }
    }

    /// Zipped stores open through the archive tail; directory stores must
    /// expose their metadata keys. Result archives always ship zarr as zip.
    async fn check_zarr(&self, href: &str, is_prr: bool) -> Result<bool> {
        if is_prr || href.ends_with(".zip") {
            let archive = RemoteZip::open(&self.fetch, href).await?;
            let has_metadata = archive
                .entry_names()
                .any(|name| name.ends_with(".zattrs") || name.ends_with("zarr.json"));
            return Ok(has_metadata);
        }

        let base = href.trim_end_matches('/');
        for key in [".zmetadata", ".zattrs", "zarr.json"] {
            let url = format!("{}/{}", base, key);
            if self.fetch.fetch_range(&url, 0, 1).await.is_ok() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_kind_table() {
        assert_eq!(probe_kind("application/x-netcdf"), Some(ProbeKind::NetCdf));
        assert_eq!(probe_kind("image/cog"), Some(ProbeKind::Tiff));
        assert_eq!(
            probe_kind("application/vnd.apache.geoparquet"),
            Some(ProbeKind::Parquet)
        );
        assert_eq!(probe_kind("application/octet-stream"), None);
    }

    #[test]
    fn test_sniff_magic_numbers() {
        assert!(sniff(ProbeKind::NetCdf, b"CDF\x01rest"));
        assert!(sniff(ProbeKind::NetCdf, b"\x89HDF\r\n\x1a\nrest"));
        assert!(!sniff(ProbeKind::NetCdf, b"not netcdf"));

        assert!(sniff(ProbeKind::Tiff, b"II*\x00"));
        assert!(sniff(ProbeKind::Tiff, b"MM\x00*"));
        assert!(sniff(ProbeKind::Parquet, b"PAR1...."));
        assert!(sniff(ProbeKind::Pdf, b"%PDF-1.7"));
        assert!(sniff(ProbeKind::Zip, b"PK\x03\x04"));
        assert!(sniff(ProbeKind::Shapefile, &[0x00, 0x00, 0x27, 0x0a, 0, 0]));
        assert!(sniff(ProbeKind::GeoJson, b"  {\"type\": \"FeatureCollection\"}"));
        assert!(!sniff(ProbeKind::GeoJson, b"<html>"));
        assert!(sniff(ProbeKind::Csv, b"a,b,c"));
    }

    #[test]
    fn test_cloud_native_formats() {
        assert!(is_cloud_native("application/vnd+zarr"));
        assert!(is_cloud_native("image/cog"));
        assert!(!is_cloud_native("application/x-netcdf"));
    }
}
