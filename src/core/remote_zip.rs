//! Ranged access to remote zip archives.
//!
//! Data assets in the catalog are often multi-gigabyte zips (zipped zarr
//! stores in particular). One ranged request for the archive tail is enough
//! to rebuild the member table from the central directory; after that,
//! individual members are served with exact byte-window requests, so no
//! archive is ever downloaded whole.
//!
//! Only stored (uncompressed) members can be read this way; local headers
//! with extra fields and zip64 archives are not handled.

use std::collections::BTreeMap;

use crate::domain::ports::{RangeFetch, TailChunk};
use crate::utils::error::{OscError, Result};

/// Tail window requested when opening an archive.
pub const DEFAULT_TAIL_BYTES: u64 = 1024 * 1024;

const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];
const CENTRAL_HEADER_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
const EOCD_FIXED_LEN: usize = 22;
const CENTRAL_HEADER_FIXED_LEN: usize = 46;
const LOCAL_HEADER_FIXED_LEN: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Uncompressed member size.
    pub size: u64,
    /// Absolute offset of the member's data in the archive.
    pub offset: u64,
    /// Zip compression method; 0 = stored.
    pub method: u16,
}

fn read_u16(bytes: &[u8], at: usize) -> u64 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]]) as u64
}

fn read_u32(bytes: &[u8], at: usize) -> u64 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as u64
}

/// Rebuild the member table from a tail chunk of the archive.
///
/// Returns (files, directory children). Offsets account for data prepended
/// in front of the archive proper (the recorded central directory offset is
/// reconciled against its actual position).
pub fn parse_central_directory(
    tail: &[u8],
    total_size: u64,
) -> Result<(BTreeMap<String, RemoteEntry>, BTreeMap<String, Vec<String>>)> {
    if tail.len() < EOCD_FIXED_LEN {
        return Err(OscError::archive("archive tail is too short"));
    }
    if tail.len() as u64 > total_size {
        return Err(OscError::archive("tail chunk is larger than the resource"));
    }

    // last EOCD record wins, same as local unzip tools
    let eocd_pos = (0..=tail.len() - EOCD_FIXED_LEN)
        .rev()
        .find(|&i| tail[i..i + 4] == EOCD_SIGNATURE)
        .ok_or_else(|| OscError::archive("end of central directory not found in tail window"))?;

    let eocd = &tail[eocd_pos..];
    let total_entries = read_u16(eocd, 10);
    let cd_size = read_u32(eocd, 12);
    let cd_offset = read_u32(eocd, 16);

    if total_entries == 0xFFFF || cd_size == 0xFFFF_FFFF || cd_offset == 0xFFFF_FFFF {
        return Err(OscError::archive("zip64 archives are not supported"));
    }

    let cd_pos = (eocd_pos as u64)
        .checked_sub(cd_size)
        .ok_or_else(|| {
            OscError::archive("tail window too small for central directory; increase tail size")
        })? as usize;

    // reconcile recorded offsets with where the directory actually sits
    let eocd_abs = total_size - tail.len() as u64 + eocd_pos as u64;
    let cd_abs = eocd_abs - cd_size;
    if cd_abs < cd_offset {
        return Err(OscError::archive("central directory offset is inconsistent"));
    }
    let prepended = cd_abs - cd_offset;

    let mut files = BTreeMap::new();
    let mut dirs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut pos = cd_pos;

    for _ in 0..total_entries {
        if pos + CENTRAL_HEADER_FIXED_LEN > tail.len()
            || tail[pos..pos + 4] != CENTRAL_HEADER_SIGNATURE
        {
            return Err(OscError::archive("malformed central directory header"));
        }
        let header = &tail[pos..];
        let method = read_u16(header, 10) as u16;
        let uncompressed_size = read_u32(header, 24);
        let name_len = read_u16(header, 28) as usize;
        let extra_len = read_u16(header, 30) as usize;
        let comment_len = read_u16(header, 32) as usize;
        let local_offset = read_u32(header, 42);

        let name_start = pos + CENTRAL_HEADER_FIXED_LEN;
        if name_start + name_len > tail.len() {
            return Err(OscError::archive("truncated central directory entry"));
        }
        let raw_name = String::from_utf8_lossy(&tail[name_start..name_start + name_len]);
        let name = raw_name.trim_end_matches('/').to_string();
        pos = name_start + name_len + extra_len + comment_len;

        if name.is_empty() {
            continue;
        }

        files.insert(
            name.clone(),
            RemoteEntry {
                size: uncompressed_size,
                offset: local_offset + prepended + LOCAL_HEADER_FIXED_LEN + name_len as u64,
                method,
            },
        );

        let parent = match name.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
        dirs.entry(parent).or_default().push(name);
    }

    Ok((files, dirs))
}

/// posix-style normalization: strip slashes at both ends, resolve `.`/`..`.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
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

pub struct RemoteZip<F: RangeFetch> {
    fetch: F,
    url: String,
    files: BTreeMap<String, RemoteEntry>,
    dirs: BTreeMap<String, Vec<String>>,
}

impl<F: RangeFetch> RemoteZip<F> {
    pub async fn open(fetch: F, url: &str) -> Result<Self> {
        Self::open_with_tail(fetch, url, DEFAULT_TAIL_BYTES).await
    }

    pub async fn open_with_tail(fetch: F, url: &str, tail_len: u64) -> Result<Self> {
        let TailChunk { bytes, total_size } = fetch.fetch_tail(url, tail_len).await?;
        let (files, dirs) = parse_central_directory(&bytes, total_size)?;
        tracing::debug!("Opened remote archive {} with {} members", url, files.len());
        Ok(Self {
            fetch,
            url: url.to_string(),
            files,
            dirs,
        })
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn entry(&self, path: &str) -> Option<&RemoteEntry> {
        self.files.get(&normalize_path(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains_key(&normalize_path(path))
    }

    /// Names directly under a directory ("" for the archive root).
    pub fn children(&self, path: &str) -> Option<&[String]> {
        self.dirs.get(&normalize_path(path)).map(Vec::as_slice)
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.read_window(path, None, None).await
    }

    /// Read a byte window of a member. Negative offsets count from the end
    /// of the member; out-of-range windows clamp to empty.
    pub async fn read_window(
        &self,
        path: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<u8>> {
        let path = normalize_path(path);
        if self.dirs.contains_key(&path) && !self.files.contains_key(&path) {
            return Err(OscError::archive(format!("{} is a directory", path)));
        }
        let entry = self
            .files
            .get(&path)
            .ok_or_else(|| OscError::archive(format!("member {} not found", path)))?;
        if self.dirs.contains_key(&path) {
            return Err(OscError::archive(format!("{} is a directory", path)));
        }
        if entry.method != 0 {
            return Err(OscError::archive(format!(
                "member {} is compressed (method {}); only stored members can be read remotely",
                path, entry.method
            )));
        }

        let size = entry.size as i64;
        let mut start = start.unwrap_or(0);
        if start < 0 {
            start = (size + start).max(0);
        }
        let mut end = end.unwrap_or(size);
        if end < 0 {
            end = (size + end).max(0);
        }
        if start >= size || end <= start {
            return Ok(Vec::new());
        }
        let read_size = end.min(size) - start;

        let from = entry.offset + start as u64;
        self.fetch
            .fetch_range(&self.url, from, from + read_size as u64)
            .await
    }
}

/// Reqwest-backed [`RangeFetch`] using HTTP `Range` headers.
pub struct HttpRangeClient {
    client: reqwest::Client,
}

impl HttpRangeClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpRangeClient {
    fn default() -> Self {
        Self::new()
    }
}

/// "bytes 4096-5119/5120" -> 5120
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

impl RangeFetch for HttpRangeClient {
    async fn fetch_tail(&self, url: &str, max_len: u64) -> Result<TailChunk> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, format!("bytes=-{}", max_len))
            .send()
            .await?
            .error_for_status()?;

        let total_size = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);

        let bytes = response.bytes().await?.to_vec();
        // a server that ignores ranges sends the whole resource
        let total_size = total_size.unwrap_or(bytes.len() as u64);
        Ok(TailChunk { bytes, total_size })
    }

    async fn fetch_range(&self, url: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        if end <= start {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, format!("bytes={}-{}", start, end - 1))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    struct MemoryFetch {
        data: Vec<u8>,
    }

    impl RangeFetch for MemoryFetch {
        async fn fetch_tail(&self, _url: &str, max_len: u64) -> Result<TailChunk> {
            let len = self.data.len();
            let take = (max_len as usize).min(len);
            Ok(TailChunk {
                bytes: self.data[len - take..].to_vec(),
                total_size: len as u64,
            })
        }

        async fn fetch_range(&self, _url: &str, start: u64, end: u64) -> Result<Vec<u8>> {
            Ok(self.data[start as usize..end as usize].to_vec())
        }
    }

    fn stored_options() -> FileOptions<'static, ()> {
        FileOptions::default().compression_method(CompressionMethod::Stored)
    }

    fn build_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in members {
            writer.start_file::<_, ()>(*name, stored_options()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_open_and_read_members() {
        let data = build_archive(&[
            ("store/.zattrs", b"{\"zarr_format\": 2}"),
            ("store/data/chunk0", b"0123456789"),
        ]);
        let archive = RemoteZip::open(MemoryFetch { data }, "http://x/archive.zip")
            .await
            .unwrap();

        let names: Vec<&str> = archive.entry_names().collect();
        assert_eq!(names, vec!["store/.zattrs", "store/data/chunk0"]);
        assert_eq!(archive.entry("store/data/chunk0").unwrap().size, 10);
        assert!(archive.is_dir("store"));
        assert!(archive.is_dir("store/data"));

        let content = archive.read("store/data/chunk0").await.unwrap();
        assert_eq!(content, b"0123456789");
        let attrs = archive.read("/store/.zattrs").await.unwrap();
        assert_eq!(attrs, b"{\"zarr_format\": 2}");
    }

    #[tokio::test]
    async fn test_small_tail_window_still_opens() {
        let payload = vec![7u8; 4096];
        let data = build_archive(&[("big.bin", &payload), ("tiny.txt", b"ok")]);
        // tail window covers the central directory but not the members
        let archive = RemoteZip::open_with_tail(MemoryFetch { data }, "http://x/a.zip", 256)
            .await
            .unwrap();

        assert_eq!(archive.read("tiny.txt").await.unwrap(), b"ok");
        assert_eq!(archive.read("big.bin").await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_prepended_data_offsets_are_reconciled() {
        let mut data = b"JUNKJUNKJUNK".to_vec();
        data.extend(build_archive(&[("file.txt", b"hello world")]));

        let archive = RemoteZip::open(MemoryFetch { data }, "http://x/a.zip")
            .await
            .unwrap();
        assert_eq!(archive.read("file.txt").await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_read_window_clamping() {
        let data = build_archive(&[("f", b"0123456789")]);
        let archive = RemoteZip::open(MemoryFetch { data }, "http://x/a.zip")
            .await
            .unwrap();

        assert_eq!(archive.read_window("f", Some(2), Some(5)).await.unwrap(), b"234");
        assert_eq!(archive.read_window("f", Some(-3), None).await.unwrap(), b"789");
        assert_eq!(archive.read_window("f", None, Some(-7)).await.unwrap(), b"012");
        assert_eq!(
            archive.read_window("f", Some(-100), Some(2)).await.unwrap(),
            b"01"
        );
        assert!(archive.read_window("f", Some(20), None).await.unwrap().is_empty());
        assert!(archive.read_window("f", Some(5), Some(5)).await.unwrap().is_empty());
        // end past the member clamps to its size
        assert_eq!(
            archive.read_window("f", Some(8), Some(100)).await.unwrap(),
            b"89"
        );
    }

    #[tokio::test]
    async fn test_missing_member_and_directory_reads_fail() {
        let data = build_archive(&[("dir/file", b"x")]);
        let archive = RemoteZip::open(MemoryFetch { data }, "http://x/a.zip")
            .await
            .unwrap();

        assert!(archive.read("nope").await.is_err());
        let err = archive.read("dir").await.unwrap_err();
        assert!(err.to_string().contains("directory"));
    }

    #[tokio::test]
    async fn test_compressed_member_is_rejected() {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let deflated: FileOptions<'static, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file::<_, ()>("packed.txt", deflated).unwrap();
        writer.write_all(b"compressed content").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let archive = RemoteZip::open(MemoryFetch { data }, "http://x/a.zip")
            .await
            .unwrap();
        let err = archive.read("packed.txt").await.unwrap_err();
        assert!(err.to_string().contains("compressed"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/"), "a/b");
        assert_eq!(normalize_path("a/./b"), "a/b");
        assert_eq!(normalize_path("a/../b"), "b");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_truncated_tail_is_rejected() {
        assert!(parse_central_directory(b"PK", 2).is_err());
        // plausible length, no EOCD signature anywhere
        assert!(parse_central_directory(&[0u8; 64], 64).is_err());
    }

    #[tokio::test]
    async fn test_http_client_parses_content_range() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/file").header("range", "bytes=-4");
            then.status(206)
                .header("Content-Range", "bytes 6-9/10")
                .body("6789");
        });

        let client = HttpRangeClient::new();
        let tail = client.fetch_tail(&server.url("/file"), 4).await.unwrap();
        assert_eq!(tail.bytes, b"6789");
        assert_eq!(tail.total_size, 10);
    }

    #[tokio::test]
    async fn test_http_client_without_range_support_gets_whole_body() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/full");
            then.status(200).body("abcdef");
        });

        let client = HttpRangeClient::new();
        let tail = client.fetch_tail(&server.url("/full"), 1024).await.unwrap();
        assert_eq!(tail.bytes, b"abcdef");
        assert_eq!(tail.total_size, 6);
    }

    #[tokio::test]
    async fn test_http_client_fetch_range_window() {
        use httpmock::prelude::*;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/file").header("range", "bytes=2-4");
            then.status(206)
                .header("Content-Range", "bytes 2-4/10")
                .body("234");
        });

        let client = HttpRangeClient::new();
        let body = client.fetch_range(&server.url("/file"), 2, 5).await.unwrap();
        assert_eq!(body, b"234");

        // degenerate windows never hit the network
        assert!(client
            .fetch_range("http://unreachable.invalid/x", 5, 5)
            .await
            .unwrap()
            .is_empty());
    }
}
