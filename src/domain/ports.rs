use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Relative paths of files whose name matches `file_name`, walked
    /// recursively under `dir`, sorted.
    fn list_files(
        &self,
        dir: &str,
        file_name: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Tail chunk of a remote resource plus its total size, from `Content-Range`.
#[derive(Debug, Clone)]
pub struct TailChunk {
    pub bytes: Vec<u8>,
    pub total_size: u64,
}

/// Ranged reads against a remote resource. The zip reader never downloads
/// whole archives; everything goes through these two calls.
pub trait RangeFetch: Send + Sync {
    fn fetch_tail(
        &self,
        url: &str,
        max_len: u64,
    ) -> impl std::future::Future<Output = Result<TailChunk>> + Send;
    /// Byte window `[start, end)`.
    fn fetch_range(
        &self,
        url: &str,
        start: u64,
        end: u64,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

impl<T: RangeFetch> RangeFetch for &T {
    fn fetch_tail(
        &self,
        url: &str,
        max_len: u64,
    ) -> impl std::future::Future<Output = Result<TailChunk>> + Send {
        (**self).fetch_tail(url, max_len)
    }

    fn fetch_range(
        &self,
        url: &str,
        start: u64,
        end: u64,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send {
        (**self).fetch_range(url, start, end)
    }
}

pub trait ConfigProvider: Send + Sync {
    fn catalog_root(&self) -> &str;
    fn output_path(&self) -> &str;
    fn groups(&self) -> &[String];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Item: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Vec<Self::Item>>;
    async fn transform(&self, items: Vec<Self::Item>) -> Result<Self::Output>;
    async fn load(&self, output: Self::Output) -> Result<String>;
}
