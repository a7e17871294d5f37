use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

fn collect_matching(dir: &Path, file_name: &str, base: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_matching(&path, file_name, base, out)?;
        } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name) {
            if let Ok(rel) = path.strip_prefix(base) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(())
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn list_files(&self, dir: &str, file_name: &str) -> Result<Vec<String>> {
        let base = PathBuf::from(&self.base_path);
        let start = base.join(dir);
        let mut out = Vec::new();
        collect_matching(&start, file_name, &base, &mut out)?;
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_listing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().to_string_lossy().into_owned());

        storage
            .write_file("products/a/collection.json", b"{}")
            .await
            .unwrap();
        storage
            .write_file("products/b/collection.json", b"{}")
            .await
            .unwrap();
        storage.write_file("products/catalog.json", b"{}").await.unwrap();

        let data = storage.read_file("products/catalog.json").await.unwrap();
        assert_eq!(data, b"{}");

        let listed = storage
            .list_files("products", "collection.json")
            .await
            .unwrap();
        assert_eq!(
            listed,
            vec!["products/a/collection.json", "products/b/collection.json"]
        );
    }

    #[tokio::test]
    async fn test_missing_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().to_string_lossy().into_owned());
        assert!(storage.read_file("nope.json").await.is_err());
    }
}
