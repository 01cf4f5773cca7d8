use std::path::PathBuf;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::info;
use tokio::fs;

use crate::config::{Config, ThumbnailStorage};

use super::asset_key;

/// Where thumbnail bytes end up. The returned string is what gets stored in
/// `Video::thumbnail_url`.
#[derive(Clone, Debug)]
pub enum ThumbnailStore {
    /// `data:` URL embedded straight into the record.
    Inline,
    /// File under `root`, served back from `/assets`.
    Disk { root: PathBuf, base_url: String },
}

impl ThumbnailStore {
    pub fn from_config(config: &Config) -> Self {
        match config.thumbnail_storage {
            ThumbnailStorage::Inline => ThumbnailStore::Inline,
            ThumbnailStorage::Disk => ThumbnailStore::Disk {
                root: config.assets_root.clone(),
                base_url: config.base_url(),
            },
        }
    }

    pub async fn store(&self, media_type: &str, data: &[u8]) -> anyhow::Result<String> {
        match self {
            ThumbnailStore::Inline => Ok(data_url(media_type, data)),
            ThumbnailStore::Disk { root, base_url } => {
                let file_name = asset_key(media_type)?;
                let path = root.join(&file_name);
                fs::write(&path, data)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("wrote thumbnail {}", path.display());
                Ok(format!("{}/assets/{}", base_url, file_name))
            }
        }
    }
}

pub fn data_url(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_data_url() {
        assert_eq!(data_url("image/png", b"hello"), "data:image/png;base64,aGVsbG8=");
    }

    #[actix_web::test]
    async fn disk_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThumbnailStore::Disk {
            root: dir.path().to_path_buf(),
            base_url: "http://localhost:8091".into(),
        };

        let url = store.store("image/jpeg", b"\xff\xd8\xff").await.unwrap();
        let file_name = url
            .strip_prefix("http://localhost:8091/assets/")
            .unwrap();
        assert!(file_name.ends_with(".jpg"));

        let written = std::fs::read(dir.path().join(file_name)).unwrap();
        assert_eq!(written, b"\xff\xd8\xff");
    }

    #[actix_web::test]
    async fn disk_store_rejects_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThumbnailStore::Disk {
            root: dir.path().to_path_buf(),
            base_url: "http://localhost:8091".into(),
        };
        assert!(store.store("image/gif", b"GIF89a").await.is_err());
    }
}
