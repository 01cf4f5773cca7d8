use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};
use strum_macros::{Display, EnumString};

use crate::media::{MediaTool, MediaTools};

pub const DEFAULT_PORT: &str = "8091";
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Dev,
    Prod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ThumbnailStorage {
    Inline,
    Disk,
}

#[derive(Clone, Debug)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores (e.g. MinIO).
    pub endpoint: Option<String>,
    pub presign_expiry: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub db_path: String,
    pub jwt_secret: String,
    pub platform: Platform,
    pub assets_root: PathBuf,
    pub thumbnail_storage: ThumbnailStorage,
    pub s3: S3Settings,
    pub media_tools: MediaTools,
    pub port: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(anyhow!("{} must be set", name)),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let platform = match optional("PLATFORM") {
            Some(p) => p
                .parse()
                .with_context(|| format!("PLATFORM must be dev or prod, got {}", p))?,
            None => Platform::Prod,
        };

        let thumbnail_storage = match optional("THUMBNAIL_STORAGE") {
            Some(s) => s
                .parse()
                .with_context(|| format!("THUMBNAIL_STORAGE must be inline or disk, got {}", s))?,
            None => ThumbnailStorage::Inline,
        };

        let presign_expiry = match optional("PRESIGN_EXPIRY_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .context("PRESIGN_EXPIRY_SECS must be a number of seconds")?,
            ),
            None => DEFAULT_PRESIGN_EXPIRY,
        };

        let port = optional("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        if !port.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("PORT must be a number");
        }

        Ok(Self {
            db_path: required("DB_PATH")?,
            jwt_secret: required("JWT_SECRET")?,
            platform,
            assets_root: PathBuf::from(optional("ASSETS_ROOT").unwrap_or_else(|| "assets".into())),
            thumbnail_storage,
            s3: S3Settings {
                bucket: required("S3_BUCKET")?,
                region: required("S3_REGION")?,
                endpoint: optional("S3_ENDPOINT"),
                presign_expiry,
            },
            media_tools: MediaTools::new(
                optional("FFMPEG_PATH").unwrap_or_else(|| MediaTool::FFmpeg.to_string()),
                optional("FFPROBE_PATH").unwrap_or_else(|| MediaTool::FFprobe.to_string()),
            ),
            port,
        })
    }

    /// Base URL the server is reachable on, used for on-disk thumbnail links.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}
