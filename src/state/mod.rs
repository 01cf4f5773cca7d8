use std::path::PathBuf;

use crate::{
    config::{Config, Platform},
    db::Database,
    media::MediaTools,
    storage::{ThumbnailStore, VideoStorage},
};

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub db: Database,
    pub videos: VideoStorage,
    pub thumbnails: ThumbnailStore,
    pub media: MediaTools,
    pub jwt_secret: String,
    pub platform: Platform,
    pub assets_root: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, db: Database, videos: VideoStorage) -> Self {
        Self {
            db,
            videos,
            thumbnails: ThumbnailStore::from_config(config),
            media: config.media_tools.clone(),
            jwt_secret: config.jwt_secret.clone(),
            platform: config.platform,
            assets_root: config.assets_root.clone(),
        }
    }
}
