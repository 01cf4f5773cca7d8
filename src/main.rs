use std::process::exit;

use env_logger::Env;
use log::{error, info};
use tokio::fs;
use tubely::{
    config::Config,
    db::Database,
    http::start_http,
    media::MediaTool,
    state::AppState,
    storage::VideoStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("tubely")).init();
    info!("starting tubely");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {:#}", e);
            exit(1);
        }
    };

    let mut versions = Vec::new();
    for tool in [MediaTool::FFmpeg, MediaTool::FFprobe] {
        match config.media_tools.version(tool).await {
            Ok(version) => versions.push(version),
            Err(e) => {
                error!(
                    "failed to get {} version -- tubely requires {} at {} ({})",
                    tool,
                    tool,
                    config.media_tools.program(tool).display(),
                    e
                );
                exit(1);
            }
        }
    }
    info!(
        "working w/ ffmpeg {} and ffprobe {}",
        versions[0], versions[1]
    );

    fs::create_dir_all(&config.assets_root).await?;
    info!(
        "thumbnails stored {} (assets root {})",
        config.thumbnail_storage,
        config.assets_root.display()
    );

    let db = Database::open(&config.db_path).await?;
    let videos = VideoStorage::connect(&config.s3).await;
    info!("videos go to bucket {}", videos.bucket());

    let state = AppState::new(&config, db, videos);
    start_http(state, &config.port).await?;
    Ok(())
}
