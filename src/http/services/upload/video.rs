use actix_multipart::Multipart;
use actix_web::{post, web, Responder};
use futures_util::StreamExt as _;
use log::info;
use tempfile::TempPath;
use tokio::{fs::File, io::AsyncWriteExt as _};

use super::{check_limit, find_field, media_type, owned_video, UploadError};
use crate::{
    http::{
        auth::{Authentication, UserId},
        response::ApiResponse,
    },
    state::AppState,
    storage::asset_key,
};

pub const MAX_VIDEO_SIZE: u64 = 1 << 30;
const VIDEO_TYPE: &str = "video/mp4";

#[post("/video_upload/{video_id}", wrap = "Authentication")]
pub async fn upload_video(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
    mut payload: Multipart,
) -> Result<impl Responder, UploadError> {
    let video_id = path.into_inner();
    let mut video = owned_video(&state, &video_id, user).await?;

    let mut field = find_field(&mut payload, "video").await?;
    let media_type = media_type(&field, "video")?;
    if media_type != VIDEO_TYPE {
        return Err(UploadError::InvalidFileType(media_type));
    }

    // removed on drop, whichever way this handler exits
    let upload = tempfile::Builder::new()
        .prefix("tubely-upload")
        .suffix(".mp4")
        .tempfile()?
        .into_temp_path();

    let mut file = File::create(&upload).await?;
    let mut received: u64 = 0;
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        received += data.len() as u64;
        check_limit(received, MAX_VIDEO_SIZE)?;
        file.write_all(&data).await?;
    }
    file.flush().await?;
    drop(file);
    info!("received {} bytes for video {}", received, video.id);

    let aspect_ratio = state
        .media
        .get_video_aspect_ratio(&upload)
        .await
        .map_err(UploadError::AspectRatio)?;
    let key = format!(
        "{}/{}",
        aspect_ratio.key_prefix(),
        asset_key(VIDEO_TYPE).map_err(UploadError::Storage)?
    );

    let processed = state
        .media
        .process_video_for_fast_start(&upload)
        .await
        .map_err(UploadError::Processing)?;
    let processed = TempPath::from_path(processed);

    state
        .videos
        .put_video(&key, &processed, VIDEO_TYPE)
        .await
        .map_err(UploadError::Storage)?;

    video.video_url = Some(state.videos.bucket_key(&key));
    state.db.update_video(&mut video).await?;
    info!("video {} stored as {} ({})", video.id, key, aspect_ratio);

    let video = state.videos.sign_video(video).await.map_err(UploadError::Sign)?;
    Ok(ApiResponse::Success(video))
}
