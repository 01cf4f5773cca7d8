use actix_multipart::Multipart;
use actix_web::{post, web, Responder};
use futures_util::StreamExt as _;
use log::info;

use super::{check_limit, find_field, media_type, owned_video, UploadError};
use crate::http::{
    auth::{Authentication, UserId},
    response::ApiResponse,
};
use crate::state::AppState;

pub const MAX_THUMBNAIL_SIZE: u64 = 10 << 20;
const ALLOWED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[post("/thumbnail_upload/{video_id}", wrap = "Authentication")]
pub async fn upload_thumbnail(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
    mut payload: Multipart,
) -> Result<impl Responder, UploadError> {
    let video_id = path.into_inner();
    info!("uploading thumbnail for video {} by user {}", video_id, user.0);

    let mut video = owned_video(&state, &video_id, user).await?;

    let mut field = find_field(&mut payload, "thumbnail").await?;
    let media_type = media_type(&field, "thumbnail")?;
    if !ALLOWED_TYPES.contains(&media_type.as_str()) {
        return Err(UploadError::InvalidFileType(media_type));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        check_limit((bytes.len() + data.len()) as u64, MAX_THUMBNAIL_SIZE)?;
        bytes.extend_from_slice(&data);
    }

    let url = state
        .thumbnails
        .store(&media_type, &bytes)
        .await
        .map_err(UploadError::Storage)?;
    video.thumbnail_url = Some(url);
    state.db.update_video(&mut video).await?;

    let video = state.videos.sign_video(video).await.map_err(UploadError::Sign)?;
    Ok(ApiResponse::Success(video))
}
