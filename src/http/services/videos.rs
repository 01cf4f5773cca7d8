use actix_web::{delete, get, http::StatusCode, post, web, HttpResponse, Responder, ResponseError};
use log::{error, info, warn};
use uuid::Uuid;

use crate::{
    db::{CreateVideoParams, DbError, Video},
    http::{
        auth::{Authentication, UserId},
        response::ApiResponse,
    },
    state::AppState,
    storage::split_bucket_key,
};

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("Invalid ID")]
    InvalidId(#[from] uuid::Error),
    #[error("Title is required")]
    MissingTitle,
    #[error("Couldn't find video")]
    NotFound,
    #[error("You can't access this video")]
    NotOwner,
    #[error("Couldn't read or update video")]
    Database(#[from] DbError),
    #[error("Couldn't reach video storage")]
    Storage(anyhow::Error),
}

impl ResponseError for VideoError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            VideoError::InvalidId(_) | VideoError::MissingTitle => StatusCode::BAD_REQUEST,
            VideoError::NotFound => StatusCode::NOT_FOUND,
            VideoError::NotOwner => StatusCode::UNAUTHORIZED,
            VideoError::Database(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            VideoError::Storage(e) => {
                error!("{}: {:#}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiResponse::error(status, self.to_string())
    }
}

async fn owned_video(state: &AppState, video_id: &str, user: UserId) -> Result<Video, VideoError> {
    let video = state
        .db
        .get_video(Uuid::parse_str(video_id)?)
        .await?
        .ok_or(VideoError::NotFound)?;
    if video.user_id != user.0 {
        return Err(VideoError::NotOwner);
    }
    Ok(video)
}

#[post("/videos", wrap = "Authentication")]
pub async fn create_video(
    state: web::Data<AppState>,
    user: UserId,
    body: web::Json<CreateVideoParams>,
) -> Result<HttpResponse, VideoError> {
    let params = body.into_inner();
    if params.title.trim().is_empty() {
        return Err(VideoError::MissingTitle);
    }

    let video = state.db.create_video(user.0, &params).await?;
    info!("user {} created video {}", user.0, video.id);
    Ok(ApiResponse::Success(video).with_status(StatusCode::CREATED))
}

#[get("/videos", wrap = "Authentication")]
pub async fn list_videos(
    state: web::Data<AppState>,
    user: UserId,
) -> Result<impl Responder, VideoError> {
    let videos = state.db.get_videos(user.0).await?;
    let videos = state
        .videos
        .sign_videos(videos)
        .await
        .map_err(VideoError::Storage)?;
    Ok(ApiResponse::Success(videos))
}

#[get("/videos/{video_id}", wrap = "Authentication")]
pub async fn get_video(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
) -> Result<impl Responder, VideoError> {
    let video = owned_video(&state, &path, user).await?;
    let video = state
        .videos
        .sign_video(video)
        .await
        .map_err(VideoError::Storage)?;
    Ok(ApiResponse::Success(video))
}

#[delete("/videos/{video_id}", wrap = "Authentication")]
pub async fn delete_video(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse, VideoError> {
    let video = owned_video(&state, &path, user).await?;

    match video.video_url.as_deref().and_then(split_bucket_key) {
        Some((bucket, key)) if bucket == state.videos.bucket() => state
            .videos
            .delete_video(key)
            .await
            .map_err(VideoError::Storage)?,
        Some((bucket, key)) => warn!(
            "video {} points at s3://{}/{} outside our bucket, leaving it",
            video.id, bucket, key
        ),
        None => {}
    }

    state.db.delete_video(video.id).await?;
    info!("user {} deleted video {}", user.0, video.id);
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn storage_failure_hides_its_cause() {
        let err = VideoError::Storage(anyhow::anyhow!("failed to presign s3://bucket/key"));
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "error", "data": "Couldn't reach video storage"})
        );
    }
}
