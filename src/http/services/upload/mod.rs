use actix_multipart::{Field, Multipart};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use futures_util::StreamExt as _;
use log::error;
use uuid::Uuid;

use crate::{
    db::{DbError, Video},
    http::{auth::UserId, response::ApiResponse},
    state::AppState,
};

pub mod thumbnail;
pub mod video;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid ID")]
    InvalidId(#[from] uuid::Error),
    #[error("Unable to parse multipart form: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error("Unable to parse form file: missing '{0}' field")]
    MissingFile(&'static str),
    #[error("Missing Content-Type for {0}")]
    MissingContentType(&'static str),
    #[error("Invalid file type {0}")]
    InvalidFileType(String),
    #[error("File exceeds the {0} byte limit")]
    TooLarge(u64),
    #[error("Couldn't find video")]
    VideoNotFound,
    #[error("Not authorized to update this video")]
    NotOwner,
    #[error("Couldn't read or update video")]
    Database(#[source] DbError),
    #[error("Could not write file to disk")]
    WriteFile(#[source] std::io::Error),
    #[error("Error getting aspect ratio")]
    AspectRatio(anyhow::Error),
    #[error("Error processing video file")]
    Processing(anyhow::Error),
    #[error("Error storing file")]
    Storage(anyhow::Error),
    #[error("Couldn't generate presigned URL")]
    Sign(anyhow::Error),
}

impl From<DbError> for UploadError {
    fn from(e: DbError) -> Self {
        UploadError::Database(e)
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> Self {
        UploadError::WriteFile(e)
    }
}

impl UploadError {
    /// Underlying failure of a server-side error. Logged, never sent back.
    fn cause(&self) -> Option<String> {
        match self {
            UploadError::Database(e) => Some(e.to_string()),
            UploadError::WriteFile(e) => Some(e.to_string()),
            UploadError::AspectRatio(e)
            | UploadError::Processing(e)
            | UploadError::Storage(e)
            | UploadError::Sign(e) => Some(format!("{:#}", e)),
            _ => None,
        }
    }
}

impl ResponseError for UploadError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            UploadError::InvalidId(_)
            | UploadError::Multipart(_)
            | UploadError::MissingFile(_)
            | UploadError::MissingContentType(_)
            | UploadError::InvalidFileType(_)
            | UploadError::TooLarge(_) => StatusCode::BAD_REQUEST,
            UploadError::VideoNotFound => StatusCode::NOT_FOUND,
            UploadError::NotOwner => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let Some(cause) = self.cause() {
            error!("{}: {}", self, cause);
        }

        ApiResponse::error(status, self.to_string())
    }
}

/// Looks up a video the caller is about to modify.
async fn owned_video(state: &AppState, video_id: &str, user: UserId) -> Result<Video, UploadError> {
    let video_id = Uuid::parse_str(video_id)?;
    let video = state
        .db
        .get_video(video_id)
        .await?
        .ok_or(UploadError::VideoNotFound)?;

    if video.user_id != user.0 {
        return Err(UploadError::NotOwner);
    }
    Ok(video)
}

/// Advances `payload` to the form field called `name`, skipping the others.
async fn find_field(payload: &mut Multipart, name: &'static str) -> Result<Field, UploadError> {
    while let Some(item) = payload.next().await {
        let field = item?;
        let matches = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .is_some_and(|n| n == name);
        if matches {
            return Ok(field);
        }
    }
    Err(UploadError::MissingFile(name))
}

/// Media type of a part without parameters, e.g. `video/mp4` for
/// `video/mp4; codecs=avc1`.
fn media_type(field: &Field, name: &'static str) -> Result<String, UploadError> {
    field
        .content_type()
        .map(|mime| mime.essence_str().to_ascii_lowercase())
        .ok_or(UploadError::MissingContentType(name))
}

fn check_limit(received: u64, limit: u64) -> Result<(), UploadError> {
    if received > limit {
        return Err(UploadError::TooLarge(limit));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[test]
    fn status_codes() {
        let status = |e: UploadError| e.error_response().status();
        assert_eq!(status(UploadError::MissingFile("video")), StatusCode::BAD_REQUEST);
        assert_eq!(status(UploadError::InvalidFileType("image/gif".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(UploadError::TooLarge(10)), StatusCode::BAD_REQUEST);
        assert_eq!(status(UploadError::VideoNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(UploadError::NotOwner), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(UploadError::Processing(anyhow::anyhow!("ffmpeg died"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn server_errors_hide_their_cause() {
        let err = UploadError::AspectRatio(anyhow::anyhow!(
            "failed to spawn ffprobe: No such file or directory (os error 2)"
        ));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "error", "data": "Error getting aspect ratio"})
        );
    }

    #[test]
    fn limit_check() {
        assert!(check_limit(10, 10).is_ok());
        assert!(matches!(check_limit(11, 10), Err(UploadError::TooLarge(10))));
    }
}
