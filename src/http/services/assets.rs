// get /assets/{file} for thumbnails written to disk

use actix_web::{get, http::StatusCode, web, HttpResponse, Responder, ResponseError};
use log::error;
use tokio::fs;

use crate::{http::response::ApiResponse, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("invalid asset name")]
    InvalidName,
    #[error("asset not found")]
    NotFound,
    #[error("couldn't read asset")]
    FilesystemError(#[from] std::io::Error),
}

impl ResponseError for AssetError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            AssetError::InvalidName => StatusCode::BAD_REQUEST,
            AssetError::NotFound => StatusCode::NOT_FOUND,
            AssetError::FilesystemError(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiResponse::error(status, self.to_string())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

#[get("/assets/{file}")]
pub async fn asset(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, AssetError> {
    let name = path.into_inner();
    if !is_plain_file_name(&name) {
        return Err(AssetError::InvalidName);
    }

    let file_path = state.assets_root.join(&name);
    let bytes = fs::read(&file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound
        } else {
            AssetError::FilesystemError(e)
        }
    })?;

    let mime = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", mime))
        .insert_header(("Cache-Control", "max-age=3600"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal() {
        assert!(is_plain_file_name("ab12.png"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name(".env"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name(""));
    }
}
