use actix_web::{http::StatusCode, post, web, HttpResponse, ResponseError};
use log::{error, warn};

use crate::{config::Platform, db::DbError, http::response::ApiResponse, state::AppState};

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("Reset is only allowed in dev environment")]
    Forbidden,
    #[error("Couldn't reset database")]
    Database(#[from] DbError),
}

impl ResponseError for ResetError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            ResetError::Forbidden => StatusCode::FORBIDDEN,
            ResetError::Database(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiResponse::error(status, self.to_string())
    }
}

#[post("/reset")]
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, ResetError> {
    if state.platform != Platform::Dev {
        return Err(ResetError::Forbidden);
    }

    state.db.reset().await?;
    warn!("database reset to initial state");
    Ok(ApiResponse::Success("Database reset to initial state").with_status(StatusCode::OK))
}
