use actix_web::{http::StatusCode, post, web, HttpResponse, ResponseError};
use log::{error, info};
use serde::Deserialize;

use crate::{
    auth::{hash_password, AuthError},
    db::DbError,
    http::response::ApiResponse,
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Email and password are required")]
    MissingFields,
    #[error("A user with that email already exists")]
    EmailTaken,
    #[error("Couldn't hash password")]
    Hash(#[from] AuthError),
    #[error("Couldn't create user")]
    Database(#[source] DbError),
}

impl From<DbError> for UserError {
    fn from(e: DbError) -> Self {
        if e.is_unique_violation() {
            UserError::EmailTaken
        } else {
            UserError::Database(e)
        }
    }
}

impl ResponseError for UserError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            UserError::MissingFields => StatusCode::BAD_REQUEST,
            UserError::EmailTaken => StatusCode::CONFLICT,
            UserError::Hash(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            UserError::Database(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiResponse::error(status, self.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[post("/users")]
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, UserError> {
    let Credentials { email, password } = body.into_inner();
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(UserError::MissingFields);
    }

    let hash = hash_password(&password)?;
    let user = state.db.create_user(email, &hash).await?;
    info!("created user {}", user.id);

    Ok(ApiResponse::Success(user).with_status(StatusCode::CREATED))
}
