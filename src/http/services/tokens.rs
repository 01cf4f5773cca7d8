use actix_web::{http::StatusCode, post, web, HttpRequest, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use log::{error, warn};
use serde::Serialize;

use super::users::Credentials;
use crate::{
    auth::{
        check_password_hash, get_bearer_token, make_jwt, make_refresh_token, AuthError,
        ACCESS_TOKEN_LIFETIME, REFRESH_TOKEN_LIFETIME,
    },
    db::{DbError, User},
    http::response::ApiResponse,
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Incorrect email or password")]
    BadCredentials,
    #[error("Couldn't find token")]
    MissingToken(AuthError),
    #[error("Couldn't validate refresh token")]
    InvalidRefreshToken,
    #[error("Couldn't create access token")]
    Jwt(AuthError),
    #[error("Couldn't read or update session")]
    Database(#[from] DbError),
}

impl ResponseError for TokenError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            TokenError::BadCredentials
            | TokenError::MissingToken(_)
            | TokenError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            TokenError::Jwt(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            TokenError::Database(e) => {
                error!("{}: {}", self, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiResponse::error(status, self.to_string())
    }
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    user: User,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<impl Responder, TokenError> {
    let Credentials { email, password } = body.into_inner();

    let user = state
        .db
        .get_user_by_email(email.trim())
        .await?
        .ok_or(TokenError::BadCredentials)?;

    if check_password_hash(&password, &user.password).is_err() {
        warn!("failed login for user {}", user.id);
        return Err(TokenError::BadCredentials);
    }

    let token = make_jwt(user.id, &state.jwt_secret, ACCESS_TOKEN_LIFETIME).map_err(TokenError::Jwt)?;
    let refresh_token = make_refresh_token();
    let expires_at = Utc::now()
        + chrono::Duration::from_std(REFRESH_TOKEN_LIFETIME).unwrap_or(chrono::Duration::days(60));
    state
        .db
        .create_refresh_token(&refresh_token, user.id, expires_at)
        .await?;

    Ok(ApiResponse::Success(LoginResponse {
        user,
        token,
        refresh_token,
    }))
}

#[post("/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, TokenError> {
    let refresh_token = get_bearer_token(req.headers()).map_err(TokenError::MissingToken)?;

    let user = state
        .db
        .get_user_by_refresh_token(&refresh_token)
        .await?
        .ok_or(TokenError::InvalidRefreshToken)?;

    let token = make_jwt(user.id, &state.jwt_secret, ACCESS_TOKEN_LIFETIME).map_err(TokenError::Jwt)?;
    Ok(ApiResponse::Success(RefreshResponse { token }))
}

#[post("/revoke")]
pub async fn revoke(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, TokenError> {
    let refresh_token = get_bearer_token(req.headers()).map_err(TokenError::MissingToken)?;

    match state.db.revoke_refresh_token(&refresh_token).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(DbError::NotFound) => Err(TokenError::InvalidRefreshToken),
        Err(e) => Err(e.into()),
    }
}
