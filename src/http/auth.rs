use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{self, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use log::{error, warn};
use uuid::Uuid;

use crate::{
    auth::{get_bearer_token, validate_jwt},
    http::response::ApiResponse,
    state::AppState,
};

/// Id of the user whose access token authenticated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Requires a valid access JWT in `Authorization: Bearer …` and stores the
/// token's subject as [`UserId`] in the request extensions.
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddleware<S> {
    service: Rc<S>,
}

fn reject<B>(req: ServiceRequest, status: StatusCode, message: &str) -> ServiceResponse<EitherBody<B, BoxBody>> {
    let (request, _pl) = req.into_parts();
    let response = ApiResponse::error(status, message).map_into_right_body();
    ServiceResponse::new(request, response)
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        Box::pin(async move {
            let secret = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.jwt_secret.clone(),
                None => {
                    error!("app state missing from configuration, denying request");
                    return Ok(reject(req, StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured"));
                }
            };

            let token = match get_bearer_token(req.headers()) {
                Ok(token) => token,
                Err(e) => {
                    warn!("no bearer token on {}: {}", req.path(), e);
                    return Ok(reject(req, StatusCode::UNAUTHORIZED, "Couldn't find JWT"));
                }
            };

            let user_id = match validate_jwt(&token, &secret) {
                Ok(user_id) => user_id,
                Err(e) => {
                    warn!("rejected token on {}: {}", req.path(), e);
                    return Ok(reject(req, StatusCode::UNAUTHORIZED, "Couldn't validate JWT"));
                }
            };

            req.extensions_mut().insert(UserId(user_id));
            svc.call(req).await.map(|res| res.map_into_left_body())
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(actix_web::error::ErrorUnauthorized("Couldn't find JWT"))),
        }
    }
}
