use actix_cors::Cors;
use actix_web::{error::InternalError, http::StatusCode, web, App, HttpServer};
use log::info;
use services::{
    admin::reset,
    assets::asset,
    tokens::{login, refresh, revoke},
    upload::{thumbnail::upload_thumbnail, video::upload_video},
    users::create_user,
    videos::{create_video, delete_video, get_video, list_videos},
};

use crate::state::AppState;

pub mod auth;
pub mod response;
pub mod services;

use response::ApiResponse;

/// Registers every route. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = ApiResponse::error(StatusCode::BAD_REQUEST, err.to_string());
        InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .service(create_user)
            .service(login)
            .service(refresh)
            .service(revoke)
            .service(create_video)
            .service(list_videos)
            .service(get_video)
            .service(delete_video)
            .service(upload_thumbnail)
            .service(upload_video),
    )
    .service(asset)
    .service(web::scope("/admin").service(reset));
}

pub async fn start_http(state: AppState, port: &str) -> anyhow::Result<()> {
    let state = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .configure(configure)
    });
    let ip = format!("0.0.0.0:{}", port);
    info!("http server listening on {}", ip);
    server.bind(ip)?.run().await?;
    Ok(())
}
