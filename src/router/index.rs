use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use crate::comment::index::comment_routes;
use crate::comment::service::CommentService;
use crate::config::FeedConfig;
use crate::database::Store;
use crate::like::service::LikeService;
use crate::post::index::post_routes;
use crate::post::service::PostService;
use crate::uploader::index::upload_routes;
use crate::utils::error::CustomError;
use crate::utils::helpers::service_name;

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the social feed service",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": service_name(),
    }))
}

/// Services backed by one shared store, plus extractor configs that turn
/// malformed bodies and query strings into validation errors
pub fn register_services(cfg: &mut web::ServiceConfig, store: Arc<dyn Store>, feed: FeedConfig) {
    cfg.app_data(web::Data::new(PostService::new(store.clone(), feed)))
        .app_data(web::Data::new(CommentService::new(store.clone())))
        .app_data(web::Data::new(LikeService::new(store)))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            CustomError::ValidationError(err.to_string()).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            CustomError::ValidationError(err.to_string()).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            CustomError::ValidationError(err.to_string()).into()
        }));
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(default);
    cfg.configure(post_routes);
    cfg.configure(comment_routes);
    cfg.configure(upload_routes);
}
