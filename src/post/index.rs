use super::controller::{create_post, get_feed, get_post};
use crate::comment::controller::get_post_comments;
use crate::like::controller::{get_post_likers, like_post, unlike_post};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::get().to(get_feed))
            .route("", web::post().to(create_post))
            .route("/{post_id}", web::get().to(get_post))
            .route("/{post_id}/like", web::post().to(like_post))
            .route("/{post_id}/like", web::delete().to(unlike_post))
            .route("/{post_id}/likes", web::get().to(get_post_likers))
            .route("/{post_id}/comments", web::get().to(get_post_comments)),
    );
}
