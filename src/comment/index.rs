use super::controller::create_comment;
use crate::like::controller::{get_comment_likers, like_comment, unlike_comment};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(create_comment))
            .route("/{comment_id}/like", web::post().to(like_comment))
            .route("/{comment_id}/like", web::delete().to(unlike_comment))
            .route("/{comment_id}/likes", web::get().to(get_comment_likers)),
    );
}
