use actix_web::{HttpResponse, web};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::like::model::{LikeTarget, LikeView};
use crate::like::service::LikeService;
use crate::middleware::auth::AuthUser;
use crate::utils::error::CustomError;
use crate::utils::helpers::{parse_object_id, service_name};

fn post_target(path: web::Path<String>) -> Result<LikeTarget, CustomError> {
    parse_object_id(&path.into_inner(), "post ID").map(LikeTarget::Post)
}

fn comment_target(path: web::Path<String>) -> Result<LikeTarget, CustomError> {
    parse_object_id(&path.into_inner(), "comment ID").map(LikeTarget::Comment)
}

async fn like(
    user: &ObjectId,
    like_service: &LikeService,
    target: LikeTarget,
) -> Result<HttpResponse, CustomError> {
    let like = like_service.like(user, target).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": format!("Liked {}", target.noun()),
        "httpStatusCode": 201,
        "service": service_name(),
        "like": LikeView::from(&like)
    })))
}

async fn unlike(
    user: &ObjectId,
    like_service: &LikeService,
    target: LikeTarget,
) -> Result<HttpResponse, CustomError> {
    like_service.unlike(user, target).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Unliked {}", target.noun()),
        "httpStatusCode": 200,
        "service": service_name(),
    })))
}

async fn likers(
    user: &ObjectId,
    like_service: &LikeService,
    target: LikeTarget,
) -> Result<HttpResponse, CustomError> {
    let likers = like_service.likers(user, target).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Likes retrieved successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "count": likers.len(),
        "data": likers
    })))
}

/// POST /posts/{post_id}/like
pub async fn like_post(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    like(&user.id, &like_service, post_target(path)?).await
}

/// DELETE /posts/{post_id}/like
pub async fn unlike_post(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    unlike(&user.id, &like_service, post_target(path)?).await
}

/// GET /posts/{post_id}/likes
pub async fn get_post_likers(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    likers(&user.id, &like_service, post_target(path)?).await
}

/// POST /comments/{comment_id}/like
pub async fn like_comment(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    like(&user.id, &like_service, comment_target(path)?).await
}

/// DELETE /comments/{comment_id}/like
pub async fn unlike_comment(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    unlike(&user.id, &like_service, comment_target(path)?).await
}

/// GET /comments/{comment_id}/likes
pub async fn get_comment_likers(
    user: AuthUser,
    like_service: web::Data<LikeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    likers(&user.id, &like_service, comment_target(path)?).await
}
