use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::post::model::{CreatePostRequest, FeedQuery};
use crate::post::service::PostService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{parse_object_id, service_name};

/// GET /posts?limit=&cursor=
pub async fn get_feed(
    user: AuthUser,
    post_service: web::Data<PostService>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, CustomError> {
    let page = post_service.feed(&user.id, query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Posts fetched successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "posts": page.posts,
        "hasMore": page.has_more,
        "nextCursor": page.next_cursor,
    })))
}

/// POST /posts
pub async fn create_post(
    user: AuthUser,
    post_service: web::Data<PostService>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, CustomError> {
    let post = post_service.create_post(&user.id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Post created successfully",
        "httpStatusCode": 201,
        "service": service_name(),
        "post": post
    })))
}

/// GET /posts/{post_id}
pub async fn get_post(
    user: AuthUser,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post ID")?;
    let post = post_service.get_post(&user.id, &post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post fetched successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "post": post
    })))
}
