use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::comment::model::CreateCommentRequest;
use crate::comment::service::CommentService;
use crate::middleware::auth::AuthUser;
use crate::utils::error::CustomError;
use crate::utils::helpers::{parse_object_id, service_name};

/// Create a comment or a reply
/// POST /comments
pub async fn create_comment(
    user: AuthUser,
    comment_service: web::Data<CommentService>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let comment = comment_service
        .add_comment(&user.id, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment created successfully",
        "httpStatusCode": 201,
        "service": service_name(),
        "comment": comment
    })))
}

/// Get all comments for a post, oldest first
/// GET /posts/{post_id}/comments
pub async fn get_post_comments(
    user: AuthUser,
    comment_service: web::Data<CommentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post ID")?;

    let comments = comment_service
        .get_comments_for_post(&user.id, &post_id)
        .await?;
    let count = comments.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comments retrieved successfully",
        "httpStatusCode": 200,
        "service": service_name(),
        "count": count,
        "data": comments
    })))
}
