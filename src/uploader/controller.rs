use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use log::{info, warn};
use serde_json::json;

use crate::middleware::auth::AuthUser;
use crate::utils::error::CustomError;
use crate::utils::helpers::service_name;
use crate::utils::uploads::{FileUpload, FileValidator, UploadService};

const UPLOAD_FOLDER: &str = "posts";

/// First non-empty `file` field of the form
async fn extract_file_from_multipart(mut payload: Multipart) -> Result<Option<FileUpload>, String> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("Error reading multipart field: {}", e))?;

        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };

        if content_disposition.get_name() != Some("file") {
            continue;
        }

        let file_name = content_disposition
            .get_filename()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| format!("Error reading file chunk: {}", e))?;
            data.extend_from_slice(&chunk);
        }

        if !data.is_empty() {
            return Ok(Some(FileUpload::new(file_name, data, content_type)));
        }
    }

    Ok(None)
}

/// Upload an image for a post
/// POST /upload
pub async fn upload_image(
    user: AuthUser,
    upload_service: Option<web::Data<UploadService>>,
    payload: Multipart,
) -> Result<HttpResponse, CustomError> {
    let file = extract_file_from_multipart(payload)
        .await
        .map_err(CustomError::BadRequestError)?
        .ok_or_else(|| CustomError::ValidationError("No file uploaded".into()))?;

    let Some(upload_service) = upload_service else {
        warn!("upload attempted but object storage is not configured");
        return Err(CustomError::InternalServerError(
            "Upload service is not configured".into(),
        ));
    };

    let url = upload_service
        .upload_image(file, Some(UPLOAD_FOLDER), &FileValidator::images())
        .await?;

    info!("image uploaded by {}", user.id);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "File uploaded successfully",
        "httpStatusCode": 201,
        "service": service_name(),
        "url": url
    })))
}
