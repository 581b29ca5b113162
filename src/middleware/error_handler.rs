use actix_web::dev::ServiceResponse;
use actix_web::http::header::{CONTENT_TYPE, HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result};
use serde_json::json;

use crate::utils::helpers::service_name;

/// Responses that already carry our JSON envelope pass through untouched
pub(crate) fn is_json<B>(res: &ServiceResponse<B>) -> bool {
    res.response()
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Rewrite framework-generated errors (missing bearer header, extractor
/// failures) into the standard error envelope
pub fn handle_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_json(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status_code = res.status();
    let error_message = res
        .response()
        .error()
        .map(|e| e.to_string())
        .filter(|msg| !msg.is_empty())
        .or_else(|| status_code.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());

    let error_kind = status_code
        .canonical_reason()
        .map(|reason| format!("{}_ERROR", reason.to_uppercase().replace(' ', "_")))
        .unwrap_or_else(|| "UNKNOWN_ERROR".to_string());

    let new_response = HttpResponse::build(status_code).json(json!({
        "success": false,
        "message": error_message,
        "httpStatusCode": status_code.as_u16(),
        "error": error_kind,
        "service": service_name(),
    }));

    let (req, _) = res.into_parts();
    let res = ServiceResponse::new(req, new_response.map_into_right_body());

    Ok(ErrorHandlerResponse::Response(res))
}
