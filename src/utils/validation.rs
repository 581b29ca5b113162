use regex::Regex;
use std::sync::OnceLock;

use crate::utils::error::CustomError;

pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_COMMENT_LENGTH: usize = 1000;

fn image_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid regex"))
}

/// Trim and bound free text; the trimmed value is what gets stored
pub fn validate_content(raw: &str, field: &str, max_len: usize) -> Result<String, CustomError> {
    let content = raw.trim();

    if content.is_empty() {
        return Err(CustomError::ValidationError(format!(
            "{} is required",
            field
        )));
    }

    if content.chars().count() > max_len {
        return Err(CustomError::ValidationError(format!(
            "{} is too long (maximum {} characters)",
            field, max_len
        )));
    }

    Ok(content.to_string())
}

pub fn validate_post_content(raw: &str) -> Result<String, CustomError> {
    validate_content(raw, "Post content", MAX_POST_LENGTH)
}

pub fn validate_comment_content(raw: &str) -> Result<String, CustomError> {
    validate_content(raw, "Comment content", MAX_COMMENT_LENGTH)
}

/// Blank image URLs count as "no image"
pub fn validate_image_url(raw: Option<&str>) -> Result<Option<String>, CustomError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if image_url_pattern().is_match(url) => Ok(Some(url.to_string())),
        Some(_) => Err(CustomError::ValidationError("Invalid image URL".into())),
    }
}

/// Resolve the requested page size against the configured default and cap
pub fn normalize_limit(requested: Option<i64>, default: i64, max: i64) -> Result<i64, CustomError> {
    match requested {
        None => Ok(default.min(max)),
        Some(limit) if limit < 1 => Err(CustomError::ValidationError(
            "limit must be at least 1".into(),
        )),
        Some(limit) => Ok(limit.min(max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(validate_post_content("  hello  ").unwrap(), "hello");
        assert!(validate_post_content("   ").is_err());
        assert!(validate_comment_content(&"x".repeat(MAX_COMMENT_LENGTH)).is_ok());
        assert!(validate_comment_content(&"x".repeat(MAX_COMMENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn image_urls_must_be_http() {
        assert_eq!(validate_image_url(None).unwrap(), None);
        assert_eq!(validate_image_url(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_image_url(Some("https://res.cloudinary.com/demo/image/upload/a.png"))
                .unwrap()
                .as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/a.png")
        );
        assert!(validate_image_url(Some("ftp://example.com/a.png")).is_err());
        assert!(validate_image_url(Some("not a url")).is_err());
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None, 10, 50).unwrap(), 10);
        assert_eq!(normalize_limit(Some(25), 10, 50).unwrap(), 25);
        assert_eq!(normalize_limit(Some(500), 10, 50).unwrap(), 50);
        assert!(normalize_limit(Some(0), 10, 50).is_err());
        assert!(normalize_limit(Some(-3), 10, 50).is_err());
    }
}
