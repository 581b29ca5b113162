use mongodb::bson::oid::ObjectId;

use crate::utils::error::CustomError;

/// Name reported in every response envelope
pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string())
}

/// Parse a hex id taken from a path or body, naming the field on failure
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, CustomError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| CustomError::ValidationError(format!("Invalid {}", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_ids_and_rejects_garbage() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "post ID").unwrap(), id);

        let err = parse_object_id("not-an-id", "post ID").unwrap_err();
        assert_eq!(err.to_string(), "Validation Error: Invalid post ID");
    }
}
