use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::env;
use thiserror::Error;

/// Why an upload did not produce a URL
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// The file was rejected before anything was sent
    #[error("{0}")]
    Invalid(String),

    /// Object storage could not be reached or refused the upload
    #[error("{0}")]
    Remote(String),
}

/// Cloudinary configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: Option<String>,
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| "CLOUDINARY_CLOUD_NAME is required")?,
            api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| "CLOUDINARY_API_KEY is required")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .map_err(|_| "CLOUDINARY_API_SECRET is required")?,
            upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET").ok(),
        })
    }

    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name, resource_type
        )
    }

    /// Signature over the sorted upload params, as Cloudinary expects
    pub fn generate_signature(&self, params: &str, timestamp: i64) -> String {
        let to_sign = if params.is_empty() {
            format!("timestamp={}{}", timestamp, self.api_secret)
        } else {
            format!("{}&timestamp={}{}", params, timestamp, self.api_secret)
        };
        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: String,
    pub bytes: u64,
    pub url: String,
    pub secure_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorResponse {
    pub error: CloudinaryError,
}

/// Object storage client. Only the returned public URL matters to the rest
/// of the service; it is stored verbatim on posts.
pub struct UploadService {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl UploadService {
    pub fn with_config(config: CloudinaryConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Validate and upload one image, returning the public (https) URL
    pub async fn upload_image(
        &self,
        file: FileUpload,
        folder: Option<&str>,
        validator: &FileValidator,
    ) -> Result<String, UploadError> {
        validator.validate(&file)?;
        let response = self.upload_file(file, "image", folder).await?;
        Ok(response.secure_url)
    }

    async fn upload_file(
        &self,
        file: FileUpload,
        resource_type: &str,
        folder: Option<&str>,
    ) -> Result<CloudinaryUploadResponse, UploadError> {
        let timestamp = chrono::Utc::now().timestamp();
        let upload_url = self.config.upload_url(resource_type);

        let mut params = Vec::new();
        if let Some(f) = folder {
            params.push(format!("folder={}", f));
        }
        if let Some(ref preset) = self.config.upload_preset {
            params.push(format!("upload_preset={}", preset));
        }
        let signature = self.config.generate_signature(&params.join("&"), timestamp);

        let mime = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_part = Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&mime)
            .map_err(|e| UploadError::Remote(format!("Failed to create file part: {}", e)))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        if let Some(f) = folder {
            form = form.text("folder", f.to_string());
        }

        if let Some(ref preset) = self.config.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let response = self
            .client
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Remote(format!("Failed to send upload request: {}", e)))?;

        if response.status().is_success() {
            response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| UploadError::Remote(format!("Failed to parse upload response: {}", e)))
        } else {
            let error_response = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map_err(|e| UploadError::Remote(format!("Failed to parse error response: {}", e)))?;
            Err(UploadError::Remote(format!(
                "Cloudinary upload failed: {}",
                error_response.error.message
            )))
        }
    }
}

/// Represents a file to be uploaded
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: String, data: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            file_name,
            data,
            content_type,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    pub allowed_extensions: Vec<String>,
    pub max_file_size: usize,
    pub min_file_size: Option<usize>,
}

impl FileValidator {
    /// Images only, 1KB to 10MB
    pub fn images() -> Self {
        Self {
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            min_file_size: Some(1024),
        }
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), UploadError> {
        if file.data.is_empty() {
            return Err(UploadError::Invalid("File is empty".to_string()));
        }

        let extension = file
            .extension()
            .ok_or_else(|| UploadError::Invalid("File has no extension".to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::Invalid(format!(
                "Invalid file type '{}'. Allowed types: {}",
                extension,
                self.allowed_extensions.join(", ")
            )));
        }

        if file.size() > self.max_file_size {
            return Err(UploadError::Invalid(format!(
                "File too large. Maximum size: {}, file size: {}",
                Self::format_size(self.max_file_size),
                Self::format_size(file.size())
            )));
        }

        if let Some(min_size) = self.min_file_size {
            if file.size() < min_size {
                return Err(UploadError::Invalid(format!(
                    "File too small. Minimum size: {}, file size: {}",
                    Self::format_size(min_size),
                    Self::format_size(file.size())
                )));
            }
        }

        Ok(())
    }

    pub fn format_size(bytes: usize) -> String {
        const KB: usize = 1024;
        const MB: usize = KB * 1024;

        if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> FileUpload {
        FileUpload::new(name.to_string(), vec![0u8; size], None)
    }

    #[test]
    fn image_validator_checks_type_and_size() {
        let validator = FileValidator::images();

        assert!(validator.validate(&file("cat.PNG", 4096)).is_ok());
        assert!(validator.validate(&file("notes.txt", 4096)).is_err());
        assert!(validator.validate(&file("noext", 4096)).is_err());
        assert!(validator.validate(&file("tiny.png", 10)).is_err());
        assert!(validator.validate(&file("huge.png", 11 * 1024 * 1024)).is_err());
        assert_eq!(
            validator.validate(&file("empty.png", 0)).unwrap_err(),
            UploadError::Invalid("File is empty".into())
        );
    }

    #[test]
    fn signature_is_sha1_hex() {
        let config = CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            upload_preset: None,
        };
        let sig = config.generate_signature("folder=uploads", 1_700_000_000);
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, config.generate_signature("folder=other", 1_700_000_000));
        assert_eq!(
            config.upload_url("image"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
