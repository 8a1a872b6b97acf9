// service/storage.rs
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use super::error::ServiceError;
use crate::config::Config;

pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

pub fn validate_image(content_type: &str, size: usize) -> Result<(), ServiceError> {
    if extension_for(content_type).is_none() {
        return Err(ServiceError::Validation(
            "Payment proof must be a JPEG, PNG, WEBP or GIF image".to_string(),
        ));
    }
    if size == 0 {
        return Err(ServiceError::Validation("Payment proof file is empty".to_string()));
    }
    if size > MAX_PROOF_BYTES {
        return Err(ServiceError::Validation(format!(
            "Payment proof must be at most {}MB",
            MAX_PROOF_BYTES / 1024 / 1024
        )));
    }
    Ok(())
}

pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// Stores payment screenshots in blob storage, or inline as data URLs.
#[derive(Debug, Clone)]
pub struct ProofStorage {
    client: reqwest::Client,
    upload_url: Option<String>,
    token: Option<String>,
}

impl ProofStorage {
    pub fn new(config: &Config) -> Self {
        ProofStorage {
            client: reqwest::Client::new(),
            upload_url: config.blob_upload_url.clone(),
            token: config.blob_token.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.upload_url.is_some() && self.token.is_some()
    }

    /// Returns the URL the proof can be viewed at. Upload failures fall back to a data URL.
    pub async fn store(&self, folder: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, ServiceError> {
        validate_image(content_type, bytes.len())?;

        if self.is_remote() {
            match self.upload(folder, content_type, &bytes).await {
                Ok(url) => return Ok(url),
                Err(e) => {
                    tracing::warn!("blob upload failed, storing proof inline: {}", e);
                }
            }
        }

        Ok(to_data_url(content_type, &bytes))
    }

    async fn upload(&self, folder: &str, content_type: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let (Some(base), Some(token)) = (&self.upload_url, &self.token) else {
            return Err(ServiceError::Storage("blob storage is not configured".to_string()));
        };
        let ext = extension_for(content_type).unwrap_or("bin");
        let path = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);

        let response = self
            .client
            .put(format!("{}/{}", base.trim_end_matches('/'), path))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Storage(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        body.get("url")
            .and_then(|url| url.as_str())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Storage("upload response has no url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_image_types() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(validate_image("image/jpeg", MAX_PROOF_BYTES).is_ok());
    }

    #[test]
    fn rejects_other_files() {
        assert!(validate_image("application/pdf", 1024).is_err());
        assert!(validate_image("image/png", 0).is_err());
        assert!(validate_image("image/png", MAX_PROOF_BYTES + 1).is_err());
    }

    #[test]
    fn data_url_embeds_mime_and_payload() {
        assert_eq!(to_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn falls_back_to_inline_storage() {
        let storage = ProofStorage::new(&Config::for_tests());
        assert!(!storage.is_remote());

        let url = storage.store("payments", "image/gif", b"GIF89a".to_vec()).await.unwrap();
        assert!(url.starts_with("data:image/gif;base64,"));
    }
}
