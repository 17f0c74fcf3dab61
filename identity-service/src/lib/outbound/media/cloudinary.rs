use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde::Deserialize;

use crate::config::MediaConfig;
use crate::domain::user::models::MediaFile;
use crate::domain::user::models::UploadedMedia;
use crate::domain::user::ports::MediaUploader;
use crate::user::errors::MediaUploadError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Unsigned uploads to a Cloudinary cloud.
///
/// Posts the staged file to `{api_base_url}/{cloud_name}/auto/upload` and
/// keeps the returned `secure_url`.
#[derive(Clone, Debug)]
pub struct CloudinaryUploader {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryUploader {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: Self::build_client(Duration::from_secs(config.upload_timeout_seconds)),
            upload_url: format!(
                "{}/{}/auto/upload",
                config.api_base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            upload_preset: config.upload_preset.clone(),
        }
    }

    fn build_client(timeout: Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("identity-service")
            .build()
            .unwrap_or_default()
    }

    async fn build_form(&self, file: &MediaFile) -> Result<Form, MediaUploadError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| MediaUploadError::ReadFailed(e.to_string()))?;

        let bytes = Bytes::from(bytes);
        let length = bytes.len() as u64;
        let file_part =
            || Part::stream_with_length(bytes.clone(), length).file_name(file.file_name.clone());

        // Cloudinary sniffs the type itself when none is sent
        let part = match file.content_type.as_deref() {
            Some(content_type) => file_part().mime_str(content_type).unwrap_or_else(|e| {
                tracing::warn!(content_type, error = %e, "Dropping unparseable content type");
                file_part()
            }),
            None => file_part(),
        };

        Ok(Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part))
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaUploadError> {
        let form = self.build_form(file).await?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MediaUploadError::Timeout
                } else {
                    MediaUploadError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("upload rejected")
                    .to_string(),
            };
            return Err(MediaUploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| MediaUploadError::InvalidResponse(e.to_string()))?;

        tracing::debug!(file_name = %file.file_name, url = %body.secure_url, "Media uploaded");

        Ok(UploadedMedia {
            url: body.secure_url,
        })
    }
}
