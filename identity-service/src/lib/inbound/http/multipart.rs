use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use axum::async_trait;
use axum::extract::multipart::Field;
use axum::extract::FromRequest;
use axum::extract::Multipart;
use axum::extract::Request;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::handlers::ApiError;
use crate::domain::user::models::MediaFile;

/// An uploaded file staged on local disk.
///
/// The file is removed when the guard is dropped, whatever the outcome of the
/// request that staged it.
#[derive(Debug)]
pub struct StagedFile {
    media: MediaFile,
}

impl StagedFile {
    fn new(path: PathBuf, file_name: String, content_type: Option<String>) -> Self {
        Self {
            media: MediaFile {
                path,
                file_name,
                content_type,
            },
        }
    }

    pub fn media(&self) -> &MediaFile {
        &self.media
    }

    pub fn path(&self) -> &Path {
        &self.media.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.media.path) {
            Ok(()) => {
                tracing::debug!(path = %self.media.path.display(), "Staged upload removed")
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.media.path.display(),
                error = %e,
                "Failed to remove staged upload"
            ),
        }
    }
}

/// `Multipart` extractor that rejects non-multipart bodies with the error
/// envelope.
pub struct ApiMultipart(pub Multipart);

#[async_trait]
impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Ok(Self(multipart))
    }
}

/// Text fields and staged files of a multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl UploadForm {
    /// Drain a multipart body, streaming file parts into `upload_dir`.
    ///
    /// Empty file parts are treated as absent. A failure part-way through drops
    /// every file staged so far.
    pub async fn read(mut multipart: Multipart, upload_dir: &Path) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {}", e)))?
        {
            let name = match field.name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };

            if field.file_name().is_some() {
                if let Some(staged) = stage_file(field, upload_dir).await? {
                    form.files.insert(name, staged);
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest(format!("Failed to read {}", name)))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// Text field, trimmed; `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Raw text field, for values that must not be trimmed (passwords).
    pub fn raw_text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    pub fn file(&self, name: &str) -> Option<&StagedFile> {
        self.files.get(name)
    }
}

async fn stage_file(field: Field<'_>, upload_dir: &Path) -> Result<Option<StagedFile>, ApiError> {
    let file_name = field
        .file_name()
        .map(sanitize_file_name)
        .filter(|name| !name.is_empty());
    let Some(file_name) = file_name else {
        return Ok(None);
    };
    let content_type = field.content_type().map(str::to_string);

    let path = upload_dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
    let staged = StagedFile::new(path, file_name, content_type);

    let written = write_field(field, staged.path()).await.map_err(|e| {
        ApiError::InternalServerError(format!("Failed to stage upload: {}", e))
    })?;

    if written == 0 {
        return Ok(None);
    }

    tracing::debug!(path = %staged.path().display(), bytes = written, "Upload staged");

    Ok(Some(staged))
}

async fn write_field(mut field: Field<'_>, path: &Path) -> Result<u64, anyhow::Error> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

/// Keep only the final path component and characters safe in a file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
