use std::path::{Path, PathBuf};

use rocket::fs::TempFile;
use rocket::http::{ContentType, Status};
use thiserror::Error;
use uuid::Uuid;

use crate::resp::problem::Problem;

pub static UPLOAD_ROUTE: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("only PNG and JPEG photos are accepted")]
    UnsupportedType,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for Problem {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::UnsupportedType => Problem::new_untyped(
                Status::UnsupportedMediaType,
                "La foto debe ser una imagen PNG o JPEG.",
            ),
            UploadError::Io(e) => {
                tracing::error!("unable to store photo: {}", e);
                Problem::new_untyped(Status::InternalServerError, "No se pudo guardar la foto.")
            }
        }
    }
}

/// Image formats accepted for the profile photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Png,
    Jpeg,
}

impl PhotoKind {
    pub fn from_content_type(content_type: Option<&ContentType>) -> Result<PhotoKind, UploadError> {
        match content_type {
            Some(ct) if ct.is_png() => Ok(PhotoKind::Png),
            Some(ct) if ct.is_jpeg() => Ok(PhotoKind::Jpeg),
            _ => Err(UploadError::UnsupportedType),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            PhotoKind::Png => "png",
            PhotoKind::Jpeg => "jpg",
        }
    }
}

/// Name the photo is stored under; uploads without a usable name get a random one.
pub fn photo_file_name(name: Option<&str>, kind: PhotoKind) -> String {
    let stem = match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    format!("{}.{}", stem, kind.extension())
}

/// URL the stored photo is served from.
pub fn photo_url(file_name: &str) -> String {
    format!("{}/{}", UPLOAD_ROUTE, file_name)
}

/// Directory holding uploaded photos, addressed by file name.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> PhotoStore {
        PhotoStore { dir: dir.into() }
    }

    pub fn path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Stores the uploaded bytes and returns the file name to reference them by.
    ///
    /// A photo uploaded under an existing name replaces the previous one.
    pub async fn store(&self, file: &mut TempFile<'_>) -> Result<String, UploadError> {
        let kind = PhotoKind::from_content_type(file.content_type())?;
        let file_name = photo_file_name(file.name(), kind);

        rocket::tokio::fs::create_dir_all(&self.dir).await?;
        file.copy_to(self.path(&file_name)).await?;
        tracing::debug!("stored photo '{}' ({} bytes)", file_name, file.len());

        Ok(file_name)
    }
}
