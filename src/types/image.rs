//! Image payloads handed to the classifier

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Result, WasteMapError};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An image selected by the user, ready to be uploaded.
///
/// No decoding or format validation happens client-side; the classifier
/// service reports anything it cannot read.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    source: Option<PathBuf>,
}

impl ImageUpload {
    /// Build an upload from in-memory bytes. The MIME type is guessed from
    /// the file name's extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(Path::new(&file_name)).to_string();
        Self {
            file_name,
            content_type,
            bytes,
            source: None,
        }
    }

    /// Read an image from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WasteMapError::InvalidInput(format!("not a file path: {path:?}")))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(WasteMapError::InvalidInput(format!("image file is empty: {path:?}")));
        }

        let mut upload = Self::new(file_name, bytes);
        upload.source = Some(path.to_path_buf());
        Ok(upload)
    }

    /// Override the guessed MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The local reference kept for display once the bytes are sent.
    pub fn preview(&self) -> ImagePreview {
        ImagePreview {
            file_name: self.file_name.clone(),
            source: self.source.clone(),
            content_type: self.content_type.clone(),
            byte_len: self.bytes.len(),
        }
    }
}

/// Local preview reference for the currently selected image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePreview {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub content_type: String,
    pub byte_len: usize,
}

/// Guess an image MIME type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("heic") => "image/heic",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
