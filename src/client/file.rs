use crate::client::error::ClientError;
use crate::utils::hash::{calculate_file_hash, calculate_hash};
use bytes::Bytes;
use std::path::Path;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file handed to the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub description: Option<String>,
    data: Bytes,
    /// Where a UI can preview the file before it is stored
    pub preview_url: String,
    checksum: String,
}

fn sniff_content_type(name: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("txt") | Some("md") => "text/plain".to_string(),
        Some("json") => "application/json".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        Some("csv") => "text/csv".to_string(),
        _ => FALLBACK_CONTENT_TYPE.to_string(),
    }
}

impl UploadFile {
    /// Content type is sniffed from magic bytes, then the extension.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            content_type: sniff_content_type(&name, &data),
            preview_url: format!("memory://{}", name),
            checksum: calculate_hash(&data),
            name,
            description: None,
            data,
        }
    }

    /// Reads the file and hashes it straight from disk.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let (data, checksum) = tokio::try_join!(tokio::fs::read(path), calculate_file_hash(path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let data = Bytes::from(data);

        Ok(Self {
            content_type: sniff_content_type(&name, &data),
            preview_url: format!("file://{}", path.display()),
            checksum,
            name,
            description: None,
            data,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Hex SHA-256 of the contents, computed once when the file was loaded.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}
