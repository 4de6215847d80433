use crate::client::error::ClientError;
use crate::client::file::UploadFile;
use crate::models::PresignedGrant;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::io::ReaderStream;

/// Receives upload progress in percent.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Moves the bytes of one file to its presigned URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        grant: &PresignedGrant,
        file: &UploadFile,
        on_progress: ProgressFn,
    ) -> Result<(), ClientError>;
}

/// Percent of `total` covered by `sent`, held at 99 until the store answers.
pub fn transfer_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 99;
    }
    (sent.saturating_mul(100) / total).min(99) as u8
}

/// Single streamed PUT per attempt. No request timeout is applied, so a
/// stalled connection waits until the peer gives up.
pub struct HttpUploader {
    http: reqwest::Client,
    chunk_size: usize,
}

impl HttpUploader {
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self::with_client(reqwest::Client::builder().build()?))
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(
        &self,
        grant: &PresignedGrant,
        file: &UploadFile,
        on_progress: ProgressFn,
    ) -> Result<(), ClientError> {
        let total = file.size();
        let sent = Arc::new(AtomicU64::new(0));

        let progress = on_progress.clone();
        let stream = ReaderStream::with_capacity(Cursor::new(file.data().clone()), self.chunk_size)
            .map(move |chunk| {
                if let Ok(bytes) = &chunk {
                    let len = bytes.len() as u64;
                    let done = sent.fetch_add(len, Ordering::Relaxed) + len;
                    progress(transfer_percent(done, total));
                }
                chunk
            });

        let response = self
            .http
            .put(&grant.presigned_url)
            .header(CONTENT_TYPE, &file.content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Store rejected {} with status {}", grant.key, status);
            return Err(ClientError::UploadStatus(status.as_u16()));
        }

        on_progress(100);
        tracing::debug!("Uploaded {} ({} bytes)", grant.key, total);
        Ok(())
    }
}
