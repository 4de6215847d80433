use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Credentials or bucket were missing at startup.
    #[error("object storage is not configured")]
    Unconfigured,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage provider error: {0}")]
    Provider(String),
}

/// Object storage operations the asset flow needs. Bytes never pass through
/// the backend: clients write directly to presigned URLs.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Returns a time-limited URL accepting a single PUT of `key`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// Deletes `key`. Deleting a missing object is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError>;

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

fn provider_error<E: std::error::Error>(err: E) -> StorageError {
    StorageError::Provider(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let config = PresigningConfig::expires_in(expires_in).map_err(provider_error)?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(config)
            .await
            .map_err(|e| {
                tracing::error!(
                    "S3 presign failed: bucket={}, key={}, error={}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                );
                provider_error(e)
            })?;

        Ok(request.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(provider_error)?;
        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(provider_error(service_error))
                }
            }
        }
    }
}

/// Stand-in used when storage credentials are absent. Every call fails with
/// [`StorageError::Unconfigured`] so the rest of the admin keeps working.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStorage;

#[async_trait]
impl StorageService for UnconfiguredStorage {
    async fn presign_put(
        &self,
        _key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        Err(StorageError::Unconfigured)
    }

    async fn delete_object(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unconfigured)
    }

    async fn object_exists(&self, _key: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unconfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_storage_returns_typed_error() {
        let storage = UnconfiguredStorage;
        assert!(!storage.is_configured());
        assert_eq!(
            storage
                .presign_put("assets/a.png", "image/png", Duration::from_secs(60))
                .await,
            Err(StorageError::Unconfigured)
        );
        assert_eq!(
            storage.delete_object("assets/a.png").await,
            Err(StorageError::Unconfigured)
        );
    }
}
