use crate::client::api::AssetApi;
use crate::client::error::ClientError;
use crate::client::file::UploadFile;
use crate::client::retry::{MAX_RETRIES, with_retry};
use crate::client::task::{ProgressMap, UploadTask};
use crate::client::uploader::{ProgressFn, Uploader};
use crate::models::{PresignFileRequest, PresignedGrant};
use crate::utils::slug::slugify;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub key: String,
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub key: String,
    pub message: String,
}

/// Outcome of one batch once every file has settled.
#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    pub completed: Vec<CompletedUpload>,
    pub failed: Vec<FailedUpload>,
}

impl UploadSummary {
    pub fn all_completed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds `{prefix}/{uuid}-{slug}.{ext}`; the UUID keeps drops of
/// identically named files apart.
pub fn storage_key(prefix: &str, file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| slugify(&s.to_string_lossy()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "file".to_string());
    let ext = path
        .extension()
        .map(|e| slugify(&e.to_string_lossy()))
        .filter(|e| !e.is_empty());

    let name = match ext {
        Some(ext) => format!("{}-{}.{}", Uuid::new_v4(), stem, ext),
        None => format!("{}-{}", Uuid::new_v4(), stem),
    };

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Drives a batch of dropped files through checksum, presign, upload and
/// confirm. Uploads run concurrently and a failing file never cancels its
/// siblings.
pub struct UploadOrchestrator {
    api: Arc<dyn AssetApi>,
    uploader: Arc<dyn Uploader>,
    progress: ProgressMap,
    key_prefix: String,
    retries: u32,
}

impl UploadOrchestrator {
    pub fn new(api: Arc<dyn AssetApi>, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            api,
            uploader,
            progress: ProgressMap::new(),
            key_prefix: "assets".to_string(),
            retries: MAX_RETRIES,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// The live progress map a UI renders from.
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    pub fn dismiss(&self, key: &str) -> Option<UploadTask> {
        self.progress.remove(key)
    }

    /// Uploads every file. A presign failure fails the whole batch with a
    /// single error and no file is ever transferred; after that, per-file
    /// failures are reported in the summary.
    pub async fn upload_all(&self, files: Vec<UploadFile>) -> Result<UploadSummary, ClientError> {
        if files.is_empty() {
            return Ok(UploadSummary::default());
        }

        let mut requests = Vec::with_capacity(files.len());
        for file in &files {
            let key = storage_key(&self.key_prefix, &file.name);
            self.progress.insert(UploadTask::pending(
                key.clone(),
                file.preview_url.clone(),
                file.name.clone(),
                file.description.clone(),
            ));
            requests.push(PresignFileRequest {
                key,
                name: file.name.clone(),
                content_type: file.content_type.clone(),
                size: file.size(),
                checksum: file.checksum().to_string(),
                description: file.description.clone(),
            });
        }

        let grants = match self.api.presign(&requests).await {
            Ok(grants) => grants,
            Err(e) => {
                let message = e.to_string();
                for req in &requests {
                    self.progress.fail(&req.key, message.clone());
                }
                return Err(e);
            }
        };

        tracing::info!("📤 Uploading batch of {} files", grants.len());

        let results = join_all(
            grants
                .iter()
                .zip(files.iter())
                .map(|(grant, file)| self.run_one(grant, file)),
        )
        .await;

        let mut summary = UploadSummary::default();
        for (grant, result) in grants.into_iter().zip(results) {
            match result {
                Ok(()) => summary.completed.push(CompletedUpload {
                    key: grant.key,
                    database_id: grant.database_id,
                }),
                Err(message) => summary.failed.push(FailedUpload {
                    key: grant.key,
                    message,
                }),
            }
        }

        tracing::info!(
            "✅ Batch settled: {} completed, {} failed",
            summary.completed.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    async fn run_one(&self, grant: &PresignedGrant, file: &UploadFile) -> Result<(), String> {
        self.progress.start(&grant.key);

        let map = self.progress.clone();
        let key = grant.key.clone();
        let on_progress: ProgressFn = Arc::new(move |percent| {
            map.advance(&key, percent);
        });

        let uploader = self.uploader.as_ref();
        let label = format!("Upload of {}", grant.key);
        let uploaded = with_retry(&label, self.retries, |_| {
            uploader.upload(grant, file, on_progress.clone())
        })
        .await;

        // The task stays below 100 until the row is confirmed
        let settled = match uploaded {
            Ok(()) => {
                let api = self.api.as_ref();
                let label = format!("Confirm of {}", grant.key);
                with_retry(&label, self.retries, |_| api.confirm(&grant.database_id))
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        };

        match settled {
            Ok(()) => {
                self.progress.complete(&grant.key);
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.api.delete(&grant.key).await {
                    tracing::error!(
                        "Failed to remove record for failed upload {}: {}",
                        grant.key,
                        cleanup
                    );
                }
                let message = e.to_string();
                self.progress.fail(&grant.key, message.clone());
                Err(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::task::UploadStatus;
    use crate::models::{AssetResponse, ListAssetsQuery, UpdateAssetRequest};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct MockApi {
        fail_presign: bool,
        fail_confirm: bool,
        presigned: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
        confirmed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetApi for MockApi {
        async fn presign(
            &self,
            files: &[PresignFileRequest],
        ) -> Result<Vec<PresignedGrant>, ClientError> {
            if self.fail_presign {
                return Err(ClientError::Presign {
                    status: 502,
                    message: "Storage provider request failed".to_string(),
                });
            }
            let mut presigned = self.presigned.lock().unwrap();
            Ok(files
                .iter()
                .map(|f| {
                    presigned.push(f.key.clone());
                    PresignedGrant {
                        key: f.key.clone(),
                        presigned_url: format!("mock://{}", f.key),
                        database_id: format!("db-{}", f.name),
                        updated_at: Utc::now(),
                    }
                })
                .collect())
        }

        async fn delete(&self, key: &str) -> Result<(), ClientError> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn confirm(&self, database_id: &str) -> Result<AssetResponse, ClientError> {
            self.confirmed.lock().unwrap().push(database_id.to_string());
            if self.fail_confirm {
                return Err(ClientError::Api {
                    status: 409,
                    message: "Object has not been uploaded".to_string(),
                });
            }
            Ok(AssetResponse {
                id: database_id.to_string(),
                key: database_id.trim_start_matches("db-").to_string(),
                name: database_id.trim_start_matches("db-").to_string(),
                description: None,
                content_type: "application/octet-stream".to_string(),
                size: 0,
                checksum: String::new(),
                status: "confirmed".to_string(),
                schema_version: 1,
                extensions: Default::default(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }

        async fn list(&self, _: &ListAssetsQuery) -> Result<Vec<AssetResponse>, ClientError> {
            Ok(Vec::new())
        }

        async fn update(
            &self,
            _: &str,
            _: &UpdateAssetRequest,
        ) -> Result<AssetResponse, ClientError> {
            Err(ClientError::Api {
                status: 501,
                message: "not needed".to_string(),
            })
        }
    }

    /// Fails every attempt for files whose name starts with "bad", reports
    /// out-of-order progress for the rest.
    #[derive(Default)]
    struct ScriptedUploader {
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Uploader for ScriptedUploader {
        async fn upload(
            &self,
            grant: &PresignedGrant,
            file: &UploadFile,
            on_progress: ProgressFn,
        ) -> Result<(), ClientError> {
            self.attempts.lock().unwrap().push(grant.key.clone());
            if file.name.starts_with("bad") {
                on_progress(40);
                return Err(ClientError::UploadStatus(500));
            }
            for p in [10, 60, 30, 90] {
                on_progress(p);
            }
            on_progress(100);
            Ok(())
        }
    }

    struct CountingUploader(AtomicU32);

    #[async_trait]
    impl Uploader for CountingUploader {
        async fn upload(
            &self,
            _: &PresignedGrant,
            _: &UploadFile,
            _: ProgressFn,
        ) -> Result<(), ClientError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names
            .iter()
            .map(|n| UploadFile::from_bytes(*n, format!("contents of {}", n).into_bytes()))
            .collect()
    }

    #[tokio::test]
    async fn test_exhausted_retries_delete_the_record() {
        let api = Arc::new(MockApi::default());
        let uploader = Arc::new(ScriptedUploader::default());
        let orchestrator = UploadOrchestrator::new(api.clone(), uploader.clone());

        let summary = orchestrator.upload_all(files(&["bad.png"])).await.unwrap();

        assert!(summary.completed.is_empty());
        assert_eq!(summary.failed.len(), 1);
        let key = &summary.failed[0].key;

        assert_eq!(uploader.attempts.lock().unwrap().len(), 1 + MAX_RETRIES as usize);
        assert_eq!(*api.deleted.lock().unwrap(), vec![key.clone()]);
        assert!(api.confirmed.lock().unwrap().is_empty());

        let task = orchestrator.progress().get(key).unwrap();
        assert_eq!(task.status, UploadStatus::Error);
        assert!(task.error_message.unwrap().contains("500"));
        assert!(task.progress < 100);
    }

    #[tokio::test]
    async fn test_presign_failure_never_starts_uploads() {
        let api = Arc::new(MockApi {
            fail_presign: true,
            ..Default::default()
        });
        let uploader = Arc::new(CountingUploader(AtomicU32::new(0)));
        let orchestrator = UploadOrchestrator::new(api.clone(), uploader.clone());

        let err = orchestrator
            .upload_all(files(&["a.png", "b.png", "c.png"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Presign { status: 502, .. }));
        assert_eq!(uploader.0.load(Ordering::SeqCst), 0);

        let tasks = orchestrator.progress().snapshot();
        assert_eq!(tasks.len(), 3);
        for task in tasks {
            assert_eq!(task.status, UploadStatus::Error);
            assert_eq!(task.progress, 0);
        }
        assert!(api.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_file() {
        let api = Arc::new(MockApi::default());
        let uploader = Arc::new(ScriptedUploader::default());
        let orchestrator = UploadOrchestrator::new(api.clone(), uploader)
            .with_key_prefix("/media/2024/");

        let summary = orchestrator
            .upload_all(files(&["good.jpg", "bad.jpg", "other.txt"]))
            .await
            .unwrap();

        assert_eq!(summary.completed.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(!summary.all_completed());

        let mut confirmed = api.confirmed.lock().unwrap().clone();
        confirmed.sort();
        assert_eq!(confirmed, vec!["db-good.jpg", "db-other.txt"]);

        for done in &summary.completed {
            assert!(done.key.starts_with("media/2024/"));
            let task = orchestrator.progress().get(&done.key).unwrap();
            assert_eq!(task.status, UploadStatus::Completed);
            assert_eq!(task.progress, 100);
        }
        assert_eq!(*api.deleted.lock().unwrap(), vec![summary.failed[0].key.clone()]);
    }

    #[tokio::test]
    async fn test_unconfirmed_upload_is_failed_and_removed() {
        let api = Arc::new(MockApi {
            fail_confirm: true,
            ..Default::default()
        });
        let uploader = Arc::new(ScriptedUploader::default());
        let orchestrator = UploadOrchestrator::new(api.clone(), uploader.clone()).with_retries(2);

        let summary = orchestrator.upload_all(files(&["photo.png"])).await.unwrap();

        assert!(summary.completed.is_empty());
        assert_eq!(summary.failed.len(), 1);
        let key = &summary.failed[0].key;

        // One transfer, then the confirm is retried on its own
        assert_eq!(uploader.attempts.lock().unwrap().len(), 1);
        assert_eq!(api.confirmed.lock().unwrap().len(), 3);
        assert_eq!(*api.deleted.lock().unwrap(), vec![key.clone()]);

        let task = orchestrator.progress().get(key).unwrap();
        assert_eq!(task.status, UploadStatus::Error);
        assert!(task.progress < 100);
        assert!(task.error_message.unwrap().contains("409"));
    }

    #[tokio::test]
    async fn test_keys_follow_request_order() {
        let api = Arc::new(MockApi::default());
        let orchestrator =
            UploadOrchestrator::new(api.clone(), Arc::new(CountingUploader(AtomicU32::new(0))));

        let summary = orchestrator
            .upload_all(files(&["one.png", "two.png"]))
            .await
            .unwrap();

        let presigned = api.presigned.lock().unwrap().clone();
        let completed: Vec<String> = summary.completed.into_iter().map(|c| c.key).collect();
        assert_eq!(presigned, completed);

        assert!(orchestrator.dismiss(&completed[0]).is_some());
        assert_eq!(orchestrator.progress().len(), 1);
    }

    #[test]
    fn test_storage_key_shape() {
        let key = storage_key("assets", "My Holiday Photo.JPG");
        assert!(key.starts_with("assets/"));
        assert!(key.ends_with("-my-holiday-photo.jpg"), "{}", key);
        assert!(crate::utils::validation::validate_storage_key(&key).is_ok());

        let bare = storage_key("", "...");
        assert!(!bare.starts_with('/'));
        assert!(crate::utils::validation::validate_storage_key(&bare).is_ok());
    }
}
