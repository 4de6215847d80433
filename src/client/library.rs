use crate::client::api::AssetApi;
use crate::client::error::ClientError;
use crate::client::optimistic::{Mutation, OptimisticList};
use crate::models::{AssetResponse, ListAssetsQuery, UpdateAssetRequest};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct LibraryState {
    assets: OptimisticList<AssetResponse>,
    selected: Option<String>,
}

/// The asset grid: the user's stored assets with select, edit and delete
/// wired to the backend. Deletes hide the asset before the server answers.
pub struct AssetLibrary {
    api: Arc<dyn AssetApi>,
    state: Mutex<LibraryState>,
}

impl AssetLibrary {
    pub fn new(api: Arc<dyn AssetApi>) -> Self {
        Self {
            api,
            state: Mutex::new(LibraryState::default()),
        }
    }

    pub async fn refresh(&self, query: &ListAssetsQuery) -> Result<usize, ClientError> {
        let assets = self.api.list(query).await?;
        let count = assets.len();
        self.state.lock().await.assets.replace_confirmed(assets);
        Ok(count)
    }

    pub async fn visible(&self) -> Vec<AssetResponse> {
        self.state.lock().await.assets.view()
    }

    /// Selects a visible asset by key; unknown keys clear the selection.
    pub async fn select(&self, key: &str) -> Option<AssetResponse> {
        let mut state = self.state.lock().await;
        let found = state.assets.view().into_iter().find(|a| a.key == key);
        state.selected = found.as_ref().map(|a| a.key.clone());
        found
    }

    pub async fn selected(&self) -> Option<AssetResponse> {
        let state = self.state.lock().await;
        let key = state.selected.as_deref()?;
        state.assets.view().into_iter().find(|a| a.key == key)
    }

    pub async fn update(
        &self,
        key: &str,
        req: &UpdateAssetRequest,
    ) -> Result<AssetResponse, ClientError> {
        let database_id = {
            let state = self.state.lock().await;
            state
                .assets
                .view()
                .into_iter()
                .find(|a| a.key == key)
                .map(|a| a.id)
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: format!("Asset {} is not in the library", key),
                })?
        };

        let updated = self.api.update(&database_id, req).await?;
        self.state
            .lock()
            .await
            .assets
            .upsert_confirmed(updated.clone());
        Ok(updated)
    }

    /// Removes the asset from the visible list immediately, then asks the
    /// backend to delete it. On failure the asset reappears.
    pub async fn delete(&self, key: &str) -> Result<(), ClientError> {
        let mutation = {
            let mut state = self.state.lock().await;
            if state.selected.as_deref() == Some(key) {
                state.selected = None;
            }
            state.assets.submit(Mutation::Delete(key.to_string()))
        };

        match self.api.delete(key).await {
            Ok(()) => {
                self.state.lock().await.assets.confirm(mutation, None);
                tracing::info!("🗑️  Deleted asset {}", key);
                Ok(())
            }
            Err(e) => {
                self.state.lock().await.assets.fail(mutation);
                tracing::warn!("Delete of {} failed, restoring it: {}", key, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PresignFileRequest, PresignedGrant};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tokio::sync::Notify;

    fn asset(key: &str) -> AssetResponse {
        AssetResponse {
            id: format!("id-{}", key),
            key: key.to_string(),
            name: key.to_string(),
            description: None,
            content_type: "image/png".to_string(),
            size: 10,
            checksum: "0".repeat(64),
            status: "confirmed".to_string(),
            schema_version: 1,
            extensions: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Delete blocks until `release` is notified and then succeeds or fails.
    struct GatedApi {
        started: Notify,
        release: Notify,
        fail_delete: bool,
    }

    impl GatedApi {
        fn new(fail_delete: bool) -> Self {
            Self {
                started: Notify::new(),
                release: Notify::new(),
                fail_delete,
            }
        }
    }

    #[async_trait]
    impl AssetApi for GatedApi {
        async fn presign(
            &self,
            _: &[PresignFileRequest],
        ) -> Result<Vec<PresignedGrant>, ClientError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _: &str) -> Result<(), ClientError> {
            self.started.notify_one();
            self.release.notified().await;
            if self.fail_delete {
                Err(ClientError::Api {
                    status: 502,
                    message: "Storage provider request failed".to_string(),
                })
            } else {
                Ok(())
            }
        }

        async fn confirm(&self, _: &str) -> Result<AssetResponse, ClientError> {
            unreachable!("library never confirms")
        }

        async fn list(&self, _: &ListAssetsQuery) -> Result<Vec<AssetResponse>, ClientError> {
            Ok(vec![asset("a.png"), asset("b.png")])
        }

        async fn update(
            &self,
            id: &str,
            req: &UpdateAssetRequest,
        ) -> Result<AssetResponse, ClientError> {
            let mut updated = asset(id.trim_start_matches("id-"));
            if let Some(name) = &req.name {
                updated.name = name.clone();
            }
            Ok(updated)
        }
    }

    fn keys(assets: &[AssetResponse]) -> Vec<&str> {
        assets.iter().map(|a| a.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_delete_hides_asset_before_server_answers() {
        let api = Arc::new(GatedApi::new(false));
        let library = Arc::new(AssetLibrary::new(api.clone()));
        library.refresh(&ListAssetsQuery::default()).await.unwrap();
        library.select("a.png").await;

        let task = tokio::spawn({
            let library = library.clone();
            async move { library.delete("a.png").await }
        });

        api.started.notified().await;
        assert_eq!(keys(&library.visible().await), vec!["b.png"]);
        assert!(library.selected().await.is_none());

        api.release.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(keys(&library.visible().await), vec!["b.png"]);
    }

    #[tokio::test]
    async fn test_failed_delete_restores_asset() {
        let api = Arc::new(GatedApi::new(true));
        let library = Arc::new(AssetLibrary::new(api.clone()));
        library.refresh(&ListAssetsQuery::default()).await.unwrap();

        let task = tokio::spawn({
            let library = library.clone();
            async move { library.delete("b.png").await }
        });

        api.started.notified().await;
        assert_eq!(keys(&library.visible().await), vec!["a.png"]);

        api.release.notify_one();
        assert!(task.await.unwrap().is_err());
        assert_eq!(keys(&library.visible().await), vec!["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn test_update_replaces_entry_in_place() {
        let library = AssetLibrary::new(Arc::new(GatedApi::new(false)));
        library.refresh(&ListAssetsQuery::default()).await.unwrap();

        let req = UpdateAssetRequest {
            name: Some("Hero image".to_string()),
            ..Default::default()
        };
        let updated = library.update("b.png", &req).await.unwrap();
        assert_eq!(updated.name, "Hero image");

        let visible = library.visible().await;
        assert_eq!(keys(&visible), vec!["a.png", "b.png"]);
        assert_eq!(visible[1].name, "Hero image");

        assert!(library.update("missing.png", &req).await.is_err());
    }
}
