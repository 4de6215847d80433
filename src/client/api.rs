use crate::client::error::ClientError;
use crate::models::{
    AssetResponse, DeleteAssetRequest, ListAssetsQuery, PresignFileRequest, PresignedGrant,
    UpdateAssetRequest,
};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Backend calls the upload pipeline and the asset library depend on.
#[async_trait]
pub trait AssetApi: Send + Sync {
    /// Requests one grant per file. Grants come back in the order of `files`.
    async fn presign(&self, files: &[PresignFileRequest])
    -> Result<Vec<PresignedGrant>, ClientError>;

    async fn delete(&self, key: &str) -> Result<(), ClientError>;

    async fn confirm(&self, database_id: &str) -> Result<AssetResponse, ClientError>;

    async fn list(&self, query: &ListAssetsQuery) -> Result<Vec<AssetResponse>, ClientError>;

    async fn update(
        &self,
        database_id: &str,
        req: &UpdateAssetRequest,
    ) -> Result<AssetResponse, ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

async fn error_parts(response: Response) -> (u16, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    (status.as_u16(), message)
}

async fn api_error(response: Response) -> ClientError {
    let (status, message) = error_parts(response).await;
    ClientError::Api { status, message }
}

/// Puts grants back into request order and checks every key got exactly one.
pub fn match_grants(
    files: &[PresignFileRequest],
    grants: Vec<PresignedGrant>,
) -> Result<Vec<PresignedGrant>, ClientError> {
    if grants.len() != files.len() {
        return Err(ClientError::GrantMismatch(format!(
            "requested {} grants, received {}",
            files.len(),
            grants.len()
        )));
    }

    let mut by_key: HashMap<String, PresignedGrant> = grants
        .into_iter()
        .map(|g| (g.key.clone(), g))
        .collect();

    files
        .iter()
        .map(|f| {
            by_key
                .remove(&f.key)
                .ok_or_else(|| ClientError::GrantMismatch(format!("no grant for key {}", f.key)))
        })
        .collect()
}

/// JSON client for the asset endpoints, authenticated with a bearer token.
#[derive(Clone)]
pub struct PresignClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl PresignClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            base,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl AssetApi for PresignClient {
    async fn presign(
        &self,
        files: &[PresignFileRequest],
    ) -> Result<Vec<PresignedGrant>, ClientError> {
        let response = self
            .http
            .put(self.endpoint("api/assets")?)
            .bearer_auth(&self.token)
            .json(files)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            tracing::error!("Presign batch of {} failed ({}): {}", files.len(), status, message);
            return Err(ClientError::Presign { status, message });
        }

        let grants: Vec<PresignedGrant> = response.json().await?;
        match_grants(files, grants)
    }

    async fn delete(&self, key: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.endpoint("api/assets")?)
            .bearer_auth(&self.token)
            .json(&DeleteAssetRequest {
                key: key.to_string(),
            })
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // Already gone is what the caller wanted
            StatusCode::NOT_FOUND => Ok(()),
            _ => Err(api_error(response).await),
        }
    }

    async fn confirm(&self, database_id: &str) -> Result<AssetResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&format!("api/assets/{}/confirm", database_id))?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn list(&self, query: &ListAssetsQuery) -> Result<Vec<AssetResponse>, ClientError> {
        let response = self
            .http
            .get(self.endpoint("api/library")?)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn update(
        &self,
        database_id: &str,
        req: &UpdateAssetRequest,
    ) -> Result<AssetResponse, ClientError> {
        let response = self
            .http
            .patch(self.endpoint(&format!("api/assets/{}", database_id))?)
            .bearer_auth(&self.token)
            .json(req)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(key: &str) -> PresignFileRequest {
        PresignFileRequest {
            key: key.to_string(),
            name: key.to_string(),
            content_type: "image/png".to_string(),
            size: 1,
            checksum: "0".repeat(64),
            description: None,
        }
    }

    fn grant(key: &str) -> PresignedGrant {
        PresignedGrant {
            key: key.to_string(),
            presigned_url: format!("http://store/{}", key),
            database_id: format!("id-{}", key),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_match_grants_restores_request_order() {
        let files = vec![file("a"), file("b"), file("c")];
        let grants = vec![grant("c"), grant("a"), grant("b")];

        let ordered = match_grants(&files, grants).unwrap();
        let keys: Vec<&str> = ordered.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_match_grants_rejects_missing_or_extra() {
        let files = vec![file("a"), file("b")];
        assert!(matches!(
            match_grants(&files, vec![grant("a")]),
            Err(ClientError::GrantMismatch(_))
        ));
        assert!(matches!(
            match_grants(&files, vec![grant("a"), grant("x")]),
            Err(ClientError::GrantMismatch(_))
        ));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = PresignClient::new("http://localhost:3000/cms", "t").unwrap();
        assert_eq!(
            client.endpoint("api/assets").unwrap().as_str(),
            "http://localhost:3000/cms/api/assets"
        );
    }
}
