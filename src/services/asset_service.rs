use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{assets, posts, prelude::*};
use crate::models::{ListAssetsQuery, PresignFileRequest, PresignedGrant, UpdateAssetRequest};
use crate::services::storage::{StorageError, StorageService};
use crate::utils::validation::{
    validate_checksum, validate_content_type, validate_file_size, validate_storage_key,
};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

pub struct AssetService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
}

impl AssetService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    fn validate_batch(&self, files: &[PresignFileRequest]) -> Result<(), AppError> {
        if files.is_empty() {
            return Err(AppError::BadRequest("Batch must contain at least one file".to_string()));
        }
        if files.len() > self.config.max_batch_files {
            return Err(AppError::BadRequest(format!(
                "Batch of {} files exceeds the limit of {}",
                files.len(),
                self.config.max_batch_files
            )));
        }

        let mut seen = HashSet::with_capacity(files.len());
        for file in files {
            file.validate()?;
            validate_storage_key(&file.key).map_err(|e| AppError::BadRequest(e.to_string()))?;
            validate_content_type(&file.content_type)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            validate_file_size(file.size, self.config.max_file_size)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            validate_checksum(&file.checksum).map_err(|e| AppError::BadRequest(e.to_string()))?;

            if !seen.insert(file.key.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Duplicate key in batch: {}",
                    file.key
                )));
            }
        }

        Ok(())
    }

    /// Creates one pending record per file and one write URL per key. All or
    /// nothing: any validation, database or provider failure leaves no rows.
    pub async fn presign_batch(
        &self,
        owner_id: &str,
        files: Vec<PresignFileRequest>,
    ) -> Result<Vec<PresignedGrant>, AppError> {
        self.validate_batch(&files)?;

        if !self.storage.is_configured() {
            return Err(StorageError::Unconfigured.into());
        }

        let keys: Vec<String> = files.iter().map(|f| f.key.clone()).collect();
        let taken = Assets::find()
            .filter(assets::Column::Key.is_in(keys))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(
                "One or more asset keys already exist".to_string(),
            ));
        }

        let now = Utc::now();
        let mut rows: Vec<(String, assets::ActiveModel)> = Vec::with_capacity(files.len());
        for file in &files {
            let size = i64::try_from(file.size).map_err(|_| {
                AppError::BadRequest(format!("File size {} is out of range", file.size))
            })?;
            let id = Uuid::new_v4().to_string();
            let row = assets::ActiveModel {
                id: Set(id.clone()),
                key: Set(file.key.clone()),
                name: Set(file.name.clone()),
                description: Set(file.description.clone()),
                content_type: Set(file.content_type.clone()),
                size: Set(size),
                checksum: Set(file.checksum.to_lowercase()),
                owner_id: Set(owner_id.to_string()),
                status: Set(assets::STATUS_PENDING.to_string()),
                schema_version: Set(assets::SCHEMA_VERSION),
                extensions: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            rows.push((id, row));
        }
        let ids: Vec<String> = rows.iter().map(|(id, _)| id.clone()).collect();

        let txn = self.db.begin().await?;

        if let Err(e) = Assets::insert_many(rows.into_iter().map(|(_, row)| row))
            .exec_without_returning(&txn)
            .await
        {
            txn.rollback().await?;
            return Err(AppError::from_db_conflict(
                e,
                "One or more asset keys already exist",
            ));
        }

        let mut grants = Vec::with_capacity(files.len());
        for (file, id) in files.iter().zip(ids) {
            let url = match self
                .storage
                .presign_put(&file.key, &file.content_type, self.config.presign_expiry())
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(
                        "❌ Presign failed for key {}, rolling back batch of {}: {}",
                        file.key,
                        files.len(),
                        e
                    );
                    txn.rollback().await?;
                    return Err(e.into());
                }
            };

            grants.push(PresignedGrant {
                key: file.key.clone(),
                presigned_url: url,
                database_id: id,
                updated_at: now,
            });
        }

        txn.commit().await?;

        tracing::info!(
            "📝 Issued {} presigned upload grants for user {}",
            grants.len(),
            owner_id
        );

        Ok(grants)
    }

    async fn find_owned_by_key(&self, owner_id: &str, key: &str) -> Result<assets::Model, AppError> {
        Assets::find()
            .filter(assets::Column::Key.eq(key))
            .filter(assets::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))
    }

    pub async fn get_asset(&self, owner_id: &str, id: &str) -> Result<assets::Model, AppError> {
        Assets::find_by_id(id)
            .filter(assets::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))
    }

    /// Removes the record and its object, clearing it from any post cover.
    /// The row delete only commits once the object is gone, so a storage
    /// failure never strands a live object.
    pub async fn delete_asset(&self, owner_id: &str, key: &str) -> Result<(), AppError> {
        let asset = self.find_owned_by_key(owner_id, key).await?;

        let txn = self.db.begin().await?;
        Posts::update_many()
            .col_expr(posts::Column::CoverAssetId, Expr::value(Option::<String>::None))
            .filter(posts::Column::CoverAssetId.eq(asset.id.as_str()))
            .exec(&txn)
            .await?;
        asset.clone().delete(&txn).await?;

        if let Err(e) = self.storage.delete_object(&asset.key).await {
            tracing::error!("❌ Failed to delete object {}: {}", asset.key, e);
            txn.rollback().await?;
            return Err(e.into());
        }

        txn.commit().await?;

        tracing::info!("🗑️  Deleted asset {} ({})", asset.id, asset.key);
        Ok(())
    }

    /// Second phase of an upload: `pending` becomes `confirmed` once the
    /// object is visible in storage. Already confirmed assets are returned as is.
    pub async fn confirm_asset(&self, owner_id: &str, id: &str) -> Result<assets::Model, AppError> {
        let asset = self.get_asset(owner_id, id).await?;
        if asset.status == assets::STATUS_CONFIRMED {
            return Ok(asset);
        }

        if !self.storage.object_exists(&asset.key).await? {
            return Err(AppError::Conflict(format!(
                "Object {} has not been uploaded",
                asset.key
            )));
        }

        let mut active: assets::ActiveModel = asset.into();
        active.status = Set(assets::STATUS_CONFIRMED.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;

        tracing::info!("✅ Confirmed asset {} ({})", updated.id, updated.key);
        Ok(updated)
    }

    pub async fn list_assets(
        &self,
        owner_id: &str,
        query: &ListAssetsQuery,
    ) -> Result<Vec<assets::Model>, AppError> {
        let mut select = Assets::find().filter(assets::Column::OwnerId.eq(owner_id));

        if let Some(status) = query.status.as_deref() {
            if status != assets::STATUS_PENDING && status != assets::STATUS_CONFIRMED {
                return Err(AppError::BadRequest(format!("Unknown status: {}", status)));
            }
            select = select.filter(assets::Column::Status.eq(status));
        }

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(assets::Column::Name.contains(search));
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        Ok(select
            .order_by_desc(assets::Column::UpdatedAt)
            .order_by_asc(assets::Column::Key)
            .limit(limit)
            .offset(query.offset.unwrap_or(0))
            .all(&self.db)
            .await?)
    }

    pub async fn update_asset(
        &self,
        owner_id: &str,
        id: &str,
        req: UpdateAssetRequest,
    ) -> Result<assets::Model, AppError> {
        req.validate()?;
        let asset = self.get_asset(owner_id, id).await?;

        let mut active: assets::ActiveModel = asset.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(extensions) = req.extensions {
            let value = serde_json::to_value(extensions)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            active.extensions = Set(Some(value));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes pending assets whose upload URL expired more than `ttl` ago,
    /// together with any bytes that reached storage. Oldest rows go first and
    /// rows whose object cannot be removed are paged past, so they never
    /// starve newer ones. Returns how many records were collected.
    pub async fn collect_stale_pending(&self, ttl: Duration) -> Result<usize, AppError> {
        let age = chrono::Duration::from_std(self.config.presign_expiry() + ttl)
            .map_err(|e| AppError::Internal(format!("Invalid pending TTL: {}", e)))?;
        let cutoff = Utc::now() - age;
        let page_size = self.config.gc_batch_size.max(1);

        let mut collected = 0;
        let mut skipped: u64 = 0;
        loop {
            let stale = Assets::find()
                .filter(assets::Column::Status.eq(assets::STATUS_PENDING))
                .filter(assets::Column::CreatedAt.lt(cutoff))
                .order_by_asc(assets::Column::CreatedAt)
                .order_by_asc(assets::Column::Id)
                .offset(skipped)
                .limit(page_size)
                .all(&self.db)
                .await?;
            let fetched = stale.len() as u64;

            for asset in stale {
                match self.storage.delete_object(&asset.key).await {
                    Ok(()) | Err(StorageError::NotFound(_)) => {}
                    Err(e) => {
                        tracing::warn!("Skipping stale asset {}: {}", asset.key, e);
                        skipped += 1;
                        continue;
                    }
                }

                let id = asset.id.clone();
                match asset.delete(&self.db).await {
                    Ok(_) => collected += 1,
                    Err(e) => {
                        tracing::error!("Failed to delete stale asset {}: {}", id, e);
                        skipped += 1;
                    }
                }
            }

            if fetched < page_size {
                break;
            }
        }

        if skipped > 0 {
            tracing::warn!("⚠️  {} stale assets could not be collected this run", skipped);
        }
        Ok(collected)
    }
}
