use crate::api::error::AppError;
use crate::entities::{categories, post_tags, prelude::*, subcategories, tags};
use crate::models::{CreateTaxonomyRequest, TaxonomyEntry};
use crate::utils::slug::slugify;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

/// Tags, categories and subcategories applied to posts.
pub struct TaxonomyService {
    db: DatabaseConnection,
}

fn resolve_slug(req: &CreateTaxonomyRequest) -> Result<(String, String), AppError> {
    req.validate()?;
    let name = req.name.trim().to_string();
    let slug = slugify(req.slug.as_deref().unwrap_or(&name));
    if name.is_empty() || slug.is_empty() {
        return Err(AppError::BadRequest(
            "Name must contain at least one letter or digit".to_string(),
        ));
    }
    Ok((name, slug))
}

impl TaxonomyService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_tags(&self) -> Result<Vec<TaxonomyEntry>, AppError> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(TaxonomyEntry::from).collect())
    }

    pub async fn create_tag(&self, req: CreateTaxonomyRequest) -> Result<TaxonomyEntry, AppError> {
        let (name, slug) = resolve_slug(&req)?;

        let exists = Tags::find()
            .filter(
                Condition::any()
                    .add(tags::Column::Name.eq(&name))
                    .add(tags::Column::Slug.eq(&slug)),
            )
            .count(&self.db)
            .await?;
        if exists > 0 {
            return Err(AppError::Conflict(format!("Tag '{}' already exists", name)));
        }

        let tag = tags::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            slug: Set(slug),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::from_db_conflict(e, "Tag already exists"))?;

        tracing::info!("🏷️  Created tag {} ({})", tag.name, tag.id);
        Ok(tag.into())
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        PostTags::delete_many()
            .filter(post_tags::Column::TagId.eq(id))
            .exec(&txn)
            .await?;
        let res = Tags::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::NotFound("Tag not found".to_string()));
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<TaxonomyEntry>, AppError> {
        let rows = Categories::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(TaxonomyEntry::from).collect())
    }

    pub async fn create_category(
        &self,
        req: CreateTaxonomyRequest,
    ) -> Result<TaxonomyEntry, AppError> {
        let (name, slug) = resolve_slug(&req)?;

        let exists = Categories::find()
            .filter(
                Condition::any()
                    .add(categories::Column::Name.eq(&name))
                    .add(categories::Column::Slug.eq(&slug)),
            )
            .count(&self.db)
            .await?;
        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            slug: Set(slug),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::from_db_conflict(e, "Category already exists"))?;

        tracing::info!("📁 Created category {} ({})", category.name, category.id);
        Ok(category.into())
    }

    /// Removes the category together with its subcategories.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        Subcategories::delete_many()
            .filter(subcategories::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        let res = Categories::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn list_subcategories(&self, category_id: &str) -> Result<Vec<TaxonomyEntry>, AppError> {
        Categories::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let rows = Subcategories::find()
            .filter(subcategories::Column::CategoryId.eq(category_id))
            .order_by_asc(subcategories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(TaxonomyEntry::from).collect())
    }

    pub async fn create_subcategory(
        &self,
        category_id: &str,
        req: CreateTaxonomyRequest,
    ) -> Result<TaxonomyEntry, AppError> {
        let (name, slug) = resolve_slug(&req)?;

        Categories::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let exists = Subcategories::find()
            .filter(subcategories::Column::CategoryId.eq(category_id))
            .filter(subcategories::Column::Slug.eq(&slug))
            .count(&self.db)
            .await?;
        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "Subcategory '{}' already exists in this category",
                name
            )));
        }

        let subcategory = subcategories::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            category_id: Set(category_id.to_string()),
            name: Set(name),
            slug: Set(slug),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::from_db_conflict(e, "Subcategory already exists"))?;

        Ok(subcategory.into())
    }

    pub async fn delete_subcategory(&self, id: &str) -> Result<(), AppError> {
        let res = Subcategories::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Subcategory not found".to_string()));
        }
        Ok(())
    }
}
