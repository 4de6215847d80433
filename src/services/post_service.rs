use crate::api::error::AppError;
use crate::entities::{assets, post_tags, posts, prelude::*, seo_metadata, tags};
use crate::models::{CreatePostRequest, ListPostsQuery, PostResponse, PostSeo, UpdatePostRequest};
use crate::utils::slug::slugify;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

pub struct PostService {
    db: DatabaseConnection,
}

/// Foreign keys a post points at, checked before any write.
struct PostLinks<'a> {
    editor_id: &'a str,
    category_id: Option<&'a str>,
    subcategory_id: Option<&'a str>,
    /// Only a cover being set by this request; a kept cover is not rechecked
    new_cover_asset_id: Option<&'a str>,
    tag_ids: Option<&'a [String]>,
}

fn parse_status(status: Option<&str>) -> Result<Option<&'static str>, AppError> {
    match status {
        None => Ok(None),
        Some(posts::STATUS_DRAFT) => Ok(Some(posts::STATUS_DRAFT)),
        Some(posts::STATUS_PUBLISHED) => Ok(Some(posts::STATUS_PUBLISHED)),
        Some(other) => Err(AppError::BadRequest(format!("Unknown post status: {}", other))),
    }
}

fn check_seo(seo: &PostSeo) -> Result<(), AppError> {
    if let Some(canonical) = seo.canonical_url.as_deref() {
        let parsed = url::Url::parse(canonical)
            .map_err(|e| AppError::BadRequest(format!("Invalid canonical URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::BadRequest(
                "Canonical URL must use http or https".to_string(),
            ));
        }
    }
    Ok(())
}

/// Empty strings clear optional references.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn dedup_tags(tag_ids: &[String]) -> Vec<String> {
    tag_ids
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn seo_row(post_id: &str, seo: PostSeo) -> seo_metadata::ActiveModel {
    seo_metadata::ActiveModel {
        post_id: Set(post_id.to_string()),
        meta_title: Set(non_empty(seo.meta_title)),
        meta_description: Set(non_empty(seo.meta_description)),
        canonical_url: Set(non_empty(seo.canonical_url)),
        og_image_key: Set(non_empty(seo.og_image_key)),
        no_index: Set(seo.no_index),
    }
}

async fn write_tags(
    txn: &DatabaseTransaction,
    post_id: &str,
    tag_ids: &[String],
) -> Result<(), AppError> {
    PostTags::delete_many()
        .filter(post_tags::Column::PostId.eq(post_id))
        .exec(txn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    PostTags::insert_many(tag_ids.iter().map(|tag_id| post_tags::ActiveModel {
        post_id: Set(post_id.to_string()),
        tag_id: Set(tag_id.clone()),
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

async fn write_seo(txn: &DatabaseTransaction, post_id: &str, seo: PostSeo) -> Result<(), AppError> {
    SeoMetadata::delete_by_id(post_id).exec(txn).await?;
    seo_row(post_id, seo).insert(txn).await?;
    Ok(())
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<&str>) -> Result<(), AppError> {
        let mut query = Posts::find().filter(posts::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(posts::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            return Err(AppError::Conflict(format!(
                "A post with slug '{}' already exists",
                slug
            )));
        }
        Ok(())
    }

    async fn check_links(&self, links: PostLinks<'_>) -> Result<(), AppError> {
        if let Some(category_id) = links.category_id {
            Categories::find_by_id(category_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category: {}", category_id)))?;
        }

        if let Some(subcategory_id) = links.subcategory_id {
            let subcategory = Subcategories::find_by_id(subcategory_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Unknown subcategory: {}", subcategory_id))
                })?;
            if links.category_id != Some(subcategory.category_id.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Subcategory {} does not belong to the post's category",
                    subcategory_id
                )));
            }
        }

        if let Some(asset_id) = links.new_cover_asset_id {
            // Pending assets can still be collected
            let usable = Assets::find_by_id(asset_id)
                .filter(assets::Column::OwnerId.eq(links.editor_id))
                .filter(assets::Column::Status.eq(assets::STATUS_CONFIRMED))
                .count(&self.db)
                .await?;
            if usable == 0 {
                return Err(AppError::BadRequest(format!(
                    "Cover asset {} is not a confirmed asset in your library",
                    asset_id
                )));
            }
        }

        if let Some(tag_ids) = links.tag_ids.filter(|ids| !ids.is_empty()) {
            let found = Tags::find()
                .filter(tags::Column::Id.is_in(tag_ids.iter().cloned()))
                .count(&self.db)
                .await?;
            if found != tag_ids.len() as u64 {
                return Err(AppError::BadRequest(
                    "One or more tags do not exist".to_string(),
                ));
            }
        }

        Ok(())
    }

    async fn to_response(&self, post: posts::Model) -> Result<PostResponse, AppError> {
        let tags = post
            .find_related(Tags)
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await?;
        let seo = SeoMetadata::find_by_id(post.id.clone()).one(&self.db).await?;

        Ok(PostResponse {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            status: post.status,
            category_id: post.category_id,
            subcategory_id: post.subcategory_id,
            cover_asset_id: post.cover_asset_id,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
            tags: tags.into_iter().map(Into::into).collect(),
            seo: seo.map(Into::into),
        })
    }

    pub async fn create_post(
        &self,
        author_id: &str,
        req: CreatePostRequest,
    ) -> Result<PostResponse, AppError> {
        req.validate()?;
        let status = parse_status(req.status.as_deref())?.unwrap_or(posts::STATUS_DRAFT);
        if let Some(seo) = &req.seo {
            check_seo(seo)?;
        }

        let slug = slugify(req.slug.as_deref().unwrap_or(&req.title));
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "Slug must contain at least one letter or digit".to_string(),
            ));
        }
        self.ensure_slug_free(&slug, None).await?;

        let category_id = non_empty(req.category_id);
        let subcategory_id = non_empty(req.subcategory_id);
        let cover_asset_id = non_empty(req.cover_asset_id);
        let tag_ids = dedup_tags(&req.tag_ids);
        self.check_links(PostLinks {
            editor_id: author_id,
            category_id: category_id.as_deref(),
            subcategory_id: subcategory_id.as_deref(),
            new_cover_asset_id: cover_asset_id.as_deref(),
            tag_ids: Some(&tag_ids),
        })
        .await?;

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let published_at = (status == posts::STATUS_PUBLISHED).then_some(now);

        let txn = self.db.begin().await?;

        let post = posts::ActiveModel {
            id: Set(id.clone()),
            author_id: Set(author_id.to_string()),
            title: Set(req.title.trim().to_string()),
            slug: Set(slug),
            content: Set(req.content),
            excerpt: Set(non_empty(req.excerpt)),
            status: Set(status.to_string()),
            category_id: Set(category_id),
            subcategory_id: Set(subcategory_id),
            cover_asset_id: Set(cover_asset_id),
            published_at: Set(published_at),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_db_conflict(e, "A post with this slug already exists"))?;

        write_tags(&txn, &id, &tag_ids).await?;
        if let Some(seo) = req.seo {
            write_seo(&txn, &id, seo).await?;
        }

        txn.commit().await?;

        tracing::info!("📝 Created post {} ({})", post.slug, post.id);
        self.to_response(post).await
    }

    pub async fn get_post(&self, id: &str) -> Result<PostResponse, AppError> {
        let post = Posts::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        self.to_response(post).await
    }

    pub async fn list_posts(&self, query: &ListPostsQuery) -> Result<Vec<PostResponse>, AppError> {
        let mut select = Posts::find();
        if let Some(status) = parse_status(query.status.as_deref())? {
            select = select.filter(posts::Column::Status.eq(status));
        }
        if let Some(category_id) = query.category_id.as_deref() {
            select = select.filter(posts::Column::CategoryId.eq(category_id));
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let rows = select
            .order_by_desc(posts::Column::UpdatedAt)
            .order_by_asc(posts::Column::Id)
            .limit(limit)
            .offset(query.offset.unwrap_or(0))
            .all(&self.db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for post in rows {
            out.push(self.to_response(post).await?);
        }
        Ok(out)
    }

    pub async fn update_post(
        &self,
        editor_id: &str,
        id: &str,
        req: UpdatePostRequest,
    ) -> Result<PostResponse, AppError> {
        req.validate()?;
        let status = parse_status(req.status.as_deref())?;
        if let Some(seo) = &req.seo {
            check_seo(seo)?;
        }

        let existing = Posts::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let slug = match req.slug.as_deref() {
            Some(raw) => {
                let slug = slugify(raw);
                if slug.is_empty() {
                    return Err(AppError::BadRequest(
                        "Slug must contain at least one letter or digit".to_string(),
                    ));
                }
                self.ensure_slug_free(&slug, Some(id)).await?;
                Some(slug)
            }
            None => None,
        };

        let category_id = match req.category_id {
            Some(v) => non_empty(Some(v)),
            None => existing.category_id.clone(),
        };
        let subcategory_id = match req.subcategory_id {
            Some(v) => non_empty(Some(v)),
            // Moving to another category drops a subcategory that no longer fits
            None if category_id != existing.category_id => None,
            None => existing.subcategory_id.clone(),
        };
        let new_cover = req.cover_asset_id.map(|v| non_empty(Some(v)));
        let cover_asset_id = match &new_cover {
            Some(v) => v.clone(),
            None => existing.cover_asset_id.clone(),
        };
        let tag_ids = req.tag_ids.as_deref().map(dedup_tags);

        self.check_links(PostLinks {
            editor_id,
            category_id: category_id.as_deref(),
            subcategory_id: subcategory_id.as_deref(),
            new_cover_asset_id: new_cover.as_ref().and_then(|c| c.as_deref()),
            tag_ids: tag_ids.as_deref(),
        })
        .await?;

        let now = Utc::now();
        let first_publish =
            status == Some(posts::STATUS_PUBLISHED) && existing.published_at.is_none();

        let mut active: posts::ActiveModel = existing.into();
        if let Some(title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(content) = req.content {
            active.content = Set(content);
        }
        if let Some(excerpt) = req.excerpt {
            active.excerpt = Set(non_empty(Some(excerpt)));
        }
        if let Some(status) = status {
            active.status = Set(status.to_string());
        }
        if first_publish {
            active.published_at = Set(Some(now));
        }
        active.category_id = Set(category_id);
        active.subcategory_id = Set(subcategory_id);
        active.cover_asset_id = Set(cover_asset_id);
        active.updated_at = Set(now);

        let txn = self.db.begin().await?;

        let post = active
            .update(&txn)
            .await
            .map_err(|e| AppError::from_db_conflict(e, "A post with this slug already exists"))?;
        if let Some(tag_ids) = &tag_ids {
            write_tags(&txn, id, tag_ids).await?;
        }
        if let Some(seo) = req.seo {
            write_seo(&txn, id, seo).await?;
        }

        txn.commit().await?;

        self.to_response(post).await
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        PostTags::delete_many()
            .filter(post_tags::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        SeoMetadata::delete_by_id(id).exec(&txn).await?;
        let res = Posts::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        txn.commit().await?;

        tracing::info!("🗑️  Deleted post {}", id);
        Ok(())
    }
}
