//! Wire types shared by the HTTP handlers and the upload client.

use crate::entities::{assets, categories, seo_metadata, subcategories, tags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

/// One file of a presign batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct PresignFileRequest {
    /// Storage path the object will be written to
    #[validate(length(min = 1, max = 512, message = "Key must be 1-512 characters"))]
    pub key: String,
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(min = 3, max = 255, message = "Invalid content type"))]
    pub content_type: String,
    pub size: u64,
    /// Hex SHA-256 of the file contents
    #[validate(length(equal = 64, message = "Checksum must be a hex SHA-256 digest"))]
    pub checksum: String,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
}

/// Write permission for one object, returned in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PresignedGrant {
    pub key: String,
    pub presigned_url: String,
    pub database_id: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct DeleteAssetRequest {
    #[validate(length(min = 1, max = 512))]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetResponse {
    pub id: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub content_type: String,
    pub size: i64,
    pub checksum: String,
    pub status: String,
    pub schema_version: i32,
    pub extensions: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<assets::Model> for AssetResponse {
    fn from(model: assets::Model) -> Self {
        let extensions = model
            .extensions
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Self {
            id: model.id,
            key: model.key,
            name: model.name,
            description: model.description,
            content_type: model.content_type,
            size: model.size,
            checksum: model.checksum,
            status: model.status,
            schema_version: model.schema_version,
            extensions,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateAssetRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    pub extensions: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAssetsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A tag, category or subcategory. `category_id` is only set for subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaxonomyEntry {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: Option<String>,
}

impl From<tags::Model> for TaxonomyEntry {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            category_id: None,
        }
    }
}

impl From<categories::Model> for TaxonomyEntry {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            category_id: None,
        }
    }
}

impl From<subcategories::Model> for TaxonomyEntry {
    fn from(model: subcategories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            category_id: Some(model.category_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateTaxonomyRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "Slug must be 1-64 characters"))]
    pub slug: Option<String>,
}

/// SEO fields stored alongside a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct PostSeo {
    #[validate(length(max = 70, message = "Meta title must be at most 70 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 160, message = "Meta description must be at most 160 characters"))]
    pub meta_description: Option<String>,
    /// Absolute http(s) URL
    pub canonical_url: Option<String>,
    /// Storage key of the Open Graph image
    pub og_image_key: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

impl From<seo_metadata::Model> for PostSeo {
    fn from(model: seo_metadata::Model) -> Self {
        Self {
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            canonical_url: model.canonical_url,
            og_image_key: model.og_image_key,
            no_index: model.no_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 500, message = "Excerpt is too long"))]
    pub excerpt: Option<String>,
    /// `draft` (default) or `published`
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub cover_asset_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[validate(nested)]
    pub seo: Option<PostSeo>,
}

/// Partial update. Omitted fields are left alone; an empty string clears
/// `category_id`, `subcategory_id` and `cover_asset_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: Option<String>,
    pub content: Option<String>,
    #[validate(length(max = 500, message = "Excerpt is too long"))]
    pub excerpt: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub cover_asset_id: Option<String>,
    /// Replaces the full tag set when present
    pub tag_ids: Option<Vec<String>>,
    #[validate(nested)]
    pub seo: Option<PostSeo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub status: Option<String>,
    pub category_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub cover_asset_id: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<TaxonomyEntry>,
    pub seo: Option<PostSeo>,
}
