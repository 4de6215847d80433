use crate::api::error::AppError;
use crate::entities::{assets, posts, prelude::*, users};
use crate::utils::auth::hash_password;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Profile changes a user may make to their own account.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account profiles and admin-only account management.
pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: &str) -> Result<users::Model, AppError> {
        Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Loads the caller and fails with 403 unless they hold the admin flag.
    /// The flag is read on every call so a revoked admin loses access at once.
    pub async fn require_admin(&self, user_id: &str) -> Result<users::Model, AppError> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;
        if !user.is_admin {
            return Err(AppError::Forbidden(
                "Administrator privileges required".to_string(),
            ));
        }
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        id: &str,
        changes: ProfileChanges,
    ) -> Result<users::Model, AppError> {
        let user = self.get(id).await?;
        let mut active: users::ActiveModel = user.into();

        if let Some(email) = changes.email {
            let email = email.trim().to_string();
            active.email = Set((!email.is_empty()).then_some(email));
        }
        if let Some(password) = changes.password {
            active.password_hash = Set(hash_password(&password)?);
        }

        let updated = active.update(&self.db).await?;
        tracing::info!("👤 Updated profile of {}", updated.username);
        Ok(updated)
    }

    pub async fn list(&self) -> Result<Vec<users::Model>, AppError> {
        Ok(Users::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await?)
    }

    pub async fn set_admin(
        &self,
        acting_id: &str,
        id: &str,
        is_admin: bool,
    ) -> Result<users::Model, AppError> {
        if acting_id == id && !is_admin {
            return Err(AppError::BadRequest(
                "Administrators cannot revoke their own role".to_string(),
            ));
        }

        let user = self.get(id).await?;
        if user.is_admin == is_admin {
            return Ok(user);
        }

        let mut active: users::ActiveModel = user.into();
        active.is_admin = Set(is_admin);
        let updated = active.update(&self.db).await?;
        tracing::info!(
            "🛡️ {} admin role for {} (by {})",
            if is_admin { "Granted" } else { "Revoked" },
            updated.username,
            acting_id
        );
        Ok(updated)
    }

    /// Removes an account that no longer owns content. Assets and posts have to be
    /// deleted or handed over first so no storage object is left without a record.
    pub async fn delete(&self, acting_id: &str, id: &str) -> Result<(), AppError> {
        if acting_id == id {
            return Err(AppError::BadRequest(
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        let user = self.get(id).await?;

        let owned_assets = Assets::find()
            .filter(assets::Column::OwnerId.eq(id))
            .count(&self.db)
            .await?;
        let authored_posts = Posts::find()
            .filter(posts::Column::AuthorId.eq(id))
            .count(&self.db)
            .await?;
        if owned_assets > 0 || authored_posts > 0 {
            return Err(AppError::Conflict(format!(
                "User {} still owns {} assets and {} posts",
                user.username, owned_assets, authored_posts
            )));
        }

        Users::delete_by_id(id).exec(&self.db).await?;
        tracing::info!("🗑️ Deleted user {} (by {})", user.username, acting_id);
        Ok(())
    }
}
