pub mod api;
pub mod client;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::asset_service::AssetService;
use crate::services::post_service::PostService;
use crate::services::storage::StorageService;
use crate::services::taxonomy_service::TaxonomyService;
use crate::services::user_service::UserService;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::health::health_check,
        api::handlers::assets::presign_assets,
        api::handlers::assets::delete_asset,
        api::handlers::assets::list_assets,
        api::handlers::assets::get_asset,
        api::handlers::assets::update_asset,
        api::handlers::assets::confirm_asset,
        api::handlers::taxonomy::list_tags,
        api::handlers::taxonomy::create_tag,
        api::handlers::taxonomy::delete_tag,
        api::handlers::taxonomy::list_categories,
        api::handlers::taxonomy::create_category,
        api::handlers::taxonomy::delete_category,
        api::handlers::taxonomy::list_subcategories,
        api::handlers::taxonomy::create_subcategory,
        api::handlers::taxonomy::delete_subcategory,
        api::handlers::posts::list_posts,
        api::handlers::posts::create_post,
        api::handlers::posts::get_post,
        api::handlers::posts::update_post,
        api::handlers::posts::delete_post,
        api::handlers::users::get_profile,
        api::handlers::users::update_profile,
        api::handlers::users::list_users,
        api::handlers::users::update_role,
        api::handlers::users::delete_user,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::AuthRequest,
            api::handlers::auth::AuthResponse,
            api::handlers::health::HealthResponse,
            models::PresignFileRequest,
            models::PresignedGrant,
            models::DeleteAssetRequest,
            models::AssetResponse,
            models::UpdateAssetRequest,
            models::TaxonomyEntry,
            models::CreateTaxonomyRequest,
            models::PostSeo,
            models::CreatePostRequest,
            models::UpdatePostRequest,
            models::PostResponse,
            api::handlers::users::UserProfileResponse,
            api::handlers::users::UpdateProfileRequest,
            api::handlers::users::UpdateRoleRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "assets", description = "Presigned uploads and asset metadata"),
        (name = "taxonomy", description = "Tags, categories and subcategories"),
        (name = "posts", description = "Blog posts and SEO metadata"),
        (name = "users", description = "Profiles and account administration"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

/// Shared application context, built once at startup and cloned into handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub config: AppConfig,
    pub assets: Arc<AssetService>,
    pub taxonomy: Arc<TaxonomyService>,
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        let assets = Arc::new(AssetService::new(
            db.clone(),
            storage.clone(),
            config.clone(),
        ));
        let taxonomy = Arc::new(TaxonomyService::new(db.clone()));
        let posts = Arc::new(PostService::new(db.clone()));
        let users = Arc::new(UserService::new(db.clone()));

        Self {
            db,
            storage,
            config,
            assets,
            taxonomy,
            posts,
            users,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        // Presign and delete are the only verbs on the collection; axum answers 405 for the rest
        .route(
            "/api/assets",
            put(api::handlers::assets::presign_assets).delete(api::handlers::assets::delete_asset),
        )
        .route(
            "/api/assets/:id",
            get(api::handlers::assets::get_asset).patch(api::handlers::assets::update_asset),
        )
        .route(
            "/api/assets/:id/confirm",
            post(api::handlers::assets::confirm_asset),
        )
        .route("/api/library", get(api::handlers::assets::list_assets))
        .route(
            "/api/tags",
            get(api::handlers::taxonomy::list_tags).post(api::handlers::taxonomy::create_tag),
        )
        .route("/api/tags/:id", delete(api::handlers::taxonomy::delete_tag))
        .route(
            "/api/categories",
            get(api::handlers::taxonomy::list_categories)
                .post(api::handlers::taxonomy::create_category),
        )
        .route(
            "/api/categories/:id",
            delete(api::handlers::taxonomy::delete_category),
        )
        .route(
            "/api/categories/:id/subcategories",
            get(api::handlers::taxonomy::list_subcategories)
                .post(api::handlers::taxonomy::create_subcategory),
        )
        .route(
            "/api/subcategories/:id",
            delete(api::handlers::taxonomy::delete_subcategory),
        )
        .route(
            "/api/posts",
            get(api::handlers::posts::list_posts).post(api::handlers::posts::create_post),
        )
        .route(
            "/api/posts/:id",
            get(api::handlers::posts::get_post)
                .put(api::handlers::posts::update_post)
                .delete(api::handlers::posts::delete_post),
        )
        .route(
            "/api/users/me",
            get(api::handlers::users::get_profile).put(api::handlers::users::update_profile),
        )
        .route("/api/users", get(api::handlers::users::list_users))
        .route("/api/users/:id", delete(api::handlers::users::delete_user))
        .route(
            "/api/users/:id/role",
            put(api::handlers::users::update_role),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .merge(protected)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
