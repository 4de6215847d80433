use crate::entities::{
    assets, categories, post_tags, posts, seo_metadata, subcategories, tags, users,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://cms-admin.db?mode=rwc";

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::warn!(
            "DATABASE_URL not set, falling back to {}",
            DEFAULT_DATABASE_URL
        );
        DEFAULT_DATABASE_URL.to_string()
    });

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: users -> assets/posts, categories -> subcategories -> posts
    let stmts = vec![
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "assets",
            schema
                .create_table_from_entity(assets::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "categories",
            schema
                .create_table_from_entity(categories::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "subcategories",
            schema
                .create_table_from_entity(subcategories::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "tags",
            schema
                .create_table_from_entity(tags::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "posts",
            schema
                .create_table_from_entity(posts::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "post_tags",
            schema
                .create_table_from_entity(post_tags::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "seo_metadata",
            schema
                .create_table_from_entity(seo_metadata::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt).await?;
        info!("   - Table '{}' checked/created", name);
    }

    // create_table_from_entity cannot express composite or secondary indexes, and
    // skips columns added after the table was first created
    let schema_updates = [
        "ALTER TABLE users ADD COLUMN is_admin BOOLEAN NOT NULL DEFAULT FALSE",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_subcategories_category_slug ON subcategories(category_id, slug)",
        "CREATE INDEX IF NOT EXISTS idx_assets_owner_id ON assets(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_assets_status_created_at ON assets(status, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status)",
        "CREATE INDEX IF NOT EXISTS idx_post_tags_tag_id ON post_tags(tag_id)",
    ];

    for query in schema_updates {
        match db
            .execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await
        {
            Ok(_) => tracing::debug!("   - Executed schema update: {}", query),
            Err(e) => tracing::warn!("   - Schema update warning: {} -> {}", query, e),
        }
    }

    Ok(())
}
