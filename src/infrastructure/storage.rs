use crate::services::storage::{S3StorageService, StorageService, UnconfiguredStorage};
use aws_sdk_s3::config::Region;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

struct S3Settings {
    endpoint_url: String,
    access_key: String,
    secret_key: String,
    bucket: String,
    region: String,
}

fn read_settings() -> Result<S3Settings, Vec<&'static str>> {
    let required = ["S3_ENDPOINT", "S3_ACCESS_KEY", "S3_SECRET_KEY", "S3_BUCKET"];
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|name| env::var(name).map(|v| v.trim().is_empty()).unwrap_or(true))
        .collect();

    if !missing.is_empty() {
        return Err(missing);
    }

    let var = |name: &str| env::var(name).unwrap_or_default();
    Ok(S3Settings {
        endpoint_url: var("S3_ENDPOINT"),
        access_key: var("S3_ACCESS_KEY"),
        secret_key: var("S3_SECRET_KEY"),
        bucket: var("S3_BUCKET"),
        region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
    })
}

/// Builds the object storage client. Missing credentials are tolerated: the
/// returned service reports itself unconfigured and asset calls fail with a
/// typed error instead of aborting startup.
pub async fn setup_storage() -> Arc<dyn StorageService> {
    let settings = match read_settings() {
        Ok(settings) => settings,
        Err(missing) => {
            warn!(
                "⚠️  Object storage unconfigured (missing: {}). Asset uploads are disabled.",
                missing.join(", ")
            );
            return Arc::new(UnconfiguredStorage);
        }
    };

    info!(
        "☁️  S3 Storage: {} (Bucket: {})",
        settings.endpoint_url, settings.bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&settings.endpoint_url)
        .region(Region::new(settings.region))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            settings.access_key,
            settings.secret_key,
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    let bucket = settings.bucket;

    // Ensure bucket exists
    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = s3_client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }

    Arc::new(S3StorageService::new(s3_client, bucket))
}
