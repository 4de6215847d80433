use std::env;

/// Runtime configuration for the admin backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum size of a single asset in bytes (default: 512 MB)
    pub max_file_size: u64,

    /// Maximum number of files accepted by one presign batch (default: 50)
    pub max_batch_files: usize,

    /// Lifetime of presigned upload URLs in seconds (default: 900)
    pub presign_expiry_secs: u64,

    /// How long an unconfirmed asset survives once its upload URL has
    /// expired (default: 1 hour). Never shorter than `presign_expiry_secs`.
    pub pending_asset_ttl_secs: u64,

    /// Interval between pending-asset collection runs (default: 5 minutes)
    pub gc_interval_secs: u64,

    /// Rows fetched per page by the pending-asset collector (default: 500)
    pub gc_batch_size: u64,

    /// JWT Secret Key (Required in production)
    pub jwt_secret: String,

    /// Lifetime of issued tokens in hours (default: 24)
    pub jwt_ttl_hours: i64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 512 * 1024 * 1024, // 512 MB
            max_batch_files: 50,
            presign_expiry_secs: 15 * 60,
            pending_asset_ttl_secs: 60 * 60,
            gc_interval_secs: 5 * 60,
            gc_batch_size: 500,
            jwt_secret: "secret".to_string(),
            jwt_ttl_hours: 24,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let default = Self::default();

        let config = Self {
            max_file_size: parse_var("MAX_FILE_SIZE", default.max_file_size),
            max_batch_files: parse_var("MAX_BATCH_FILES", default.max_batch_files),
            presign_expiry_secs: parse_var("PRESIGN_EXPIRY_SECS", default.presign_expiry_secs),
            pending_asset_ttl_secs: parse_var(
                "PENDING_ASSET_TTL_SECS",
                default.pending_asset_ttl_secs,
            ),
            gc_interval_secs: parse_var("GC_INTERVAL_SECS", default.gc_interval_secs),
            gc_batch_size: parse_var("GC_BATCH_SIZE", default.gc_batch_size),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Dev fallback, production() refuses it
            jwt_ttl_hours: parse_var("JWT_TTL_HOURS", default.jwt_ttl_hours),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        };
        config.validate()?;
        Ok(config)
    }

    /// Short-lived pending rows and frequent collection for local work
    pub fn development() -> Self {
        Self {
            pending_asset_ttl_secs: 15 * 60,
            gc_interval_secs: 60,
            ..Self::default()
        }
    }

    /// Environment-driven config that refuses to start without a real JWT secret
    pub fn production() -> anyhow::Result<Self> {
        let config = Self::from_env()?;
        if env::var("JWT_SECRET").is_err() {
            anyhow::bail!("CRITICAL: JWT_SECRET must be set");
        }
        if config.allowed_origins.iter().any(|o| o == "*") {
            anyhow::bail!("Wildcard CORS origin is not allowed in production");
        }
        Ok(config)
    }

    /// A pending row must outlive every upload URL issued for it, otherwise
    /// a late PUT lands an object that no record points to.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pending_asset_ttl_secs < self.presign_expiry_secs {
            anyhow::bail!(
                "PENDING_ASSET_TTL_SECS ({}) must be at least PRESIGN_EXPIRY_SECS ({})",
                self.pending_asset_ttl_secs,
                self.presign_expiry_secs
            );
        }
        if self.gc_batch_size == 0 {
            anyhow::bail!("GC_BATCH_SIZE must be greater than zero");
        }
        Ok(())
    }

    pub fn presign_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.presign_expiry_secs)
    }

    pub fn pending_asset_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pending_asset_ttl_secs)
    }
}
