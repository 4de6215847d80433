use clap::{Parser, ValueEnum};
use cms_admin_backend::config::AppConfig;
use cms_admin_backend::infrastructure::{database, storage};
use cms_admin_backend::services::asset_service::AssetService;
use cms_admin_backend::services::worker::BackgroundWorker;
use cms_admin_backend::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Api,
    Worker,
    All,
}

impl Mode {
    fn runs_api(self) -> bool {
        matches!(self, Mode::Api | Mode::All)
    }

    fn runs_worker(self) -> bool {
        matches!(self, Mode::Worker | Mode::All)
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service type to run
    #[arg(short, long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Refuse insecure defaults (requires JWT_SECRET and explicit CORS origins)
    #[arg(long)]
    production: bool,

    /// Short pending TTL and frequent collection for local work
    #[arg(long, conflicts_with = "production")]
    development: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cms_admin_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting CMS admin backend [Mode: {:?}]...", args.mode);

    let config = if args.production {
        AppConfig::production()?
    } else if args.development {
        AppConfig::development()
    } else {
        AppConfig::from_env()?
    };
    if config.jwt_secret == AppConfig::default().jwt_secret {
        warn!("⚠️  JWT_SECRET is not set, using the development default");
    }
    info!(
        "🛡️  Config: Max Size={}MB, Batch={} files, Presign expiry={}s, Pending TTL={}s",
        config.max_file_size / 1024 / 1024,
        config.max_batch_files,
        config.presign_expiry_secs,
        config.pending_asset_ttl_secs
    );

    let db = database::setup_database().await?;
    let storage_service = storage::setup_storage().await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut handles = Vec::new();

    if args.mode.runs_worker() {
        let assets = Arc::new(AssetService::new(
            db.clone(),
            storage_service.clone(),
            config.clone(),
        ));
        let worker = BackgroundWorker::new(
            assets,
            Duration::from_secs(config.gc_interval_secs),
            config.pending_asset_ttl(),
            shutdown_rx.clone(),
        );
        handles.push(tokio::spawn(worker.run()));
        info!("👷 Pending asset collector initialized.");
    }

    if args.mode.runs_api() {
        let state = AppState::new(db.clone(), storage_service.clone(), config.clone());

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            );

        let app = create_app(state).layer(trace_layer);
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
        info!(
            "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
            args.port
        );

        let mut server_shutdown = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.changed().await;
                })
                .await
            {
                error!("❌ Server runtime error: {}", e);
            }
        }));
    }

    shutdown_signal().await;
    info!("🛑 Shutting down backend services...");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        if let Err(e) = handle.await {
            error!("Service task ended abnormally: {}", e);
        }
    }

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
