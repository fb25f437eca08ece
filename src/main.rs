use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use figbox_backend::config;
use figbox_backend::db;
use figbox_backend::search::SearchService;
use figbox_backend::state::AppState;
use figbox_backend::store::SqliteFigureStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "figbox_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("figbox-backend v{} (built {})", env!("CARGO_PKG_VERSION"), env!("BUILD_TIME"));

    // Load configuration / 加载配置
    let mut app_config = config::load_config().map_err(anyhow::Error::msg)?;
    app_config.apply_env_overrides();
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    // Search backend is fixed for the lifetime of the process / 搜索后端在启动时确定
    let store = Arc::new(SqliteFigureStore::new(pool.clone()));
    let search = SearchService::from_config(&app_config.search, store)?;

    let state = Arc::new(AppState::new(pool, search));
    let app = figbox_backend::api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await?;
    
    tracing::info!("Server running at http://{}", bind_addr);
    
    axum::serve(listener, app).await?;

    Ok(())
}
