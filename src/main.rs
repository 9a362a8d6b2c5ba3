use car_rental_backend::{
    build_router,
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    repository::{
        memory::{MemoryCarRepository, MemoryUserRepository},
        postgres::{PgCarRepository, PgUserRepository},
        CarRepository, UserRepository,
    },
    services::media_service::media_store_from_config,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    init_config()?;
    let config = get_config();

    let (users, cars): (Arc<dyn UserRepository>, Arc<dyn CarRepository>) =
        match config.database_url.as_deref() {
            Some(url) => {
                let pool = create_pool(url).await?;
                run_migrations(&pool).await?;
                info!("Connected to PostgreSQL");
                (
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgCarRepository::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
                (
                    Arc::new(MemoryUserRepository::new()),
                    Arc::new(MemoryCarRepository::new()),
                )
            }
        };

    let media = media_store_from_config(config);
    let state = AppState::new(Arc::new(config.clone()), users, cars, media);

    info!("Serving uploads from: {}", config.uploads_dir);
    let app = build_router(state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
