use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_system::{config::Config, controllers, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting seat management API");

    let addr = SocketAddr::new(
        config
            .app
            .host
            .parse()
            .expect("HOST must be a valid IP address"),
        config.app.port,
    );

    let app_state = AppState::new(config)
        .await
        .expect("Failed to initialize application state");
    info!("Database connected, migrations applied");

    // Seed the default admin and the guaranteed seat minimums. Both are
    // no-ops on every startup after the first.
    seed_admin(&app_state).await;
    match app_state.registry.ensure_all_default_seats().await {
        Ok(0) => {}
        Ok(created) => info!("Seeded {} default seat records", created),
        Err(e) => tracing::error!("Failed to seed default seats: {:?}", e),
    }

    let app = Router::new()
        .route("/", get(|| async { "Seat Management API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api/admin", controllers::routes())
        .with_state(app_state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}

async fn seed_admin(state: &std::sync::Arc<AppState>) {
    match state.store.count_admins().await {
        Ok(0) => {
            let seed = &state.config.admin;
            let hash = match bcrypt::hash(&seed.password, bcrypt::DEFAULT_COST) {
                Ok(h) => h,
                Err(e) => {
                    tracing::error!("Failed to hash admin password: {:?}", e);
                    return;
                }
            };
            match state
                .store
                .insert_admin(&seed.username, &seed.email, &hash)
                .await
            {
                Ok(admin) => info!("Seeded default admin {}", admin.email),
                Err(e) => tracing::error!("Failed to seed default admin: {:?}", e),
            }
        }
        Ok(_) => {}
        Err(e) => tracing::error!("Failed to count admins: {:?}", e),
    }
}
