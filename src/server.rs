use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::{MemoryStore, PgStore, StudyStore};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .merge(public_routes())
        // Protected: one auth layer shared by every route below
        .merge(protected_routes(state.clone()));

    if let Some(dir) = state.config.server.static_dir.as_ref().filter(|d| d.is_dir()) {
        info!(dir = %dir.display(), "serving static client files");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, system};

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/api/users", post(auth::register))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{courses, covered_topics, users, weekly_topics};

    Router::new()
        .route(
            "/api/users/me",
            get(users::me_get).put(users::me_put).delete(users::me_delete),
        )
        .route(
            "/api/users/:id",
            get(users::get).put(users::put).delete(users::delete),
        )
        .route("/api/courses", get(courses::list).post(courses::create))
        .route(
            "/api/courses/:id",
            get(courses::get).put(courses::update).delete(courses::delete),
        )
        .route("/api/weeklyTopics", get(weekly_topics::list))
        // POST takes a course id; the other verbs take a weekly topic id
        .route(
            "/api/weeklyTopics/:id",
            post(weekly_topics::create)
                .put(weekly_topics::update)
                .patch(weekly_topics::update_status)
                .delete(weekly_topics::delete),
        )
        .route(
            "/api/weeklyTopics/:id/status",
            axum::routing::patch(weekly_topics::update_status),
        )
        .route(
            "/api/coveredTopics",
            get(covered_topics::list).post(covered_topics::upsert),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Pick the store backend: Postgres when a URL is configured, otherwise memory.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn StudyStore>> {
    match config.database.url {
        Some(_) => {
            let store = PgStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            store.migrate().await.context("failed to apply migrations")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Bind and serve until ctrl-c.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let store = build_store(&config).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let environment = config.environment;
    let state = AppState::new(config, store).context("invalid authentication configuration")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, ?environment, "study diary API listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
