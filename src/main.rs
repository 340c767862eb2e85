use axum::{extract::Extension, routing::get, routing::post, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use catnip_api::{config, db, handlers, middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, CATNIP_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Catnip API in {:?} mode", config.environment);

    let pool = db::connect().await?;
    db::migrate(&pool).await?;

    let app = app(pool);

    // Allow tests or deployments to override port via env
    let port = std::env::var("CATNIP_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Catnip API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(pool: PgPool) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(cat_routes())
        .merge(user_routes())
        .merge(achievement_routes())
        // Global middleware
        .layer(axum::middleware::from_fn(middleware::identify_principal))
        .layer(Extension(pool))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/token", post(auth::token))
}

fn cat_routes() -> Router {
    use handlers::cats;

    Router::new()
        .route("/api/cats", get(cats::list).post(cats::create))
        .route(
            "/api/cats/:id",
            get(cats::retrieve)
                .put(cats::update)
                .patch(cats::partial_update)
                .delete(cats::destroy),
        )
}

fn user_routes() -> Router {
    use handlers::users;

    // Read-only resource: GET routes only
    Router::new()
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::retrieve))
}

fn achievement_routes() -> Router {
    use handlers::achievements;

    Router::new()
        .route(
            "/api/achievements",
            get(achievements::list).post(achievements::create),
        )
        .route(
            "/api/achievements/:id",
            get(achievements::retrieve)
                .put(achievements::update)
                .patch(achievements::update)
                .delete(achievements::destroy),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Catnip API",
            "version": version,
            "description": "Pet catalog REST API with owner-based access control",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/signup, /auth/token (public - token acquisition)",
                "cats": "/api/cats[/:id] (reads public, writes owner-only)",
                "users": "/api/users[/:id] (read-only)",
                "achievements": "/api/achievements[/:id] (open)",
            }
        }
    }))
}

async fn health(Extension(pool): Extension<PgPool>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match db::health_check(&pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
