use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use homefinder_api::auth::{self, AppState, AppStateInner};
use homefinder_api::messages;
use homefinder_api::middleware::{require_auth, require_owner};
use homefinder_api::properties;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homefinder=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("HOMEFINDER_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("HOMEFINDER_DB_PATH").unwrap_or_else(|_| "homefinder.db".into());
    let host = std::env::var("HOMEFINDER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("HOMEFINDER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = homefinder_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/properties", get(properties::search_properties))
        .route("/properties/{id}", get(properties::get_property));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/users/{id}", patch(auth::update_profile))
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/mark-as-read", post(messages::mark_as_read))
        .route(
            "/messages/conversation/{user_id}/{property_id}",
            get(messages::get_conversation).delete(messages::delete_conversation),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Owner-only: role guard runs inside the auth layer.
    let owner_routes = Router::new()
        .route("/my-properties", get(properties::my_properties))
        .route("/properties", post(properties::create_property))
        .route(
            "/properties/{id}",
            put(properties::update_property).delete(properties::delete_property),
        )
        .layer(middleware::from_fn(require_owner))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(owner_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("HomeFinder server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
