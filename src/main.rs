use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use rusqlite::params;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use forkful::auth::session;
use forkful::config::{Cli, Command, Config};
use forkful::error::{AppError, AppResult};
use forkful::state::AppState;
use forkful::{db, routes, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    if cli.command == Some(Command::Seed) {
        let report = seed::run(&pool)?;
        println!(
            "Seeded {} categories, {} users, {} restaurants, {} comments",
            report.categories, report.users, report.restaurants, report.comments
        );
        return Ok(());
    }

    let state = AppState::new(pool, config.clone());

    let mut app = routes::router();

    // Test-only seed endpoint: creates a user + session, returns session cookie
    if std::env::var("FORKFUL_TEST_SEED").is_ok() {
        tracing::warn!("FORKFUL_TEST_SEED is set, mounting /test/seed");
        app = app.route("/test/seed", get(test_seed));
    }

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Test-only: seed a user + session and return the session cookie.
/// Only mounted when FORKFUL_TEST_SEED env var is set.
async fn test_seed(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;
    let hash = bcrypt::hash(seed::DEFAULT_PASSWORD, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    conn.execute(
        "INSERT OR IGNORE INTO users (name, email, password_hash) VALUES ('testuser', 'test@example.com', ?1)",
        params![hash],
    )?;

    let user_id: i64 = conn.query_row(
        "SELECT id FROM users WHERE email = 'test@example.com'",
        [],
        |r| r.get(0),
    )?;

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, user_id, hours)?;

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        state.config.auth.cookie_name,
        token,
        hours * 3600
    );
    let body = serde_json::to_string(&serde_json::json!({
        "user_id": user_id,
        "name": "testuser",
    }))?;

    Ok(([(header::SET_COOKIE, cookie)], body))
}
