pub mod assets;
pub mod comments;
pub mod filters;
pub mod home;
pub mod restaurants;
pub mod social;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// All page routes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(restaurants::router())
        .merge(comments::router())
        .merge(social::router())
        .fallback(home::index)
}
