use askama::Template;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Uri};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use rusqlite::{params, Connection};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::filters;
use crate::routes::home::Html;
use crate::state::AppState;
use crate::users::{self, TopUser, UserProfile};

#[derive(Template)]
#[template(path = "pages/top_users.html")]
pub struct TopUsersTemplate {
    pub viewer: String,
    pub viewer_id: i64,
    pub users: Vec<TopUser>,
}

#[derive(Template)]
#[template(path = "pages/user.html")]
pub struct UserTemplate {
    pub viewer: String,
    pub viewer_id: i64,
    pub is_followed: bool,
    pub profile: UserProfile,
}

/// Which user-to-restaurant set a request touches.
#[derive(Debug, Clone, Copy)]
enum Relation {
    Favorite,
    Like,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::Like => "likes",
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/favorite/{restaurant_id}",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/like/{restaurant_id}", post(add_like).delete(remove_like))
        .route(
            "/following/{user_id}",
            post(add_following).delete(remove_following),
        )
        .route("/users/top", get(top_users))
        .route("/users/{user_id}", get(user_page))
}

/// Send the browser back where the form was submitted from. Only
/// same-origin referers are followed; anything else goes to `fallback`.
fn back(headers: &HeaderMap, fallback: &str) -> Redirect {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| same_origin_path(referer, headers))
        .unwrap_or_else(|| fallback.to_string());
    Redirect::to(&target)
}

fn same_origin_path(referer: &str, headers: &HeaderMap) -> Option<String> {
    // "//host/..." is protocol-relative, not a local path
    if referer.starts_with("//") {
        return None;
    }
    if referer.starts_with('/') {
        return Some(referer.to_string());
    }

    let uri: Uri = referer.parse().ok()?;
    let host = headers.get(header::HOST)?.to_str().ok()?;
    if uri.authority()?.as_str() != host {
        return None;
    }
    uri.path_and_query().map(|pq| pq.as_str().to_string())
}

fn ensure_restaurant(conn: &Connection, id: i64) -> AppResult<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM restaurants WHERE id = ?1",
        params![id],
        |r| r.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

fn set_relation(
    state: &AppState,
    relation: Relation,
    user_id: i64,
    restaurant_id: i64,
    present: bool,
) -> AppResult<()> {
    let conn = state.db.get()?;
    ensure_restaurant(&conn, restaurant_id)?;

    // Set semantics: adding twice or removing a missing pair is a no-op
    let sql = if present {
        format!(
            "INSERT OR IGNORE INTO {} (user_id, restaurant_id) VALUES (?1, ?2)",
            relation.table()
        )
    } else {
        format!(
            "DELETE FROM {} WHERE user_id = ?1 AND restaurant_id = ?2",
            relation.table()
        )
    };
    conn.execute(&sql, params![user_id, restaurant_id])?;
    tracing::debug!(?relation, user_id, restaurant_id, present, "Updated relation");
    Ok(())
}

async fn add_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(restaurant_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    set_relation(&state, Relation::Favorite, user.id, restaurant_id, true)?;
    Ok(back(&headers, "/restaurants"))
}

async fn remove_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(restaurant_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    set_relation(&state, Relation::Favorite, user.id, restaurant_id, false)?;
    Ok(back(&headers, "/restaurants"))
}

async fn add_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(restaurant_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    set_relation(&state, Relation::Like, user.id, restaurant_id, true)?;
    Ok(back(&headers, "/restaurants"))
}

async fn remove_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(restaurant_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    set_relation(&state, Relation::Like, user.id, restaurant_id, false)?;
    Ok(back(&headers, "/restaurants"))
}

async fn add_following(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    if user_id == user.id {
        return Err(AppError::BadRequest("You cannot follow yourself".into()));
    }

    let conn = state.db.get()?;
    if !users::user_exists(&conn, user_id)? {
        return Err(AppError::NotFound);
    }
    conn.execute(
        "INSERT OR IGNORE INTO followships (follower_id, following_id) VALUES (?1, ?2)",
        params![user.id, user_id],
    )?;

    Ok(back(&headers, "/users/top"))
}

async fn remove_following(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;
    conn.execute(
        "DELETE FROM followships WHERE follower_id = ?1 AND following_id = ?2",
        params![user.id, user_id],
    )?;

    Ok(back(&headers, "/users/top"))
}

async fn top_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<TopUsersTemplate>> {
    let all = {
        let conn = state.db.get()?;
        users::fetch_users_with_followers(&conn)?
    };
    let ranked = users::to_top_users_view_model(all, Some(&user.following_ids));

    Ok(Html(TopUsersTemplate {
        viewer: user.name,
        viewer_id: user.id,
        users: ranked,
    }))
}

async fn user_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> AppResult<Html<UserTemplate>> {
    let profile = {
        let conn = state.db.get()?;
        users::fetch_profile(&conn, user_id)?
    }
    .ok_or(AppError::NotFound)?;

    Ok(Html(UserTemplate {
        is_followed: user.following_ids.contains(&user_id),
        viewer: user.name,
        viewer_id: user.id,
        profile,
    }))
}
