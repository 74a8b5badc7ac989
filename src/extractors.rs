use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user, with the relation sets the
/// pages need to mark favorites, likes and follows.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
    /// Token of the session this request belongs to
    pub session_token: String,
    pub favorited_restaurant_ids: BTreeSet<i64>,
    pub liked_restaurant_ids: BTreeSet<i64>,
    pub following_ids: BTreeSet<i64>,
}

/// Extractor that requires authentication.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(parts, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthorized)?
            .to_string();

        let conn = state.db.get()?;
        let (id, name, is_admin): (i64, String, bool) = conn
            .query_row(
                "SELECT u.id, u.name, u.is_admin FROM sessions s \
                 JOIN users u ON u.id = s.user_id \
                 WHERE s.token = ?1 AND s.expires_at > datetime('now')",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|_| AppError::Unauthorized)?;

        Ok(CurrentUser {
            id,
            name,
            is_admin,
            session_token: token,
            favorited_restaurant_ids: id_set(
                &conn,
                "SELECT restaurant_id FROM favorites WHERE user_id = ?1",
                id,
            )?,
            liked_restaurant_ids: id_set(
                &conn,
                "SELECT restaurant_id FROM likes WHERE user_id = ?1",
                id,
            )?,
            following_ids: id_set(
                &conn,
                "SELECT following_id FROM followships WHERE follower_id = ?1",
                id,
            )?,
        })
    }
}

fn id_set(conn: &Connection, sql: &str, user_id: i64) -> Result<BTreeSet<i64>, AppError> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<Result<BTreeSet<i64>, _>>()?;
    Ok(ids)
}

fn extract_cookie<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
