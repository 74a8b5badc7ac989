use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::{delete, post};
use axum::{Form, Router};
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

pub const MAX_COMMENT_CHARS: usize = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentForm {
    pub text: String,
    pub restaurant_id: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
}

fn validate_text(raw: &str) -> AppResult<String> {
    let text = raw.trim().to_string();
    if text.is_empty() {
        return Err(AppError::BadRequest("Comment text is required".into()));
    }
    if text.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(text)
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CreateCommentForm>,
) -> AppResult<Redirect> {
    let text = validate_text(&form.text)?;

    let conn = state.db.get()?;
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM restaurants WHERE id = ?1",
        params![form.restaurant_id],
        |r| r.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound);
    }

    conn.execute(
        "INSERT INTO comments (text, user_id, restaurant_id) VALUES (?1, ?2, ?3)",
        params![text, user.id, form.restaurant_id],
    )?;
    tracing::info!(
        user_id = user.id,
        restaurant_id = form.restaurant_id,
        "Comment posted"
    );

    Ok(Redirect::to(&format!("/restaurants/{}", form.restaurant_id)))
}

/// Authors may delete their own comments; admins may delete any.
async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let conn = state.db.get()?;

    let (owner_id, restaurant_id): (i64, i64) = conn
        .query_row(
            "SELECT user_id, restaurant_id FROM comments WHERE id = ?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or(AppError::NotFound)?;

    if owner_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized);
    }

    conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(Redirect::to(&format!("/restaurants/{}", restaurant_id)))
}
