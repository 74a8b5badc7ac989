// Repository pattern - every store read and write for restaurants goes through here
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

use crate::db::models::{Category, Restaurant, UserSummary, RESTAURANT_COLUMNS};
use crate::restaurants::domain::*;
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Restaurant with category, comments (with authors) and favorite/like id sets
    async fn find_detail(&self, id: i64) -> Result<Option<RestaurantDetail>, RepositoryError>;

    /// Most recently created restaurants, newest first
    async fn latest_restaurants(
        &self,
        limit: u32,
    ) -> Result<Vec<RestaurantWithCategory>, RepositoryError>;

    /// Most recently created comments with their restaurant and author, newest first
    async fn latest_comments(&self, limit: u32) -> Result<Vec<FeedComment>, RepositoryError>;

    /// Every restaurant with the ids of the users who favorited it
    async fn all_with_favorites(&self) -> Result<Vec<RestaurantWithFavorites>, RepositoryError>;

    /// One page of restaurants, optionally filtered by category, plus the filtered total
    async fn list_restaurants(
        &self,
        category_id: Option<i64>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<RestaurantWithCategory>, u64), RepositoryError>;

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Atomically add one to `view_count`, returning the new value
    async fn increment_view_count(&self, id: i64) -> Result<i64, RepositoryError>;
}

/// SQLite implementation
pub struct SqliteRestaurantRepository {
    pool: DbPool,
}

impl SqliteRestaurantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await?
    }
}

const RESTAURANT_WITH_CATEGORY_SELECT: &str =
    "SELECT r.id, r.name, r.tel, r.address, r.opening_hours, r.description, r.image, \
     r.view_count, r.category_id, r.created_at, c.id, c.name \
     FROM restaurants r LEFT JOIN categories c ON c.id = r.category_id";

fn restaurant_with_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<RestaurantWithCategory> {
    let restaurant = Restaurant::from_row(row, 0)?;
    let category = match row.get::<_, Option<i64>>(10)? {
        Some(id) => Some(Category {
            id,
            name: row.get(11)?,
        }),
        None => None,
    };
    Ok(RestaurantWithCategory {
        restaurant,
        category,
    })
}

fn user_id_set(conn: &Connection, sql: &str, restaurant_id: i64) -> rusqlite::Result<BTreeSet<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![restaurant_id], |row| row.get(0))?
        .collect::<Result<BTreeSet<i64>, _>>()?;
    Ok(ids)
}

#[async_trait]
impl RestaurantRepository for SqliteRestaurantRepository {
    async fn find_detail(&self, id: i64) -> Result<Option<RestaurantDetail>, RepositoryError> {
        self.with_conn(move |conn| {
            // One read transaction so the graph comes from a single snapshot
            let tx = conn.unchecked_transaction()?;

            let head = tx
                .query_row(
                    &format!("{} WHERE r.id = ?1", RESTAURANT_WITH_CATEGORY_SELECT),
                    params![id],
                    restaurant_with_category,
                )
                .optional()?;

            let Some(RestaurantWithCategory {
                restaurant,
                category,
            }) = head
            else {
                return Ok(None);
            };

            let mut stmt = tx.prepare(
                "SELECT c.id, c.text, c.created_at, u.id, u.name, u.image
                 FROM comments c
                 JOIN users u ON u.id = c.user_id
                 WHERE c.restaurant_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;
            let comments = stmt
                .query_map(params![id], |row| {
                    Ok(CommentWithAuthor {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        created_at: row.get(2)?,
                        user: UserSummary {
                            id: row.get(3)?,
                            name: row.get(4)?,
                            image: row.get(5)?,
                        },
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            drop(stmt);

            let favorited_by = user_id_set(
                &tx,
                "SELECT user_id FROM favorites WHERE restaurant_id = ?1",
                id,
            )?;
            let liked_by = user_id_set(
                &tx,
                "SELECT user_id FROM likes WHERE restaurant_id = ?1",
                id,
            )?;

            tx.commit()?;

            Ok(Some(RestaurantDetail {
                restaurant,
                category,
                comments,
                favorited_by,
                liked_by,
            }))
        })
        .await
    }

    async fn latest_restaurants(
        &self,
        limit: u32,
    ) -> Result<Vec<RestaurantWithCategory>, RepositoryError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY r.created_at DESC, r.id DESC LIMIT ?1",
                RESTAURANT_WITH_CATEGORY_SELECT
            ))?;
            let rows = stmt
                .query_map(params![limit], restaurant_with_category)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn latest_comments(&self, limit: u32) -> Result<Vec<FeedComment>, RepositoryError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.text, c.created_at, r.id, r.name, u.id, u.name, u.image
                 FROM comments c
                 JOIN restaurants r ON r.id = c.restaurant_id
                 JOIN users u ON u.id = c.user_id
                 ORDER BY c.created_at DESC, c.id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok(FeedComment {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        created_at: row.get(2)?,
                        restaurant: RestaurantRef {
                            id: row.get(3)?,
                            name: row.get(4)?,
                        },
                        user: UserSummary {
                            id: row.get(5)?,
                            name: row.get(6)?,
                            image: row.get(7)?,
                        },
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn all_with_favorites(&self) -> Result<Vec<RestaurantWithFavorites>, RepositoryError> {
        self.with_conn(|conn| {
            let mut favorites: HashMap<i64, BTreeSet<i64>> = HashMap::new();
            {
                let mut stmt = conn.prepare("SELECT restaurant_id, user_id FROM favorites")?;
                let pairs = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                for pair in pairs {
                    let (restaurant_id, user_id): (i64, i64) = pair?;
                    favorites.entry(restaurant_id).or_default().insert(user_id);
                }
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM restaurants r ORDER BY r.id",
                RESTAURANT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], |row| Restaurant::from_row(row, 0))?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|restaurant| RestaurantWithFavorites {
                    favorited_by: favorites.remove(&restaurant.id).unwrap_or_default(),
                    restaurant,
                })
                .collect();
            Ok(rows)
        })
        .await
    }

    async fn list_restaurants(
        &self,
        category_id: Option<i64>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<RestaurantWithCategory>, u64), RepositoryError> {
        self.with_conn(move |conn| {
            // NULL category means "all categories"
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM restaurants WHERE ?1 IS NULL OR category_id = ?1",
                params![category_id],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "{} WHERE ?1 IS NULL OR r.category_id = ?1
                 ORDER BY r.created_at DESC, r.id DESC LIMIT ?2 OFFSET ?3",
                RESTAURANT_WITH_CATEGORY_SELECT
            ))?;
            let rows = stmt
                .query_map(
                    params![category_id, limit, offset as i64],
                    restaurant_with_category,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((rows, total as u64))
        })
        .await
    }

    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn increment_view_count(&self, id: i64) -> Result<i64, RepositoryError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "UPDATE restaurants SET view_count = view_count + 1, updated_at = datetime('now')
                 WHERE id = ?1 RETURNING view_count",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound(format!("restaurant {}", id)))
        })
        .await
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynRestaurantRepository = Arc<dyn RestaurantRepository>;
