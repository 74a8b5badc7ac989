// User profiles and users ranked by follower count
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::db::models::UserSummary;

pub const TOP_USERS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithFollowers {
    pub user: UserSummary,
    pub follower_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUser {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub follower_count: usize,
    pub is_followed: bool,
}

/// Restaurant as listed on a profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRestaurant {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileComment {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub restaurant: ProfileRestaurant,
}

/// Everything the profile page shows for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user: UserSummary,
    pub comments: Vec<ProfileComment>,
    pub favorited_restaurants: Vec<ProfileRestaurant>,
    pub followers: Vec<UserSummary>,
    pub followings: Vec<UserSummary>,
}

fn user_summaries(conn: &Connection, sql: &str, user_id: i64) -> rusqlite::Result<Vec<UserSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let users = stmt
        .query_map(params![user_id], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                image: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Profile for `id`, or `None` when no such user exists. Comments are newest
/// first; relations are in the order they were created.
pub fn fetch_profile(conn: &Connection, id: i64) -> rusqlite::Result<Option<UserProfile>> {
    let tx = conn.unchecked_transaction()?;

    let user = tx
        .query_row(
            "SELECT id, name, image FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    image: row.get(2)?,
                })
            },
        )
        .optional()?;
    let Some(user) = user else {
        return Ok(None);
    };

    let comments = {
        let mut stmt = tx.prepare(
            "SELECT c.id, c.text, c.created_at, r.id, r.name, r.image
             FROM comments c
             JOIN restaurants r ON r.id = c.restaurant_id
             WHERE c.user_id = ?1
             ORDER BY c.created_at DESC, c.id DESC",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok(ProfileComment {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    created_at: row.get(2)?,
                    restaurant: ProfileRestaurant {
                        id: row.get(3)?,
                        name: row.get(4)?,
                        image: row.get(5)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let favorited_restaurants = {
        let mut stmt = tx.prepare(
            "SELECT r.id, r.name, r.image
             FROM favorites f
             JOIN restaurants r ON r.id = f.restaurant_id
             WHERE f.user_id = ?1
             ORDER BY f.created_at, r.id",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok(ProfileRestaurant {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    image: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let followers = user_summaries(
        &tx,
        "SELECT u.id, u.name, u.image FROM followships f
         JOIN users u ON u.id = f.follower_id
         WHERE f.following_id = ?1
         ORDER BY f.created_at, u.id",
        id,
    )?;
    let followings = user_summaries(
        &tx,
        "SELECT u.id, u.name, u.image FROM followships f
         JOIN users u ON u.id = f.following_id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at, u.id",
        id,
    )?;

    tx.commit()?;

    Ok(Some(UserProfile {
        user,
        comments,
        favorited_restaurants,
        followers,
        followings,
    }))
}

pub fn fetch_users_with_followers(conn: &Connection) -> rusqlite::Result<Vec<UserWithFollowers>> {
    let mut followers: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    {
        let mut stmt = conn.prepare("SELECT following_id, follower_id FROM followships")?;
        let pairs = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        for pair in pairs {
            let (following_id, follower_id): (i64, i64) = pair?;
            followers.entry(following_id).or_default().insert(follower_id);
        }
    }

    let mut stmt = conn.prepare("SELECT id, name, image FROM users ORDER BY id")?;
    let users = stmt
        .query_map([], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                image: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|user| UserWithFollowers {
            follower_ids: followers.remove(&user.id).unwrap_or_default(),
            user,
        })
        .collect();

    Ok(users)
}

pub fn user_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
}

/// Most-followed users first, ties in input order, at most [`TOP_USERS_LIMIT`].
pub fn to_top_users_view_model(
    users: Vec<UserWithFollowers>,
    viewer_following_ids: Option<&BTreeSet<i64>>,
) -> Vec<TopUser> {
    let mut ranked: Vec<TopUser> = users
        .into_iter()
        .map(|u| TopUser {
            is_followed: viewer_following_ids.is_some_and(|ids| ids.contains(&u.user.id)),
            follower_count: u.follower_ids.len(),
            id: u.user.id,
            name: u.user.name,
            image: u.user.image,
        })
        .collect();

    ranked.sort_by(|a, b| b.follower_count.cmp(&a.follower_count));
    ranked.truncate(TOP_USERS_LIMIT);
    ranked
}
