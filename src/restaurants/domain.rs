// Aggregates returned by the query layer - plain data, no lazy relations
use serde::Serialize;
use std::collections::BTreeSet;

use crate::db::models::{Category, Restaurant, UserSummary};

/// A comment together with the user who wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub user: UserSummary,
}

/// Everything the restaurant detail page needs, loaded in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub category: Option<Category>,
    pub comments: Vec<CommentWithAuthor>,
    pub favorited_by: BTreeSet<i64>,
    pub liked_by: BTreeSet<i64>,
}

/// Flattened dashboard row: restaurant columns plus aggregate counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantDashboard {
    pub id: i64,
    pub name: String,
    pub tel: String,
    pub address: String,
    pub opening_hours: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub view_count: i64,
    pub category_name: Option<String>,
    pub comment_count: usize,
    pub favorited_count: usize,
}

impl From<RestaurantDetail> for RestaurantDashboard {
    fn from(detail: RestaurantDetail) -> Self {
        Self {
            id: detail.restaurant.id,
            name: detail.restaurant.name,
            tel: detail.restaurant.tel,
            address: detail.restaurant.address,
            opening_hours: detail.restaurant.opening_hours,
            description: detail.restaurant.description,
            image: detail.restaurant.image,
            view_count: detail.restaurant.view_count,
            category_name: detail.category.map(|c| c.name),
            comment_count: detail.comments.len(),
            favorited_count: detail.favorited_by.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantWithCategory {
    pub restaurant: Restaurant,
    pub category: Option<Category>,
}

/// Short reference to a restaurant, used where a comment points back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedComment {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub restaurant: RestaurantRef,
    pub user: UserSummary,
}

/// Latest restaurants and latest comments, fetched together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub restaurants: Vec<RestaurantWithCategory>,
    pub comments: Vec<FeedComment>,
}

/// Input row for the top list: a restaurant and the ids of users who favorited it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantWithFavorites {
    pub restaurant: Restaurant,
    pub favorited_by: BTreeSet<i64>,
}

/// One page of the browse list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantPage {
    pub restaurants: Vec<RestaurantWithCategory>,
    pub categories: Vec<Category>,
    pub category_id: Option<i64>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}
