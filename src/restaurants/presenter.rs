// View-models handed to templates. Pure functions, never touch the store.
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::db::models::{Category, Restaurant};
use crate::restaurants::domain::*;

/// Descriptions on list pages are cut to this many characters.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 50;

/// Size of the top list.
pub const TOP_LIMIT: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewModelError {
    #[error("Restaurant {restaurant_id} is missing {field}")]
    MissingField {
        restaurant_id: i64,
        field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailViewModel {
    pub restaurant: RestaurantDetail,
    pub is_favorited: bool,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopRestaurant {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub description: String,
    pub favorited_count: usize,
    pub is_favorited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedRestaurant {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub category_name: Option<String>,
    pub description: String,
    pub is_favorited: bool,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub pages: Vec<u32>,
    pub total_pages: u32,
    pub current_page: u32,
    pub prev: u32,
    pub next: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantListView {
    pub restaurants: Vec<ListedRestaurant>,
    pub categories: Vec<Category>,
    pub category_id: Option<i64>,
    pub pagination: Pagination,
}

impl Pagination {
    pub fn is_current(&self, page: &u32) -> bool {
        *page == self.current_page
    }
}

impl RestaurantListView {
    pub fn is_selected(&self, category_id: &i64) -> bool {
        self.category_id == Some(*category_id)
    }

    /// Query-string tail that keeps the category filter across page links.
    pub fn category_query(&self) -> String {
        self.category_id
            .map(|id| format!("&categoryId={}", id))
            .unwrap_or_default()
    }
}

/// First [`DESCRIPTION_PREVIEW_CHARS`] characters, no ellipsis.
pub fn truncate_description(description: &str) -> String {
    description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect()
}

fn preview(restaurant: &Restaurant) -> Result<String, ViewModelError> {
    restaurant
        .description
        .as_deref()
        .map(truncate_description)
        .ok_or(ViewModelError::MissingField {
            restaurant_id: restaurant.id,
            field: "description",
        })
}

fn contains(set: Option<&BTreeSet<i64>>, id: i64) -> bool {
    set.is_some_and(|s| s.contains(&id))
}

pub fn to_detail_view_model(detail: RestaurantDetail, viewer_id: Option<i64>) -> DetailViewModel {
    let is_favorited = viewer_id.is_some_and(|id| detail.favorited_by.contains(&id));
    let is_liked = viewer_id.is_some_and(|id| detail.liked_by.contains(&id));

    DetailViewModel {
        restaurant: detail,
        is_favorited,
        is_liked,
    }
}

/// Ranks restaurants by how many users favorited them.
///
/// `is_favorited` comes from the viewer's own favorite set, not from the
/// restaurant's. Ties keep their input order.
pub fn to_top_restaurants_view_model(
    restaurants: Vec<RestaurantWithFavorites>,
    viewer_favorite_ids: Option<&BTreeSet<i64>>,
) -> Result<Vec<TopRestaurant>, ViewModelError> {
    let mut ranked = restaurants
        .into_iter()
        .map(|r| {
            Ok(TopRestaurant {
                description: preview(&r.restaurant)?,
                favorited_count: r.favorited_by.len(),
                is_favorited: contains(viewer_favorite_ids, r.restaurant.id),
                id: r.restaurant.id,
                name: r.restaurant.name,
                image: r.restaurant.image,
            })
        })
        .collect::<Result<Vec<_>, ViewModelError>>()?;

    ranked.sort_by(|a, b| b.favorited_count.cmp(&a.favorited_count));
    ranked.truncate(TOP_LIMIT);
    Ok(ranked)
}

pub fn paginate(page: u32, per_page: u32, total: u64) -> Pagination {
    let per_page = u64::from(per_page.max(1));
    let total_pages = (total.div_ceil(per_page)).max(1) as u32;
    let current_page = page.clamp(1, total_pages);

    Pagination {
        pages: (1..=total_pages).collect(),
        total_pages,
        current_page,
        prev: current_page.saturating_sub(1).max(1),
        next: (current_page + 1).min(total_pages),
    }
}

pub fn to_restaurant_list_view_model(
    page: RestaurantPage,
    viewer_favorite_ids: Option<&BTreeSet<i64>>,
    viewer_like_ids: Option<&BTreeSet<i64>>,
) -> Result<RestaurantListView, ViewModelError> {
    let restaurants = page
        .restaurants
        .into_iter()
        .map(|RestaurantWithCategory { restaurant, category }| {
            Ok(ListedRestaurant {
                description: preview(&restaurant)?,
                is_favorited: contains(viewer_favorite_ids, restaurant.id),
                is_liked: contains(viewer_like_ids, restaurant.id),
                category_name: category.map(|c| c.name),
                id: restaurant.id,
                name: restaurant.name,
                image: restaurant.image,
            })
        })
        .collect::<Result<Vec<_>, ViewModelError>>()?;

    Ok(RestaurantListView {
        restaurants,
        categories: page.categories,
        category_id: page.category_id,
        pagination: paginate(page.page, page.per_page, page.total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(id: i64, description: Option<&str>) -> Restaurant {
        Restaurant {
            id,
            name: format!("Restaurant {}", id),
            tel: String::new(),
            address: String::new(),
            opening_hours: String::new(),
            description: description.map(str::to_string),
            image: None,
            view_count: 0,
            category_id: None,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    fn with_favorites(id: i64, count: i64) -> RestaurantWithFavorites {
        RestaurantWithFavorites {
            restaurant: restaurant(id, Some("tasty")),
            favorited_by: (100..100 + count).collect(),
        }
    }

    fn detail(favorited_by: &[i64], liked_by: &[i64]) -> RestaurantDetail {
        RestaurantDetail {
            restaurant: restaurant(1, Some("tasty")),
            category: None,
            comments: vec![],
            favorited_by: favorited_by.iter().copied().collect(),
            liked_by: liked_by.iter().copied().collect(),
        }
    }

    #[test]
    fn long_description_is_cut_to_fifty_chars() {
        let text = "x".repeat(120);
        assert_eq!(truncate_description(&text).chars().count(), 50);
    }

    #[test]
    fn short_description_is_unchanged() {
        let text = "y".repeat(30);
        assert_eq!(truncate_description(&text), text);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(60);
        let cut = truncate_description(&text);
        assert_eq!(cut.chars().count(), 50);
        assert_eq!(cut, "é".repeat(50));
    }

    #[test]
    fn detail_flags_follow_viewer_membership() {
        let vm = to_detail_view_model(detail(&[7], &[8]), Some(7));
        assert!(vm.is_favorited);
        assert!(!vm.is_liked);

        let vm = to_detail_view_model(detail(&[7], &[8]), Some(8));
        assert!(!vm.is_favorited);
        assert!(vm.is_liked);
    }

    #[test]
    fn anonymous_viewer_has_no_flags() {
        let vm = to_detail_view_model(detail(&[7], &[7]), None);
        assert!(!vm.is_favorited);
        assert!(!vm.is_liked);
    }

    #[test]
    fn top_list_sorts_by_favorite_count_descending() {
        let input = [3, 9, 1, 9, 5]
            .iter()
            .enumerate()
            .map(|(i, &count)| with_favorites(i as i64 + 1, count))
            .collect();

        let top = to_top_restaurants_view_model(input, None).unwrap();
        let counts: Vec<usize> = top.iter().map(|r| r.favorited_count).collect();
        assert_eq!(counts, vec![9, 9, 5, 3, 1]);
        // stable on ties
        assert_eq!(top[0].id, 2);
        assert_eq!(top[1].id, 4);
    }

    #[test]
    fn top_list_keeps_only_ten_highest() {
        let input = (1..=15).map(|id| with_favorites(id, id)).collect();

        let top = to_top_restaurants_view_model(input, None).unwrap();
        assert_eq!(top.len(), 10);
        let lowest_kept = top.iter().map(|r| r.favorited_count).min().unwrap();
        assert_eq!(lowest_kept, 6);
    }

    #[test]
    fn top_list_marks_viewer_favorites() {
        let input = vec![with_favorites(1, 2), with_favorites(2, 1)];
        let mine = BTreeSet::from([2]);

        let top = to_top_restaurants_view_model(input, Some(&mine)).unwrap();
        assert!(!top[0].is_favorited);
        assert!(top[1].is_favorited);
    }

    #[test]
    fn top_list_truncates_descriptions() {
        let mut r = with_favorites(1, 0);
        r.restaurant.description = Some("z".repeat(120));

        let top = to_top_restaurants_view_model(vec![r], None).unwrap();
        assert_eq!(top[0].description.len(), 50);
    }

    #[test]
    fn missing_description_is_a_view_model_error() {
        let r = RestaurantWithFavorites {
            restaurant: restaurant(4, None),
            favorited_by: BTreeSet::new(),
        };

        let err = to_top_restaurants_view_model(vec![r], None).unwrap_err();
        assert_eq!(
            err,
            ViewModelError::MissingField {
                restaurant_id: 4,
                field: "description"
            }
        );
    }

    #[test]
    fn paginate_clamps_and_links_neighbours() {
        let p = paginate(2, 9, 20);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.pages, vec![1, 2, 3]);
        assert_eq!((p.prev, p.current_page, p.next), (1, 2, 3));

        let p = paginate(99, 9, 20);
        assert_eq!(p.current_page, 3);
        assert_eq!(p.next, 3);

        let p = paginate(1, 9, 0);
        assert_eq!(p.total_pages, 1);
        assert_eq!((p.prev, p.next), (1, 1));
        assert!(p.is_current(&1));
        assert!(!p.is_current(&2));
    }

    #[test]
    fn list_view_marks_favorites_and_likes() {
        let page = RestaurantPage {
            restaurants: vec![
                RestaurantWithCategory {
                    restaurant: restaurant(1, Some("a")),
                    category: Some(Category {
                        id: 1,
                        name: "Ramen".into(),
                    }),
                },
                RestaurantWithCategory {
                    restaurant: restaurant(2, Some("b")),
                    category: None,
                },
            ],
            categories: vec![],
            category_id: None,
            page: 1,
            per_page: 9,
            total: 2,
        };
        let favs = BTreeSet::from([1]);
        let likes = BTreeSet::from([2]);

        let view = to_restaurant_list_view_model(page, Some(&favs), Some(&likes)).unwrap();
        assert!(view.restaurants[0].is_favorited);
        assert!(!view.restaurants[0].is_liked);
        assert_eq!(view.restaurants[0].category_name.as_deref(), Some("Ramen"));
        assert!(view.restaurants[1].is_liked);
        assert_eq!(view.pagination.total_pages, 1);
        assert_eq!(view.category_query(), "");
    }

    #[test]
    fn list_view_carries_category_filter() {
        let page = RestaurantPage {
            restaurants: vec![],
            categories: vec![Category {
                id: 3,
                name: "Thai".into(),
            }],
            category_id: Some(3),
            page: 1,
            per_page: 9,
            total: 0,
        };

        let view = to_restaurant_list_view_model(page, None, None).unwrap();
        assert!(view.is_selected(&3));
        assert!(!view.is_selected(&4));
        assert_eq!(view.category_query(), "&categoryId=3");
    }
}
