use crate::restaurants::domain::*;
use crate::restaurants::repository::{RepositoryError, RestaurantRepository};

/// How many restaurants and comments the feed shows.
pub const FEED_LIMIT: u32 = 10;

/// Restaurants per page on the browse list.
pub const PER_PAGE: u32 = 9;

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound(format!("Restaurant {} doesn't exist", id))
}

pub async fn fetch_restaurant_detail(
    repo: &dyn RestaurantRepository,
    id: i64,
) -> Result<RestaurantDetail, RepositoryError> {
    repo.find_detail(id).await?.ok_or_else(|| not_found(id))
}

pub async fn fetch_dashboard(
    repo: &dyn RestaurantRepository,
    id: i64,
) -> Result<RestaurantDashboard, RepositoryError> {
    fetch_restaurant_detail(repo, id)
        .await
        .map(RestaurantDashboard::from)
}

/// Both reads run concurrently; the feed is all or nothing.
pub async fn fetch_feed(repo: &dyn RestaurantRepository) -> Result<Feed, RepositoryError> {
    let (restaurants, comments) = tokio::try_join!(
        repo.latest_restaurants(FEED_LIMIT),
        repo.latest_comments(FEED_LIMIT),
    )?;

    Ok(Feed {
        restaurants,
        comments,
    })
}

pub async fn fetch_all_for_ranking(
    repo: &dyn RestaurantRepository,
) -> Result<Vec<RestaurantWithFavorites>, RepositoryError> {
    repo.all_with_favorites().await
}

/// Browse list page. Pages are 1-based; page 0 is treated as page 1.
pub async fn fetch_restaurant_page(
    repo: &dyn RestaurantRepository,
    category_id: Option<i64>,
    page: u32,
) -> Result<RestaurantPage, RepositoryError> {
    let page = page.max(1);
    let offset = u64::from(page - 1) * u64::from(PER_PAGE);

    let ((restaurants, total), categories) = tokio::try_join!(
        repo.list_restaurants(category_id, PER_PAGE, offset),
        repo.categories(),
    )?;

    Ok(RestaurantPage {
        restaurants,
        categories,
        category_id,
        page,
        per_page: PER_PAGE,
        total,
    })
}
