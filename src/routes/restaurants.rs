use askama::Template;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::session;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::restaurants::domain::{Feed, RestaurantDashboard};
use crate::restaurants::presenter::{self, DetailViewModel, RestaurantListView, TopRestaurant};
use crate::restaurants::query;
use crate::restaurants::view_count::{self, SeenFlag};
use crate::routes::filters;
use crate::routes::home::Html;
use crate::state::AppState;

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/restaurants.html")]
pub struct RestaurantsTemplate {
    pub viewer: String,
    pub view: RestaurantListView,
}

#[derive(Template)]
#[template(path = "pages/restaurant.html")]
pub struct RestaurantTemplate {
    pub viewer: String,
    pub viewer_id: i64,
    pub viewer_is_admin: bool,
    pub view: DetailViewModel,
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub viewer: String,
    pub restaurant: RestaurantDashboard,
}

#[derive(Template)]
#[template(path = "pages/feeds.html")]
pub struct FeedsTemplate {
    pub viewer: String,
    pub feed: Feed,
}

#[derive(Template)]
#[template(path = "pages/top_restaurants.html")]
pub struct TopRestaurantsTemplate {
    pub viewer: String,
    pub restaurants: Vec<TopRestaurant>,
}

// --- Query strings ---

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category_id: Option<i64>,
    pub page: Option<u32>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_page))
        .route("/restaurants/feeds", get(feeds_page))
        .route("/restaurants/top", get(top_page))
        .route("/restaurants/{id}", get(detail_page))
        .route("/restaurants/{id}/dashboard", get(dashboard_page))
}

// --- Handlers ---

async fn list_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListQuery>,
) -> AppResult<Html<RestaurantsTemplate>> {
    let page = query::fetch_restaurant_page(
        state.restaurants.as_ref(),
        params.category_id,
        params.page.unwrap_or(1),
    )
    .await?;

    let view = presenter::to_restaurant_list_view_model(
        page,
        Some(&user.favorited_restaurant_ids),
        Some(&user.liked_restaurant_ids),
    )?;

    Ok(Html(RestaurantsTemplate {
        viewer: user.name,
        view,
    }))
}

async fn detail_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Html<RestaurantTemplate>> {
    let repo = state.restaurants.as_ref();
    let detail = query::fetch_restaurant_detail(repo, id).await?;

    let flag = view_count::flag_name(state.config.views.scope, id);
    let seen = SeenFlag(session::get_flag(&state.db, &user.session_token, &flag)?);
    let (now_seen, detail) = view_count::track_view(repo, seen, detail).await?;
    if now_seen != seen {
        session::set_flag(&state.db, &user.session_token, &flag, now_seen.is_set())?;
    }

    Ok(Html(RestaurantTemplate {
        view: presenter::to_detail_view_model(detail, Some(user.id)),
        viewer: user.name,
        viewer_id: user.id,
        viewer_is_admin: user.is_admin,
    }))
}

async fn dashboard_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Html<DashboardTemplate>> {
    let restaurant = query::fetch_dashboard(state.restaurants.as_ref(), id).await?;

    Ok(Html(DashboardTemplate {
        viewer: user.name,
        restaurant,
    }))
}

async fn feeds_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<FeedsTemplate>> {
    let feed = query::fetch_feed(state.restaurants.as_ref()).await?;

    Ok(Html(FeedsTemplate {
        viewer: user.name,
        feed,
    }))
}

async fn top_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<TopRestaurantsTemplate>> {
    let all = query::fetch_all_for_ranking(state.restaurants.as_ref()).await?;
    let restaurants =
        presenter::to_top_restaurants_view_model(all, Some(&user.favorited_restaurant_ids))?;

    Ok(Html(TopRestaurantsTemplate {
        viewer: user.name,
        restaurants,
    }))
}
