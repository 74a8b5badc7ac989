use crate::config::ViewScope;
use crate::restaurants::domain::RestaurantDetail;
use crate::restaurants::repository::{RepositoryError, RestaurantRepository};

/// Session flag recording that a detail view was already counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeenFlag(pub bool);

impl SeenFlag {
    pub fn is_set(self) -> bool {
        self.0
    }
}

/// Name of the session flag consulted for `restaurant_id`.
pub fn flag_name(scope: ViewScope, restaurant_id: i64) -> String {
    match scope {
        ViewScope::Session => "views".to_string(),
        ViewScope::Restaurant => format!("views:{}", restaurant_id),
    }
}

/// Counts one view unless `seen` is already set.
///
/// Returns the flag to persist back into the session and the restaurant as
/// it should be rendered (post-increment when a view was counted).
pub async fn track_view(
    repo: &dyn RestaurantRepository,
    seen: SeenFlag,
    mut detail: RestaurantDetail,
) -> Result<(SeenFlag, RestaurantDetail), RepositoryError> {
    if seen.is_set() {
        return Ok((seen, detail));
    }

    let view_count = repo.increment_view_count(detail.restaurant.id).await?;
    tracing::debug!(
        restaurant_id = detail.restaurant.id,
        view_count,
        "Counted restaurant view"
    );
    detail.restaurant.view_count = view_count;

    Ok((SeenFlag(true), detail))
}
