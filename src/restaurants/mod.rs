pub mod domain;
pub mod presenter;
pub mod query;
pub mod repository;
pub mod view_count;

pub use presenter::ViewModelError;
pub use repository::{
    DynRestaurantRepository, RepositoryError, RestaurantRepository, SqliteRestaurantRepository,
};
pub use view_count::SeenFlag;
