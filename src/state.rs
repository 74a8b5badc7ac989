use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::restaurants::{DynRestaurantRepository, SqliteRestaurantRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub restaurants: DynRestaurantRepository,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let restaurants = Arc::new(SqliteRestaurantRepository::new(db.clone()));
        Self {
            db,
            config,
            restaurants,
        }
    }
}
