// Library exports for forkful
// This allows integration tests and external code to use forkful modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod restaurants;
pub mod routes;
pub mod seed;
pub mod state;
pub mod users;
