pub mod achievements;
pub mod api;
pub mod auth;
pub mod completion;
pub mod db;
pub mod error;
pub mod prom_metrics;
pub mod store;
