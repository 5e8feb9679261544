pub mod api;
pub mod auth;
pub mod cancel;
pub mod common;
pub mod db;
pub mod mongodb;
pub mod store;
