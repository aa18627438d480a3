pub mod api;
pub mod auth;
pub mod config;
pub mod engines;
pub mod errors;
pub mod models;
pub mod retry;
pub mod services;
