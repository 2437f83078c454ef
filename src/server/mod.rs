pub mod auth;
pub mod constants;
pub mod errors;
pub mod health;
pub mod proxy;
pub mod requestline;
pub mod service;
