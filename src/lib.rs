pub mod api;
pub mod error;
pub mod living_apps;
pub mod models;
pub mod services;
pub mod state;
