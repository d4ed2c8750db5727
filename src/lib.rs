pub mod config;
pub mod database;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod services;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
}
