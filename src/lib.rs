pub mod api;
pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod files;
pub mod html;
pub mod layout;
pub mod models;
pub mod navigation;
pub mod panel;
pub mod receipt;
pub mod resources;
pub mod session;
pub mod utils;
pub mod validation;

pub use crate::api::ApiClient;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Client for the NGO backend
    pub api: ApiClient,
    /// Largest accepted request body on the upload route
    pub upload_max_bytes: usize,
}
