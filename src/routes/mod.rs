use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod clients;
pub mod doc;
pub mod health;
pub mod params;
pub mod services;
pub mod technicians;
pub mod tickets;
pub mod upload;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/auth", auth::router())
        .nest("/clients", clients::router())
        .nest("/technicians", technicians::router())
        .nest("/services", services::router())
        .nest("/tickets", tickets::router())
}
