pub mod files;
pub mod generate;
pub mod pdf;
pub mod root;
pub mod tools;

use axum::{extract::Host, Router};

use crate::state::Services;

pub fn create_router(services: Services) -> Router {
    Router::new()
        .merge(root::create_route(services.clone()))
        .merge(generate::create_route(services.clone()))
        .merge(pdf::create_route(services.clone()))
        .merge(files::create_route(services.clone()))
        .merge(tools::create_route(services))
}

/// Base URL relative links in rendered documents resolve against.
pub fn base_url(host: Option<Host>) -> String {
    match host {
        Some(Host(host)) => format!("http://{}/", host),
        None => "http://localhost/".to_string(),
    }
}
