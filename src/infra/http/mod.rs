//! HTTP surface of the directory.

mod error;
mod handlers;
mod middleware;
mod models;

pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use middleware::RequestContext;
pub use models::{CreateItemRequest, RateItemRequest, RuntimeInfo, SuccessResponse};

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::directory::ItemDirectoryService;

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub directory: Arc<ItemDirectoryService>,
}

impl HttpState {
    pub fn new(directory: Arc<ItemDirectoryService>) -> Self {
        Self { directory }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(handlers::runtime_info))
        .route("/health", get(handlers::health))
        .route("/items", post(handlers::create_item))
        .route(
            "/items/rating",
            post(handlers::rate_item)
                .get(handlers::get_item_named_rating)
                .delete(handlers::delete_item_named_rating),
        )
        .route(
            "/items/by-primary/{primary_tag}",
            get(handlers::list_by_primary_tag),
        )
        .route(
            "/items/by-secondary/{secondary_tag}",
            get(handlers::list_by_secondary_tag),
        )
        .route(
            "/items/by-secondary/{secondary_tag}/by-primary/{primary_tag}",
            get(handlers::list_by_both_tags),
        )
        .route(
            "/items/{name}",
            get(handlers::get_item).delete(handlers::delete_item),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
