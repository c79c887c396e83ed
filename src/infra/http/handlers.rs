//! Item directory handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::cache::ListQuery;
use crate::domain::error::DomainError;
use crate::domain::items::{Item, NewItem};

use super::HttpState;
use super::error::ApiError;
use super::models::{
    CreateItemRequest, LimitQuery, PrimaryTagQuery, RateItemRequest, RuntimeInfo,
    SuccessResponse,
};

const RATING_SEGMENT: &str = "rating";

pub async fn runtime_info(State(state): State<HttpState>) -> Json<RuntimeInfo> {
    Json(RuntimeInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        cache_enabled: state.directory.cache_enabled(),
        cache_backend: state.directory.cache_backend(),
        store_backend: state.directory.store_backend(),
    })
}

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.directory.health().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn create_item(
    State(state): State<HttpState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let input = NewItem::try_from(request).map_err(invalid)?;
    state.directory.create(input).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn get_item(
    State(state): State<HttpState>,
    Path(name): Path<String>,
) -> Result<Json<Item>, ApiError> {
    read_item(&state, &name).await
}

pub async fn delete_item(
    State(state): State<HttpState>,
    Path(name): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    remove_item(&state, &name).await
}

/// `/items/rating` shadows `/items/{name}`; these serve an item literally named `rating`.
pub async fn get_item_named_rating(
    State(state): State<HttpState>,
) -> Result<Json<Item>, ApiError> {
    read_item(&state, RATING_SEGMENT).await
}

pub async fn delete_item_named_rating(
    State(state): State<HttpState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    remove_item(&state, RATING_SEGMENT).await
}

async fn read_item(state: &HttpState, name: &str) -> Result<Json<Item>, ApiError> {
    let item = state.directory.get(name).await?;
    Ok(Json(item))
}

async fn remove_item(state: &HttpState, name: &str) -> Result<Json<SuccessResponse>, ApiError> {
    state.directory.delete(name).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn rate_item(
    State(state): State<HttpState>,
    payload: Result<Json<RateItemRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let (Some(name), Some(rating)) = (request.name, request.rating) else {
        return Err(ApiError::bad_request(
            "invalid request",
            Some("`name` and `rating` are required".to_string()),
        ));
    };
    state.directory.rate(&name, rating).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_by_primary_tag(
    State(state): State<HttpState>,
    Path(primary_tag): Path<String>,
    query: Result<Query<PrimaryTagQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let Query(params) = query?;
    let list = ListQuery::ByPrimaryTag {
        primary_tag,
        min_rating: params.min_rating().map_err(invalid)?,
        limit: params.limit().map_err(invalid)?,
    };
    Ok(Json(state.directory.list(&list).await?))
}

pub async fn list_by_secondary_tag(
    State(state): State<HttpState>,
    Path(secondary_tag): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let Query(params) = query?;
    let list = ListQuery::BySecondaryTag {
        secondary_tag,
        limit: params.limit().map_err(invalid)?,
    };
    Ok(Json(state.directory.list(&list).await?))
}

pub async fn list_by_both_tags(
    State(state): State<HttpState>,
    Path((secondary_tag, primary_tag)): Path<(String, String)>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let Query(params) = query?;
    let list = ListQuery::ByBothTags {
        secondary_tag,
        primary_tag,
        limit: params.limit().map_err(invalid)?,
    };
    Ok(Json(state.directory.list(&list).await?))
}

fn invalid(err: DomainError) -> ApiError {
    ApiError::bad_request("invalid request", Some(err.to_string()))
}
