use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::items::{Limit, MinRating, NewItem};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub primary_tag: Option<String>,
    pub secondary_tag: Option<String>,
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = DomainError;

    fn try_from(request: CreateItemRequest) -> Result<Self, Self::Error> {
        NewItem::new(request.name, request.primary_tag, request.secondary_tag)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RateItemRequest {
    pub name: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

impl LimitQuery {
    pub fn limit(&self) -> Result<Limit, DomainError> {
        self.limit.map_or(Ok(Limit::DEFAULT), Limit::new)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrimaryTagQuery {
    pub limit: Option<u32>,
    pub min_rating: Option<f64>,
}

impl PrimaryTagQuery {
    pub fn limit(&self) -> Result<Limit, DomainError> {
        self.limit.map_or(Ok(Limit::DEFAULT), Limit::new)
    }

    pub fn min_rating(&self) -> Result<MinRating, DomainError> {
        self.min_rating.map_or(Ok(MinRating::default()), MinRating::parse)
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub cache_enabled: bool,
    pub cache_backend: Option<&'static str>,
    pub store_backend: &'static str,
}
