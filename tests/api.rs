use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use itemdir::application::directory::ItemDirectoryService;
use itemdir::application::repos::{ItemsRepo, RepoError};
use itemdir::cache::{CacheConfig, LruCacheStore};
use itemdir::domain::items::{Item, Limit, MinRating};
use itemdir::infra::http::{HttpState, build_router};
use itemdir::infra::memory::InMemoryItemsRepo;

/// Store whose every call fails, standing in for an unreachable database.
struct UnavailableRepo;

fn unavailable() -> RepoError {
    RepoError::from_persistence("connection refused (os error 111)")
}

#[async_trait]
impl ItemsRepo for UnavailableRepo {
    async fn get(&self, _name: &str) -> Result<Option<Item>, RepoError> {
        Err(unavailable())
    }

    async fn put(&self, _item: &Item) -> Result<(), RepoError> {
        Err(unavailable())
    }

    async fn insert_if_absent(&self, _item: &Item) -> Result<bool, RepoError> {
        Err(unavailable())
    }

    async fn delete(&self, _name: &str) -> Result<(), RepoError> {
        Err(unavailable())
    }

    async fn update_rating(
        &self,
        _name: &str,
        _rating: f64,
        _rating_count: u32,
    ) -> Result<(), RepoError> {
        Err(unavailable())
    }

    async fn apply_rating(&self, _name: &str, _submitted: f64) -> Result<Option<Item>, RepoError> {
        Err(unavailable())
    }

    async fn query_by_secondary_tag(
        &self,
        _secondary_tag: &str,
        _limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        Err(unavailable())
    }

    async fn query_by_primary_tag(
        &self,
        _primary_tag: &str,
        _min_rating: MinRating,
        _limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        Err(unavailable())
    }

    async fn query_by_both_tags(
        &self,
        _secondary_tag: &str,
        _primary_tag: &str,
        _limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        Err(unavailable())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Err(unavailable())
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

fn router_with(repo: Arc<dyn ItemsRepo>) -> Router {
    let config = CacheConfig::default();
    let cache = Arc::new(LruCacheStore::new(
        NonZeroUsize::new(1_000).expect("non-zero"),
    ));
    let directory = ItemDirectoryService::new(repo, cache, &config);
    build_router(HttpState::new(Arc::new(directory)))
}

fn router() -> Router {
    router_with(Arc::new(InMemoryItemsRepo::new()))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

async fn create(router: &Router, name: &str, primary_tag: &str, secondary_tag: &str) {
    let (status, body) = send(
        router,
        json_request(
            Method::POST,
            "/items",
            json!({"name": name, "primaryTag": primary_tag, "secondaryTag": secondary_tag}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create {name}: {body}");
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn create_read_rate_delete_flow() {
    let router = router();
    create(&router, "noodle-bar", "Thai", "Boston").await;

    let (status, body) = send(&router, empty_request(Method::GET, "/items/noodle-bar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "noodle-bar");
    assert_eq!(body["primaryTag"], "Thai");
    assert_eq!(body["secondaryTag"], "Boston");
    assert_eq!(body["rating"], json!(0.0));
    assert_eq!(body["ratingCount"], 0);

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/items/rating",
            json!({"name": "noodle-bar", "rating": 4}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (_, body) = send(&router, empty_request(Method::GET, "/items/noodle-bar")).await;
    assert_eq!(body["rating"], json!(4.0));
    assert_eq!(body["ratingCount"], 1);

    let (status, _) = send(&router, empty_request(Method::DELETE, "/items/noodle-bar")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, empty_request(Method::GET, "/items/noodle-bar")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let router = router();
    create(&router, "noodle-bar", "Thai", "Boston").await;

    let (status, body) = send(
        &router,
        json_request(
            Method::POST,
            "/items",
            json!({"name": "noodle-bar", "primaryTag": "Thai", "secondaryTag": "Boston"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_exists");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let router = router();

    let (status, body) = send(
        &router,
        json_request(Method::POST, "/items", json!({"name": "noodle-bar"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = send(
        &router,
        json_request(Method::POST, "/items/rating", json!({"name": "noodle-bar"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/items/rating",
            json!({"name": "noodle-bar", "rating": 5.5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rating_unknown_item_is_not_found() {
    let router = router();
    let (status, _) = send(
        &router,
        json_request(
            Method::POST,
            "/items/rating",
            json!({"name": "ghost", "rating": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, empty_request(Method::DELETE, "/items/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_parameters_are_bounded() {
    let router = router();

    for uri in [
        "/items/by-secondary/Boston?limit=101",
        "/items/by-secondary/Boston?limit=9",
        "/items/by-secondary/Boston/by-primary/Thai?limit=0",
        "/items/by-primary/Thai?minRating=5.1",
        "/items/by-primary/Thai?minRating=2.55",
        "/items/by-primary/Thai?limit=abc",
    ] {
        let (status, _) = send(&router, empty_request(Method::GET, uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    for uri in [
        "/items/by-secondary/Boston?limit=10",
        "/items/by-secondary/Boston?limit=100",
        "/items/by-primary/Thai?minRating=5&limit=100",
        "/items/by-primary/Thai?minRating=0",
    ] {
        let (status, body) = send(&router, empty_request(Method::GET, uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn lists_reflect_writes_and_order_by_rating() {
    let router = router();
    create(&router, "noodle-bar", "Thai", "Boston").await;
    create(&router, "basil-house", "Thai", "Boston").await;
    create(&router, "taco-stand", "Mexican", "Boston").await;

    // Prime the list caches before the ratings land.
    let (_, body) = send(
        &router,
        empty_request(Method::GET, "/items/by-secondary/Boston/by-primary/Thai"),
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    let (_, body) = send(
        &router,
        empty_request(Method::GET, "/items/by-primary/Thai?minRating=3"),
    )
    .await;
    assert_eq!(body, json!([]));

    for (name, rating) in [("noodle-bar", 3.5), ("basil-house", 4.5)] {
        let (status, _) = send(
            &router,
            json_request(
                Method::POST,
                "/items/rating",
                json!({"name": name, "rating": rating}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(
        &router,
        empty_request(Method::GET, "/items/by-primary/Thai?minRating=3"),
    )
    .await;
    let names: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|item| item["name"].as_str())
        .collect();
    assert_eq!(names, ["basil-house", "noodle-bar"]);

    let (_, body) = send(&router, empty_request(Method::GET, "/items/by-secondary/Boston")).await;
    assert_eq!(body.as_array().map(Vec::len), Some(3));
    assert_eq!(body[2]["name"], "taco-stand");
}

#[tokio::test]
async fn store_failures_are_opaque_server_errors() {
    let router = router_with(Arc::new(UnavailableRepo));

    let (status, body) = send(&router, empty_request(Method::GET, "/items/noodle-bar")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Internal Server Error");
    assert!(!body.to_string().contains("connection refused"));

    let (status, _) = send(&router, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_and_runtime_info() {
    let router = router();

    let (status, body) = send(&router, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&router, empty_request(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "itemdir");
    assert_eq!(body["cacheEnabled"], true);
    assert_eq!(body["cacheBackend"], "memory");
    assert_eq!(body["storeBackend"], "memory");
}

#[tokio::test]
async fn item_named_rating_is_readable_and_deletable() {
    let router = router();
    create(&router, "rating", "Thai", "Boston").await;

    let (status, body) = send(&router, empty_request(Method::GET, "/items/rating")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "rating");

    let (status, body) = send(&router, empty_request(Method::DELETE, "/items/rating")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = send(&router, empty_request(Method::GET, "/items/rating")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn runtime_info_reports_no_cache_backend_when_disabled() {
    let repo = Arc::new(InMemoryItemsRepo::new());
    let cache = Arc::new(LruCacheStore::new(NonZeroUsize::MIN));
    let directory = ItemDirectoryService::new(repo, cache, &CacheConfig::disabled());
    let router = build_router(HttpState::new(Arc::new(directory)));

    let (status, body) = send(&router, empty_request(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cacheEnabled"], false);
    assert_eq!(body["cacheBackend"], Value::Null);
}
