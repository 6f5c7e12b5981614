//! Integration tests for the mock Collection API router.
//!
//! Requests go straight through the router with `oneshot`; no socket is bound.

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use catalog::io::api::{ApiError, CollectionApi};
use catalog::io::http::HttpApi;
use catalog::io::store::Store;
use catalog::model::{FilterSelection, Pagination, Resource};
use catalog::ops::query::build_query;
use catalog::server::{AppState, create_router};

const FIXTURE: &str = include_str!("fixtures/db.json");

fn router() -> Router {
    let data: Value = serde_json::from_str(FIXTURE).unwrap();
    create_router(AppState::new(Store::from_value(data).unwrap()))
}

struct Reply {
    status: StatusCode,
    total: Option<String>,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let total = response
        .headers()
        .get("x-total-count")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        total,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Method::GET, uri, None).await
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_pages_and_counts() {
    let app = router();
    let reply = get(&app, "/products?_sort=name&_order=asc&_page=2&_limit=4").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.total.as_deref(), Some("6"));
    assert_eq!(names(&reply.body), vec!["Phone Mini", "Standing Desk"]);
}

#[tokio::test]
async fn total_counts_filtered_records() {
    let app = router();
    let reply = get(&app, "/products?brandId=1&brandId=2&_page=1&_limit=2").await;
    assert_eq!(reply.total.as_deref(), Some("4"));
    assert_eq!(reply.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn like_is_case_insensitive_substring() {
    let app = router();
    let reply = get(&app, "/products?name_like=LAPTOP&_sort=name").await;
    assert_eq!(
        names(&reply.body),
        vec!["Gaming Laptop", "Laptop Air", "Laptop Pro 14"]
    );
}

#[tokio::test]
async fn price_range_is_inclusive() {
    let app = router();
    let reply = get(&app, "/products?price_gte=320&price_lte=450&_sort=price").await;
    assert_eq!(names(&reply.body), vec!["Office Chair", "Laptop Air"]);
}

#[tokio::test]
async fn sort_descending() {
    let app = router();
    let reply = get(&app, "/products?_sort=price&_order=desc&_page=1&_limit=1").await;
    assert_eq!(names(&reply.body), vec!["Gaming Laptop"]);
}

#[tokio::test]
async fn expand_inlines_relations() {
    let app = router();
    let reply = get(&app, "/products?_expand=brand&_expand=category&id=4").await;
    let item = &reply.body[0];
    assert_eq!(item["brand"]["name"], "Initech");
    assert_eq!(item["category"]["name"], "Chairs");
    assert!(item.get("subcategory").is_none());
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() {
    let app = router();
    let uri = format!("/products?_page={}&_limit=10", usize::MAX);
    let reply = get(&app, &uri).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.total.as_deref(), Some("6"));
    assert_eq!(reply.body, json!([]));
}

#[tokio::test]
async fn unknown_collection_is_404() {
    let app = router();
    let reply = get(&app, "/widgets").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn db_dumps_every_collection() {
    let app = router();
    let reply = get(&app, "/db").await;
    assert_eq!(reply.body["brands"].as_array().unwrap().len(), 3);
    assert_eq!(reply.body["subcategories"].as_array().unwrap().len(), 5);
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_one_with_expand() {
    let app = router();
    let reply = get(&app, "/products/2?_expand=brand").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["name"], "Laptop Air");
    assert_eq!(reply.body["brand"]["name"], "Globex");
}

#[tokio::test]
async fn missing_record_is_404_with_empty_object() {
    let app = router();
    let reply = get(&app, "/products/99").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, json!({}));
}

#[tokio::test]
async fn post_assigns_next_id() {
    let app = router();
    let reply = send(
        &app,
        Method::POST,
        "/brands",
        Some(json!({ "name": "Umbrella" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body, json!({ "id": 4, "name": "Umbrella" }));

    let reply = get(&app, "/brands").await;
    assert_eq!(reply.total.as_deref(), Some("4"));
}

#[tokio::test]
async fn post_rejects_non_object() {
    let app = router();
    let reply = send(&app, Method::POST, "/brands", Some(json!([1, 2]))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_rejects_duplicate_id() {
    let app = router();
    let reply = send(
        &app,
        Method::POST,
        "/brands",
        Some(json!({ "id": 1, "name": "Again" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn put_merges_and_keeps_id() {
    let app = router();
    let reply = send(
        &app,
        Method::PUT,
        "/products/2",
        Some(json!({ "id": 77, "stock": 0 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["id"], 2);
    assert_eq!(reply.body["stock"], 0);
    assert_eq!(reply.body["sku"], "LA-13");
}

#[tokio::test]
async fn delete_removes_record() {
    let app = router();
    let reply = send(&app, Method::DELETE, "/products/3", None).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = get(&app, "/products/3").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    let reply = get(&app, "/products").await;
    assert_eq!(reply.total.as_deref(), Some("5"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_creates_get_distinct_ids() {
    let app = router();
    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = json!({ "name": format!("Brand {}", i) });
            send(&app, Method::POST, "/brands", Some(body)).await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        let reply = handle.await.unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);
        ids.push(reply.body["id"].as_u64().unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (4..12).collect::<Vec<u64>>());
}

#[tokio::test]
async fn responses_allow_any_origin() {
    let app = router();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/brands")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(
        headers["access-control-expose-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase()
            .contains("x-total-count")
    );
}

// ---------------------------------------------------------------------------
// Over a socket
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_client_reads_pages_from_a_live_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });

    let (laptops, exact, missing) = tokio::task::spawn_blocking(move || {
        let api = HttpApi::new(&base, Duration::from_secs(5)).unwrap();
        let first_two = Pagination {
            page_index: 0,
            page_size: 2,
        };
        let search = |text: &str| FilterSelection {
            search_text: text.to_string(),
            ..Default::default()
        };
        let laptops = api
            .list(Resource::Products, &build_query(&search("laptop"), first_two, None))
            .unwrap();
        let exact = api
            .list(Resource::Products, &build_query(&search("laptop pro"), first_two, None))
            .unwrap();
        let missing = api.get(Resource::Products, 99, &[]).unwrap_err();
        (laptops, exact, missing)
    })
    .await
    .unwrap();

    assert_eq!(laptops.total, 3);
    assert_eq!(names(&Value::Array(laptops.items)), vec!["Gaming Laptop", "Laptop Air"]);
    assert_eq!(exact.total, 1);
    assert_eq!(exact.items[0]["name"], "Laptop Pro 14");
    // Relations were requested and inlined by the server
    assert!(exact.items[0]["brand"]["name"].is_string());
    assert!(matches!(missing, ApiError::NotFound { id: 99, .. }));
}
