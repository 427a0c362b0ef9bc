//! Integration tests for `ShopifyClient::fetch_catalog` and
//! `ShopifyClient::is_product_reachable`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. The storefront is mounted under a locale
//! prefix (`/zh-hant`) the way the production store is.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopwatch_scraper::{ClientOptions, ScraperError, ShopifyClient};

const PLACEHOLDER: &str = "https://cdn.example.com/no-image.png";
const CATALOG_PATH: &str = "/zh-hant/products.json";

fn store_url(server: &MockServer) -> String {
    format!("{}/zh-hant", server.uri())
}

fn options(server: &MockServer, max_retries: u32) -> ClientOptions {
    ClientOptions {
        store_url: store_url(server),
        placeholder_image_url: PLACEHOLDER.to_owned(),
        user_agent: "shopwatch-test/0.1".to_owned(),
        request_timeout_secs: 5,
        probe_timeout_secs: 2,
        page_size: 250,
        inter_page_delay_ms: 0,
        max_retries,
        retry_delay_secs: 0,
    }
}

/// Builds a `ShopifyClient` suitable for tests: no retries, no delays.
fn test_client(server: &MockServer) -> ShopifyClient {
    ShopifyClient::new(options(server, 0)).expect("failed to build test ShopifyClient")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> ShopifyClient {
    ShopifyClient::new(options(server, max_retries)).expect("failed to build test ShopifyClient")
}

fn observed_at() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(8 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 5, 1, 9, 30, 0)
        .unwrap()
}

fn product_json(handle: &str, title: &str, price: &str, tags: &[&str]) -> serde_json::Value {
    json!({
        "id": 1,
        "title": title,
        "handle": handle,
        "tags": tags,
        "images": [{ "src": format!("https://cdn.example.com/{handle}.jpg") }],
        "variants": [{ "id": 101, "price": price, "available": true }]
    })
}

fn page_json(products: &[serde_json::Value]) -> serde_json::Value {
    json!({ "products": products })
}

async fn mount_page(server: &MockServer, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_catalog_returns_empty_vec_when_first_page_is_empty() {
    let server = MockServer::start().await;
    mount_page(&server, "1", page_json(&[])).await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    assert!(result.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_catalog_normalizes_single_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        page_json(&[product_json("usagi", "Usagi Plush", "1650.00", &["RE20250601"])]),
    )
    .await;
    mount_page(&server, "2", page_json(&[])).await;

    let products = test_client(&server)
        .fetch_catalog(observed_at())
        .await
        .expect("fetch should succeed");

    assert_eq!(products.len(), 1);
    let usagi = &products[0];
    assert_eq!(usagi.url, format!("{}/products/usagi", store_url(&server)));
    assert_eq!(usagi.name, "Usagi Plush");
    assert_eq!(usagi.price, 1650);
    assert!(usagi.available);
    assert_eq!(usagi.tags, vec!["RE20250601".to_owned()]);
    assert_eq!(usagi.image_url, "https://cdn.example.com/usagi.jpg");
    assert_eq!(usagi.last_seen, observed_at());
}

#[tokio::test]
async fn fetch_catalog_walks_pages_until_empty() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        page_json(&[
            product_json("chiikawa", "Chiikawa", "1100.00", &[]),
            product_json("hachiware", "Hachiware", "1100.00", &[]),
        ]),
    )
    .await;
    mount_page(
        &server,
        "2",
        page_json(&[product_json("usagi", "Usagi", "1100.00", &[])]),
    )
    .await;
    mount_page(&server, "3", page_json(&[])).await;

    let products = test_client(&server)
        .fetch_catalog(observed_at())
        .await
        .expect("fetch should succeed");

    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Chiikawa", "Hachiware", "Usagi"]);
}

#[tokio::test]
async fn fetch_catalog_keeps_first_occurrence_of_duplicate_handle() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        page_json(&[
            product_json("usagi", "Usagi (first)", "1100.00", &[]),
            product_json("usagi", "Usagi (second)", "2200.00", &[]),
            product_json("", "No Handle", "500.00", &[]),
        ]),
    )
    .await;
    mount_page(&server, "2", page_json(&[])).await;

    let products = test_client(&server)
        .fetch_catalog(observed_at())
        .await
        .expect("fetch should succeed");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Usagi (first)");
    assert_eq!(products[0].price, 1100);
}

#[tokio::test]
async fn fetch_catalog_stops_when_page_repeats_known_handles() {
    let server = MockServer::start().await;
    let repeated = page_json(&[
        product_json("chiikawa", "Chiikawa", "1100.00", &[]),
        product_json("usagi", "Usagi", "1100.00", &[]),
    ]);
    mount_page(&server, "1", repeated.clone()).await;
    mount_page(&server, "2", repeated).await;

    let products = test_client(&server)
        .fetch_catalog(observed_at())
        .await
        .expect("fetch should succeed");

    assert_eq!(products.len(), 2);
}

// ---------------------------------------------------------------------------
// Error propagation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_catalog_propagates_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    match result {
        Err(ScraperError::RateLimited {
            domain,
            retry_after_secs,
        }) => {
            assert_eq!(domain, "127.0.0.1");
            assert_eq!(retry_after_secs, 30);
        }
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_catalog_rate_limit_without_retry_after_defaults_to_60s() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    assert!(
        matches!(
            result,
            Err(ScraperError::RateLimited {
                retry_after_secs: 60,
                ..
            })
        ),
        "expected RateLimited with 60s default, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_catalog_propagates_not_found_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    assert!(
        matches!(result, Err(ScraperError::NotFound { .. })),
        "expected NotFound, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_catalog_discards_partial_results_when_later_page_fails() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "1",
        page_json(&[product_json("usagi", "Usagi", "1100.00", &[])]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_catalog_propagates_malformed_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"products\": ["))
        .mount(&server)
        .await;

    let result = test_client(&server).fetch_catalog(observed_at()).await;

    assert!(
        matches!(result, Err(ScraperError::Deserialize { .. })),
        "expected Deserialize, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Whole-fetch retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_catalog_retries_after_503_and_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "1",
        page_json(&[product_json("usagi", "Usagi", "1100.00", &[])]),
    )
    .await;
    mount_page(&server, "2", page_json(&[])).await;

    let result = test_client_with_retries(&server, 1)
        .fetch_catalog(observed_at())
        .await;

    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
    assert_eq!(result.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_catalog_returns_error_after_exhausting_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CATALOG_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3) // 1 initial + 2 retries
        .mount(&server)
        .await;

    let result = test_client_with_retries(&server, 2)
        .fetch_catalog(observed_at())
        .await;

    assert!(matches!(result, Err(ScraperError::RateLimited { .. })));
}

// ---------------------------------------------------------------------------
// Reachability probe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn probe_reports_reachable_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/zh-hant/products/usagi"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let url = format!("{}/products/usagi", store_url(&server));
    assert!(client.is_product_reachable(&url).await);
}

#[tokio::test]
async fn probe_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/zh-hant/products/usagi"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/zh-hant/products/usagi-v2", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/zh-hant/products/usagi-v2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let url = format!("{}/products/usagi", store_url(&server));
    assert!(client.is_product_reachable(&url).await);
}

#[tokio::test]
async fn probe_reports_unreachable_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/zh-hant/products/usagi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let url = format!("{}/products/usagi", store_url(&server));
    assert!(!client.is_product_reachable(&url).await);
}

#[tokio::test]
async fn probe_reports_unreachable_on_transport_error() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    assert!(
        !client
            .is_product_reachable("http://127.0.0.1:1/products/usagi")
            .await
    );
}
