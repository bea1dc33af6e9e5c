//! Handler tests for the Products domain
//!
//! The router is driven with `oneshot`, backed by the in-memory repository and
//! an image store rooted in a temporary directory.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // For oneshot()

const BOUNDARY: &str = "----catalog-test-boundary";

struct TestApp {
    router: Router,
    storage: TempDir,
}

fn app() -> TestApp {
    app_with_max_bytes(2 * 1024 * 1024)
}

fn app_with_max_bytes(max_bytes: usize) -> TestApp {
    let storage = tempfile::tempdir().unwrap();
    let images = Arc::new(LocalImageStore::new(storage.path()).with_max_bytes(max_bytes));
    let service = ProductService::new(InMemoryProductRepository::new(), images);

    TestApp {
        router: handlers::router(service),
        storage,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create(&self, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", "/", body)).await
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Hand-built multipart body: text fields plus an optional file part
fn multipart_request(
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn widget() -> Value {
    json!({"name": "Widget", "price": 9.99, "category": "Tools"})
}

#[tokio::test]
async fn test_list_empty_returns_empty_array() {
    let app = app();

    let (status, body) = app.send(empty_request("GET", "/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_returns_201_with_envelope() {
    let app = app();

    let (status, body) = app.create(widget()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product created successfully");
    assert_eq!(body["data"]["name"], "Widget");
    assert_eq!(body["data"]["price"], 9.99);
    assert_eq!(body["data"]["category"], "Tools");
    assert_eq!(body["data"]["description"], Value::Null);
    assert_eq!(body["data"]["image"], Value::Null);
    assert!(body["data"]["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_create_then_show_round_trips() {
    let app = app();

    let (_, created) = app
        .create(json!({
            "name": "Widget",
            "price": 9.99,
            "category": "Tools",
            "description": "Sturdy and blue"
        }))
        .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, shown) = app.send(empty_request("GET", &format!("/{id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown, created["data"]);
}

#[tokio::test]
async fn test_create_missing_name_returns_422() {
    let app = app();

    let (status, body) = app
        .create(json!({"price": 9.99, "category": "Tools"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(
        body["details"]["name"][0]["message"],
        "The name field is required."
    );

    let (_, list) = app.send(empty_request("GET", "/")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_non_numeric_price_returns_422() {
    let app = app();

    let (status, body) = app
        .create(json!({"name": "Widget", "price": "cheap", "category": "Tools"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["price"].is_array());
}

#[tokio::test]
async fn test_create_urlencoded() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=Widget&price=12.5&category=Tools"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["price"], 12.5);
}

#[tokio::test]
async fn test_show_missing_returns_404() {
    let app = app();

    let (status, body) = app.send(empty_request("GET", "/999")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product 999 not found");
}

#[tokio::test]
async fn test_show_non_numeric_id_returns_400() {
    let app = app();

    let (status, body) = app.send(empty_request("GET", "/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ID");
}

#[tokio::test]
async fn test_delete_then_show_returns_404() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = app.send(empty_request("DELETE", &format!("/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Product deleted successfully"}));

    let (status, _) = app.send(empty_request("GET", &format!("/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(empty_request("DELETE", &format!("/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_keeps_id_and_created_at() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/{id}"),
            json!({"name": "Gadget", "price": 19.5, "category": "Gizmos"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product updated successfully");
    let data = &body["data"];
    assert_eq!(data["id"], id);
    assert_eq!(data["name"], "Gadget");
    assert_eq!(data["price"], 19.5);
    assert_eq!(data["created_at"], created["data"]["created_at"]);

    let before: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(created["data"]["updated_at"].clone()).unwrap();
    let after: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(data["updated_at"].clone()).unwrap();
    assert!(after > before);
}

#[tokio::test]
async fn test_update_missing_returns_404() {
    let app = app();

    let (status, _) = app
        .send(json_request("PUT", "/999", widget()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_invalid_returns_422_and_leaves_product() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(json_request("PUT", &format!("/{id}"), json!({"name": "Gadget"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, shown) = app.send(empty_request("GET", &format!("/{id}"))).await;
    assert_eq!(shown, created["data"]);
}

#[tokio::test]
async fn test_post_with_method_override_updates() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let request = multipart_request(
        "POST",
        &format!("/{id}"),
        &[
            ("_method", "PUT"),
            ("name", "Gadget"),
            ("price", "4.25"),
            ("category", "Tools"),
        ],
        None,
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Gadget");
    assert_eq!(body["data"]["price"], 4.25);
}

#[tokio::test]
async fn test_post_with_override_header_updates() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let mut request = json_request(
        "POST",
        &format!("/{id}"),
        json!({"name": "Gadget", "price": 1, "category": "Tools"}),
    );
    request
        .headers_mut()
        .insert("x-http-method-override", "PATCH".parse().unwrap());
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Gadget");
}

#[tokio::test]
async fn test_post_with_delete_override_deletes() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/{id}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("_method=DELETE"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");

    let (status, _) = app.send(empty_request("GET", &format!("/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_without_override_returns_405() {
    let app = app();
    let (_, created) = app.create(widget()).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(json_request("POST", &format!("/{id}"), widget()))
        .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_create_with_image_records_public_path() {
    let app = app();

    let request = multipart_request(
        "POST",
        "/",
        &[("name", "Widget"), ("price", "9.99"), ("category", "Tools")],
        Some(("widget.png", "image/png", b"\x89PNG fake image")),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with("/images/products/"));
    assert!(image.ends_with(".png"));

    let stored = app
        .storage
        .path()
        .join(image.trim_start_matches("/images/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"\x89PNG fake image");
}

#[tokio::test]
async fn test_create_with_invalid_image_ignores_it() {
    let app = app();

    let request = multipart_request(
        "POST",
        "/",
        &[("name", "Widget"), ("price", "9.99"), ("category", "Tools")],
        Some(("notes.txt", "text/plain", b"not an image")),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["image"], Value::Null);
    assert!(!app.storage.path().join(PRODUCTS_DIR).exists());
}

#[tokio::test]
async fn test_update_without_image_keeps_existing_image() {
    let app = app();

    let request = multipart_request(
        "POST",
        "/",
        &[("name", "Widget"), ("price", "9.99"), ("category", "Tools")],
        Some(("widget.jpg", "image/jpeg", b"JPEG")),
    );
    let (_, created) = app.send(request).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let request = multipart_request(
        "POST",
        &format!("/{id}"),
        &[
            ("_method", "PUT"),
            ("name", "Widget v2"),
            ("price", "9.99"),
            ("category", "Tools"),
        ],
        None,
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image"], created["data"]["image"]);
}

#[tokio::test]
async fn test_list_returns_products_in_creation_order() {
    let app = app();
    for name in ["First", "Second"] {
        app.create(json!({"name": name, "price": 1, "category": "Tools"}))
            .await;
    }

    let (status, body) = app.send(empty_request("GET", "/")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["First", "Second"]);
}

#[tokio::test]
async fn test_create_wrong_field_types_report_each_field() {
    let app = app();

    let (status, body) = app
        .create(json!({"name": 123, "description": 5, "price": 1, "category": "Tools"}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["details"]["name"][0]["message"],
        "The name field must be a string."
    );
    assert_eq!(body["details"]["description"][0]["code"], "string");
    assert!(body["details"].get("body").is_none());
    assert!(body["details"].get("price").is_none());
}

#[tokio::test]
async fn test_create_with_oversized_image_ignores_it() {
    let app = app_with_max_bytes(16);

    let request = multipart_request(
        "POST",
        "/",
        &[("name", "Widget"), ("price", "9.99"), ("category", "Tools")],
        Some(("widget.png", "image/png", &[0u8; 64])),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["image"], Value::Null);
    assert!(!app.storage.path().join(PRODUCTS_DIR).exists());
}

#[tokio::test]
async fn test_update_via_post_with_invalid_image_keeps_existing_image() {
    let app = app();

    let request = multipart_request(
        "POST",
        "/",
        &[("name", "Widget"), ("price", "9.99"), ("category", "Tools")],
        Some(("widget.png", "image/png", b"PNG")),
    );
    let (_, created) = app.send(request).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let request = multipart_request(
        "POST",
        &format!("/{id}"),
        &[
            ("_method", "PUT"),
            ("name", "Widget v2"),
            ("price", "9.99"),
            ("category", "Tools"),
        ],
        Some(("notes.txt", "text/plain", b"not an image")),
    );
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Widget v2");
    assert_eq!(body["data"]["image"], created["data"]["image"]);

    let stored = std::fs::read_dir(app.storage.path().join(PRODUCTS_DIR))
        .unwrap()
        .count();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn test_update_missing_product_with_image_writes_no_file() {
    let app = app();

    let request = multipart_request(
        "POST",
        "/999",
        &[
            ("_method", "PUT"),
            ("name", "Widget"),
            ("price", "9.99"),
            ("category", "Tools"),
        ],
        Some(("widget.png", "image/png", b"PNG")),
    );
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!app.storage.path().join(PRODUCTS_DIR).exists());
}
