mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use common::{sample_catalog, spawn, Backend, PASSWORD, PHONE, TOKEN};
use storefront_client::storage::{load_token, save_token};
use storefront_client::{ApiClient, ImageFile, MemoryStore, SharedStore};
use storefront_shared::{ApiError, Category, PageRequest, ProductDraft};

fn draft(image_url: Option<&str>) -> ProductDraft {
    ProductDraft {
        description: "Oak desk".into(),
        status: Default::default(),
        category: Category::Office,
        price: 15000.0,
        location: "Mombasa".into(),
        product_type: "Desk".into(),
        condition: Default::default(),
        image_url: image_url.map(str::to_string),
    }
}

fn client(url: String, token: Option<&str>) -> (ApiClient, SharedStore) {
    let store: SharedStore = MemoryStore::shared();
    if let Some(token) = token {
        save_token(store.as_ref(), token);
    }
    (ApiClient::new(store.clone()).with_base_url(url), store)
}

#[tokio::test]
async fn public_reads_skip_the_bearer_header() {
    let server = spawn(Backend::with_catalog(sample_catalog())).await;
    let (api, _) = client(server.url(), Some(TOKEN));

    api.list_products(PageRequest::default()).await.unwrap();
    api.list_products_by_category(Category::Home, PageRequest::default())
        .await
        .unwrap();
    api.get_product(1).await.unwrap();

    let requests = server.backend.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.authorization.is_none()));
    assert_eq!(requests[0].query.as_deref(), Some("page=0&size=10"));
    assert_eq!(requests[1].path, "/api/products/category/HOME");
}

#[tokio::test]
async fn writes_carry_the_bearer_header() {
    let server = spawn(Backend::with_catalog(sample_catalog())).await;
    let (api, _) = client(server.url(), Some(TOKEN));

    let created = api
        .create_product(&draft(Some("/api/products/uploads/desk.png")))
        .await
        .unwrap();
    assert_eq!(created.id, 13);
    api.delete_product(created.id).await.unwrap();

    let requests = server.backend.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert_eq!(request.authorization.as_deref(), Some("Bearer abc123"));
    }
}

#[tokio::test]
async fn no_token_means_no_header() {
    let server = spawn(Backend::default()).await;
    let (api, _) = client(server.url(), None);

    let err = api.delete_product(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert_eq!(server.backend.requests()[0].authorization, None);
}

#[tokio::test]
async fn unauthorized_clears_token_and_fires_hook_once() {
    let server = spawn(Backend::with_catalog(sample_catalog())).await;
    let (api, store) = client(server.url(), Some("stale-token"));
    let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = fired.clone();
    let api = api.on_unauthorized(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = api.delete_product(3).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(load_token(store.as_ref()), None);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(server.backend.catalog().len(), 12);
}

#[tokio::test]
async fn validation_body_is_returned_verbatim_without_side_effects() {
    let server = spawn(Backend::default()).await;
    let (api, store) = client(server.url(), Some(TOKEN));
    let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = fired.clone();
    let api = api.on_unauthorized(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let body = r#"{"price":"must be greater than or equal to 0"}"#;
    server.backend.respond_next(StatusCode::BAD_REQUEST, body);
    let err = api
        .update_product(1, &draft(Some("/x.png")))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Validation {
            body: body.to_string()
        }
    );
    assert_eq!(
        err.message_or("Failed to update product"),
        "price: must be greater than or equal to 0"
    );
    assert_eq!(load_token(store.as_ref()).as_deref(), Some(TOKEN));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let server = spawn(Backend::with_catalog(sample_catalog())).await;
    let (api, _) = client(server.url(), None);

    let err = api.get_product(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message_or("Product not found"), "Product 99 does not exist");
}

#[tokio::test]
async fn create_without_image_sends_nothing() {
    let server = spawn(Backend::default()).await;
    let (api, _) = client(server.url(), Some(TOKEN));

    for image_url in [None, Some(""), Some("   ")] {
        let err = api.create_product(&draft(image_url)).await.unwrap_err();
        assert!(matches!(err, ApiError::Precondition(_)));
    }
    let err = api.list_products(PageRequest::new(0, 0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Precondition(_)));

    assert_eq!(server.backend.request_count(), 0);
}

#[tokio::test]
async fn upload_returns_relative_url() {
    let server = spawn(Backend::default()).await;
    let (api, _) = client(server.url(), Some(TOKEN));

    let file = ImageFile::new("lamp.png", "image/png", vec![0x89, b'P', b'N', b'G']);
    let url = api.upload_image(&file).await.unwrap();
    assert_eq!(url, "/api/products/uploads/lamp.png");

    let request = &server.backend.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/products/upload");
}

#[tokio::test]
async fn non_image_upload_sends_nothing() {
    let server = spawn(Backend::default()).await;
    let (api, _) = client(server.url(), Some(TOKEN));

    let file = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());
    assert!(matches!(
        api.upload_image(&file).await,
        Err(ApiError::Precondition(_))
    ));
    assert_eq!(server.backend.request_count(), 0);
}

#[tokio::test]
async fn login_returns_raw_token() {
    let server = spawn(Backend::default()).await;
    let (api, store) = client(server.url(), None);

    assert_eq!(api.login(PHONE, PASSWORD).await.unwrap(), TOKEN);
    // Persisting is the caller's job
    assert_eq!(load_token(store.as_ref()), None);

    let request = &server.backend.requests()[0];
    assert_eq!(request.path, "/login");
    let query = request.query.as_deref().unwrap_or_default();
    assert!(query.contains("phone=0711000000"));
    assert!(query.contains("password=secret"));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let (api, _) = client("http://127.0.0.1:9".to_string(), None);
    let err = api.list_products(PageRequest::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.message_or("Failed to fetch products"), "Failed to fetch products");
}
