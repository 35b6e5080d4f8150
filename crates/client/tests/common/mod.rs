//! In-process stand-in for the storefront backend: REST routes, upload,
//! login, and a STOMP broker on `/chat`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Multipart, Path, Query, Request, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use storefront_client::{AppContext, ClientConfig, MemoryStore, SharedStore};
use storefront_shared::{
    Category, ChatMessage, Condition, Product, ProductDraft, ProductPage, ProductStatus,
    StompCommand, StompFrame, CHAT_TOPIC,
};

pub const PHONE: &str = "0711000000";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "abc123";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// Canned response returned for the next request instead of routing it.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct Backend {
    requests: Arc<Mutex<Vec<Recorded>>>,
    catalog: Arc<Mutex<Vec<Product>>>,
    next: Arc<Mutex<Option<Canned>>>,
    upgrades: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    pub fn with_catalog(products: Vec<Product>) -> Self {
        let backend = Self::default();
        *backend.catalog.lock().unwrap() = products;
        backend
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn respond_next(&self, status: StatusCode, body: &str) {
        *self.next.lock().unwrap() = Some(Canned {
            status,
            body: body.to_string(),
        });
    }

    pub fn catalog(&self) -> Vec<Product> {
        self.catalog.lock().unwrap().clone()
    }

    /// Number of WebSocket upgrades served on `/chat`.
    pub fn upgrades(&self) -> usize {
        self.upgrades.load(Ordering::SeqCst)
    }

    /// Bodies of SEND frames the broker received.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TOKEN}"))
    }
}

pub fn product(id: i64, description: &str, category: Category) -> Product {
    Product {
        id,
        description: description.to_string(),
        status: ProductStatus::Available,
        category,
        price: 1000.0 + id as f64,
        location: "Nairobi".to_string(),
        product_type: "Decor".to_string(),
        condition: Condition::BrandNew,
        image_url: Some(format!("/api/products/uploads/{id}.png")),
        posted_at: None,
        views: Some(0),
    }
}

/// Twelve products, alternating HOME and OFFICE.
pub fn sample_catalog() -> Vec<Product> {
    (1..=12)
        .map(|id| {
            let category = if id % 2 == 1 { Category::Home } else { Category::Office };
            product(id, &format!("Item {id}"), category)
        })
        .collect()
}

pub struct Server {
    pub addr: SocketAddr,
    pub backend: Backend,
}

impl Server {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_url(self.url())
            .with_reconnect_delay(Duration::from_millis(100))
    }

    /// App context with in-memory storage, counting unauthorized callbacks.
    pub fn app(&self) -> (AppContext, SharedStore, Arc<AtomicUsize>) {
        let storage: SharedStore = MemoryStore::shared();
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = expired.clone();
        let app = AppContext::new(self.config(), storage.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (app, storage, expired)
    }
}

pub async fn spawn(backend: Backend) -> Server {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    serve(listener, backend.clone());
    Server { addr, backend }
}

/// Serve the stub backend on an already bound listener.
pub fn serve(listener: tokio::net::TcpListener, backend: Backend) {
    let router = Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/category/{category}", get(list_by_category))
        .route("/api/products/upload", post(upload))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/login", post(login))
        .route("/chat", get(chat_socket))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

async fn record(State(backend): State<Backend>, request: Request, next: Next) -> Response {
    backend.requests.lock().unwrap().push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let canned = backend.next.lock().unwrap().take();
    match canned {
        Some(canned) => (canned.status, canned.body).into_response(),
        None => next.run(request).await,
    }
}

#[derive(Deserialize)]
struct PageParams {
    page: usize,
    size: usize,
}

fn paginate(products: Vec<Product>, params: &PageParams) -> ProductPage {
    let total = products.len();
    let content = products
        .into_iter()
        .skip(params.page * params.size)
        .take(params.size)
        .collect();
    ProductPage {
        content,
        total_elements: total as u64,
        total_pages: total.div_ceil(params.size) as u32,
        number: params.page as u32,
    }
}

async fn list_products(
    State(backend): State<Backend>,
    Query(params): Query<PageParams>,
) -> Json<ProductPage> {
    Json(paginate(backend.catalog(), &params))
}

async fn list_by_category(
    State(backend): State<Backend>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Response {
    let Ok(category) = category.parse::<Category>() else {
        return (StatusCode::BAD_REQUEST, "unknown category").into_response();
    };
    let products = backend
        .catalog()
        .into_iter()
        .filter(|p| p.category == category)
        .collect();
    Json(paginate(products, &params)).into_response()
}

async fn get_product(State(backend): State<Backend>, Path(id): Path<i64>) -> Response {
    match backend.catalog().into_iter().find(|p| p.id == id) {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("Product {id} does not exist") })),
        )
            .into_response(),
    }
}

fn from_draft(id: i64, draft: ProductDraft) -> Product {
    Product {
        id,
        description: draft.description,
        status: draft.status,
        category: draft.category,
        price: draft.price,
        location: draft.location,
        product_type: draft.product_type,
        condition: draft.condition,
        image_url: draft.image_url,
        posted_at: None,
        views: Some(0),
    }
}

async fn create_product(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(draft): Json<ProductDraft>,
) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut catalog = backend.catalog.lock().unwrap();
    let id = catalog.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    let product = from_draft(id, draft);
    catalog.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<ProductDraft>,
) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut catalog = backend.catalog.lock().unwrap();
    match catalog.iter_mut().find(|p| p.id == id) {
        Some(slot) => {
            *slot = from_draft(id, draft);
            Json(slot.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_product(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> StatusCode {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    backend.catalog.lock().unwrap().retain(|p| p.id != id);
    StatusCode::NO_CONTENT
}

async fn upload(
    State(backend): State<Backend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let name = field.file_name().unwrap_or("upload").to_string();
            return format!("/api/products/uploads/{name}").into_response();
        }
    }
    (StatusCode::BAD_REQUEST, "missing image field").into_response()
}

#[derive(Deserialize)]
struct Credentials {
    phone: String,
    password: String,
}

async fn login(Query(credentials): Query<Credentials>) -> Response {
    if credentials.phone == PHONE && credentials.password == PASSWORD {
        TOKEN.into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid phone number or password").into_response()
    }
}

async fn chat_socket(State(backend): State<Backend>, ws: WebSocketUpgrade) -> Response {
    backend.upgrades.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| broker(socket, backend))
}

fn message_frame(subscription: &str, seq: usize, message: &ChatMessage) -> Message {
    let body = serde_json::to_string(message).unwrap();
    let frame = StompFrame::new(StompCommand::Message)
        .header("destination", CHAT_TOPIC)
        .header("subscription", subscription)
        .header("message-id", seq.to_string())
        .header("content-type", "application/json")
        .with_body(body);
    Message::Text(frame.encode().into())
}

/// Minimal STOMP broker: greets every subscriber with two messages and
/// echoes each SEND to the topic.
async fn broker(mut socket: WebSocket, backend: Backend) {
    let mut subscription = String::new();
    let mut seq = 0;

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        for frame in StompFrame::parse_all(text.as_str()).unwrap_or_default() {
            let mut replies = Vec::new();
            match frame.command {
                StompCommand::Connect => {
                    let connected = StompFrame::new(StompCommand::Connected)
                        .header("version", "1.2")
                        .header("heart-beat", "0,0");
                    replies.push(Message::Text(connected.encode().into()));
                }
                StompCommand::Subscribe => {
                    subscription = frame.get("id").unwrap_or_default().to_string();
                    for content in ["hello", "welcome back"] {
                        seq += 1;
                        let greeting = ChatMessage::new("Admin", content);
                        replies.push(message_frame(&subscription, seq, &greeting));
                    }
                }
                StompCommand::Send => {
                    backend.sent.lock().unwrap().push(frame.body.clone());
                    if let Ok(echo) = serde_json::from_str::<ChatMessage>(&frame.body) {
                        seq += 1;
                        replies.push(message_frame(&subscription, seq, &echo));
                    }
                }
                StompCommand::Disconnect => return,
                _ => {}
            }
            for reply in replies {
                if socket.send(reply).await.is_err() {
                    return;
                }
            }
        }
    }
}
