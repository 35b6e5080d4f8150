//! Storefront Client
//!
//! Async client for the storefront backend: a bearer-authorized HTTP wrapper,
//! one service call per catalog/upload/login operation, observable state
//! stores, and a STOMP chat channel. [`AppContext`] wires them together.

pub mod api_client;
pub mod app;
pub mod config;
pub mod forms;
pub mod logging;
pub mod services;
pub mod storage;
pub mod stores;
pub mod ws;

pub use api_client::ApiClient;
pub use app::AppContext;
pub use config::ClientConfig;
pub use forms::{FormError, FormMode, ImageFile, ProductForm};
pub use storage::{FileStore, MemoryStore, Preferences, SessionStore, SharedStore};
pub use ws::{ChatError, ChatManager, ChatSubscription, ConnectionState};
