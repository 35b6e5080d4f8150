//! HTTP API client with bearer-token authorization.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_shared::{ApiError, PUBLIC_GET_PREFIXES};

use crate::storage::{self, SharedStore};

/// Invoked once for every 401 response, after the persisted token is gone.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client for the storefront backend.
///
/// Every request reads the persisted token; non-public requests carry it as
/// `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SharedStore,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client reading its token from `store`
    pub fn new(store: SharedStore) -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            store,
            on_unauthorized: None,
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Register the callback fired on 401 responses
    pub fn on_unauthorized(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The token that would be attached to the next non-public request.
    pub fn token(&self) -> Option<String> {
        storage::load_token(self.store.as_ref())
    }

    /// Public endpoints are GETs under the catalog and upload prefixes.
    pub fn is_public(method: &Method, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        *method == Method::GET
            && PUBLIC_GET_PREFIXES
                .iter()
                .any(|prefix| path.starts_with(prefix))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    /// Start a request, attaching the bearer token unless the endpoint is public.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let public = Self::is_public(&method, path);
        let mut rb = self.client.request(method.clone(), self.url(path));

        match self.token() {
            Some(token) if !public => {
                rb = rb.bearer_auth(token);
                tracing::debug!(%method, path, "sending authorized request");
            }
            _ => tracing::debug!(%method, path, public, "sending request"),
        }

        rb
    }

    /// Send a prepared request and return the body text of a 2xx response.
    async fn execute(&self, method: Method, path: &str, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = rb.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(self.handle_failure(&method, path, status, text));
        }

        Ok(text)
    }

    fn handle_failure(&self, method: &Method, path: &str, status: u16, body: String) -> ApiError {
        match status {
            401 => {
                tracing::warn!(%method, path, "unauthorized, clearing session token");
                storage::clear_token(self.store.as_ref());
                if let Some(hook) = &self.on_unauthorized {
                    hook();
                }
            }
            400 => tracing::warn!(%method, path, body = %body, "validation error"),
            _ => tracing::warn!(%method, path, status, "request rejected"),
        }
        ApiError::from_status(status, body)
    }

    fn decode<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
        let text = if text.is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// Make a GET request with query parameters
    pub async fn get_json<TRes: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<TRes, ApiError> {
        let rb = self.request(Method::GET, path).query(query);
        let text = self.execute(Method::GET, path, rb).await?;
        Self::decode(&text)
    }

    /// Make a POST request with JSON body
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = self.request(Method::POST, path).json(body);
        let text = self.execute(Method::POST, path, rb).await?;
        Self::decode(&text)
    }

    /// Make a PUT request with JSON body
    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let rb = self.request(Method::PUT, path).json(body);
        let text = self.execute(Method::PUT, path, rb).await?;
        Self::decode(&text)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let rb = self.request(Method::DELETE, path);
        self.execute(Method::DELETE, path, rb).await?;
        Ok(())
    }

    /// Make a POST request with query parameters and no body, returning the raw text.
    pub async fn post_query_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let rb = self.request(Method::POST, path).query(query);
        self.execute(Method::POST, path, rb).await
    }

    /// Make a multipart POST request, returning the raw text.
    pub async fn post_multipart_text(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<String, ApiError> {
        let rb = self.request(Method::POST, path).multipart(form);
        self.execute(Method::POST, path, rb).await
    }
}
