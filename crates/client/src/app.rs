//! Application context: the HTTP client, the stores, and the chat channel,
//! wired together.
//!
//! Every async action runs the same lifecycle around one service call:
//! dispatch `Started`, await the call, dispatch `Succeeded` or `Failed`, and
//! hand the result back to the caller. Input that fails a local check is
//! rejected before anything is dispatched or sent.

use std::future::Future;

use storefront_shared::{
    ApiError, Category, ChatMessage, PageRequest, Product, ProductDraft, ProductId, ProductPage,
};

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::forms::{FormMode, ImageFile, ProductForm};
use crate::services::{auth::check_credentials, products::page_query, products::require_image};
use crate::storage::{self, Preferences, SharedStore};
use crate::stores::{
    AuthAction, AuthState, ChatState, ImageAction, ImageState, Phase, ProductsAction,
    ProductsState, Reducer, Store,
};
use crate::ws::{ChannelSettings, ChatError, ChatManager, ChatSubscription, ReconnectConfig};

const FETCH_PRODUCTS_FAILED: &str = "Failed to fetch products";
const FETCH_CATEGORY_FAILED: &str = "Failed to fetch products by category";
const PRODUCT_NOT_FOUND: &str = "Product not found";
const CREATE_FAILED: &str = "Failed to create product";
const UPDATE_FAILED: &str = "Failed to update product";
const DELETE_FAILED: &str = "Failed to delete product";
const UPLOAD_FAILED: &str = "Failed to upload image";
const LOGIN_FAILED: &str = "Login failed";

/// Sender label for chat messages from a signed-in session.
pub const ADMIN_SENDER: &str = "Admin";
/// Sender label for anonymous chat messages.
pub const USER_SENDER: &str = "User";

#[derive(Clone)]
pub struct AppContext {
    config: ClientConfig,
    api: ApiClient,
    storage: SharedStore,
    auth: Store<AuthState>,
    products: Store<ProductsState>,
    image: Store<ImageState>,
    chat: Store<ChatState>,
    chat_manager: ChatManager,
}

impl AppContext {
    /// Build the context. `on_unauthorized` runs after any 401, once the
    /// session has already been cleared; hosts use it to send the user back
    /// to the login screen.
    pub fn new(
        config: ClientConfig,
        storage: SharedStore,
        on_unauthorized: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        let auth = Store::new(AuthState::restored(storage::load_token(storage.as_ref())));

        let expired = auth.clone();
        let api = ApiClient::new(storage.clone())
            .with_base_url(config.api_url.clone())
            .on_unauthorized(move || {
                expired.dispatch(AuthAction::SessionExpired);
                on_unauthorized();
            });

        let chat = Store::default();
        let settings = ChannelSettings {
            url: config.ws_url(),
            broker_host: config.broker_host(),
            reconnect: ReconnectConfig {
                delay: config.reconnect_delay,
            },
        };
        let chat_manager = ChatManager::new(settings, chat.clone());

        Self {
            config,
            api,
            storage,
            auth,
            products: Store::default(),
            image: Store::default(),
            chat,
            chat_manager,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &Store<AuthState> {
        &self.auth
    }

    pub fn products(&self) -> &Store<ProductsState> {
        &self.products
    }

    pub fn image(&self) -> &Store<ImageState> {
        &self.image
    }

    pub fn chat(&self) -> &Store<ChatState> {
        &self.chat
    }

    pub fn chat_manager(&self) -> &ChatManager {
        &self.chat_manager
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.storage.clone())
    }

    // ---- session ----

    /// Exchange credentials for a token and persist it.
    pub async fn login(&self, phone: &str, password: &str) -> Result<String, ApiError> {
        check_credentials(phone, password)?;

        let result = track(
            &self.auth,
            AuthAction::Login,
            LOGIN_FAILED,
            self.api.login(phone, password),
        )
        .await;
        match &result {
            Ok(token) => {
                if !storage::save_token(self.storage.as_ref(), token) {
                    tracing::warn!("token could not be persisted, session lasts until exit");
                }
                tracing::info!("logged in");
            }
            Err(_) => storage::clear_token(self.storage.as_ref()),
        }
        result
    }

    pub fn logout(&self) {
        storage::clear_token(self.storage.as_ref());
        self.auth.dispatch(AuthAction::Logout);
        tracing::info!("logged out");
    }

    /// "Admin" while a token is stored, "User" otherwise.
    pub fn chat_sender(&self) -> &'static str {
        if storage::load_token(self.storage.as_ref()).is_some() {
            ADMIN_SENDER
        } else {
            USER_SENDER
        }
    }

    // ---- catalog ----

    pub async fn fetch_products(&self, request: PageRequest) -> Result<ProductPage, ApiError> {
        page_query(request)?;
        track(
            &self.products,
            |phase| ProductsAction::FetchPage {
                request,
                category: None,
                phase,
            },
            FETCH_PRODUCTS_FAILED,
            self.api.list_products(request),
        )
        .await
    }

    pub async fn fetch_products_by_category(
        &self,
        category: Category,
        request: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        page_query(request)?;
        track(
            &self.products,
            |phase| ProductsAction::FetchPage {
                request,
                category: Some(category),
                phase,
            },
            FETCH_CATEGORY_FAILED,
            self.api.list_products_by_category(category, request),
        )
        .await
    }

    pub async fn fetch_product(&self, id: ProductId) -> Result<Product, ApiError> {
        track(
            &self.products,
            ProductsAction::FetchOne,
            PRODUCT_NOT_FOUND,
            self.api.get_product(id),
        )
        .await
    }

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        require_image(draft)?;
        track(
            &self.products,
            ProductsAction::Create,
            CREATE_FAILED,
            self.api.create_product(draft),
        )
        .await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        track(
            &self.products,
            ProductsAction::Update,
            UPDATE_FAILED,
            self.api.update_product(id, draft),
        )
        .await
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<ProductId, ApiError> {
        track(
            &self.products,
            ProductsAction::Delete,
            DELETE_FAILED,
            async move { self.api.delete_product(id).await.map(|()| id) },
        )
        .await
    }

    pub fn clear_error(&self) {
        self.products.dispatch(ProductsAction::ClearError);
    }

    pub fn clear_selected(&self) {
        self.products.dispatch(ProductsAction::ClearSelected);
    }

    // ---- images ----

    pub async fn upload_image(&self, file: &ImageFile) -> Result<String, ApiError> {
        file.validate()?;
        track(
            &self.image,
            ImageAction::Upload,
            UPLOAD_FAILED,
            self.api.upload_image(file),
        )
        .await
    }

    pub fn clear_image(&self) {
        self.image.dispatch(ImageAction::Clear);
    }

    /// Admin form submit: create or update using the image in the image store.
    ///
    /// A successful create is followed by a refetch of the first page.
    pub async fn submit_product(
        &self,
        form: ProductForm,
        mode: &FormMode,
    ) -> Result<Product, ApiError> {
        form.validate()?;
        let uploaded = self.image.read(|img| img.ready_url().map(str::to_string));
        let image_url = mode.resolve_image_url(uploaded.as_deref())?;
        let draft = form.into_draft(image_url)?;

        let product = match mode {
            FormMode::Add => self.create_product(&draft).await?,
            FormMode::Edit(existing) => self.update_product(existing.id, &draft).await?,
        };
        self.clear_image();

        if matches!(mode, FormMode::Add) {
            if let Err(e) = self.fetch_products(self.config.first_page()).await {
                tracing::warn!(error = %e, "refetch after create failed");
            }
        }

        Ok(product)
    }

    // ---- chat ----

    /// Join the shared chat channel. The connection stays open while any
    /// returned subscription is alive.
    pub fn open_chat(&self) -> ChatSubscription {
        self.chat_manager.subscribe()
    }

    /// Publish `content` under the current sender label. Blank input is
    /// ignored and yields `Ok(None)`.
    pub fn send_chat(&self, content: &str) -> Result<Option<ChatMessage>, ChatError> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let message = ChatMessage::new(self.chat_sender(), content);
        self.chat_manager.publish(&message)?;
        Ok(Some(message))
    }
}

/// Run `call` through the Started / Succeeded / Failed phases of `store`.
async fn track<S, T>(
    store: &Store<S>,
    action: impl Fn(Phase<T>) -> S::Action,
    default_message: &str,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError>
where
    S: Reducer,
    T: Clone,
{
    store.dispatch(action(Phase::Started));
    match call.await {
        Ok(value) => {
            store.dispatch(action(Phase::Succeeded(value.clone())));
            Ok(value)
        }
        Err(e) => {
            let message = e.message_or(default_message);
            tracing::warn!(error = %e, %message, "action failed");
            store.dispatch(action(Phase::Failed(message)));
            Err(e)
        }
    }
}
