//! State containers.
//!
//! Each container is a deterministic reducer over a snapshot. Async work lives
//! in [`crate::app::AppContext`], which reports progress to the reducers as
//! [`Phase`] values. A [`Store`] wraps a reducer in a `tokio::sync::watch`
//! channel so views can read the current snapshot or await changes.

pub mod auth;
pub mod chat;
pub mod image;
pub mod products;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

pub use auth::{AuthAction, AuthState};
pub use chat::{ChatAction, ChatState};
pub use image::{ImageAction, ImageState};
pub use products::{Catalog, ProductsAction, ProductsState};

/// UI-visible progress of one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Lifecycle event of one async operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<P> {
    Started,
    Succeeded(P),
    Failed(String),
}

impl<P> Phase<P> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Phase::Failed(_))
    }
}

/// Data guarded by the idle/loading/succeeded/failed lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AsyncResource<T> {
    pub status: RequestStatus,
    pub data: T,
    pub error: Option<String>,
}

impl<T> AsyncResource<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: RequestStatus::Idle,
            data,
            error: None,
        }
    }

    /// Advance the lifecycle. `on_success` folds the payload into `data`.
    ///
    /// Loading is informational only: a second `Started` while one request is
    /// in flight is accepted, and results apply in completion order.
    pub fn apply<P>(&mut self, phase: Phase<P>, on_success: impl FnOnce(&mut T, P)) {
        match phase {
            Phase::Started => self.status = RequestStatus::Loading,
            Phase::Succeeded(payload) => {
                self.status = RequestStatus::Succeeded;
                on_success(&mut self.data, payload);
            }
            Phase::Failed(error) => {
                self.status = RequestStatus::Failed;
                self.error = Some(error);
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }
}

/// A pure state transition function.
pub trait Reducer: Clone + Send + Sync + 'static {
    type Action;

    fn reduce(&mut self, action: Self::Action);
}

/// Observable container for one reducer's snapshot.
pub struct Store<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<S: Reducer> Store<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: S::Action) {
        self.tx.send_modify(|state| state.reduce(action));
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read the current snapshot without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that is woken on every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Reducer + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
