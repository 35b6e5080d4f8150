//! Authentication state.

use super::{AsyncResource, Phase, Reducer, RequestStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    Login(Phase<String>),
    /// User-initiated sign out.
    Logout,
    /// The backend answered 401; the session is no longer valid.
    SessionExpired,
}

/// Holds the bearer token once a login has succeeded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthState {
    session: AsyncResource<Option<String>>,
}

impl AuthState {
    /// Start from a token restored from durable storage.
    pub fn restored(token: Option<String>) -> Self {
        Self {
            session: AsyncResource::new(token),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.session.data.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.data.is_some()
    }

    pub fn status(&self) -> RequestStatus {
        self.session.status
    }

    pub fn error(&self) -> Option<&str> {
        self.session.error.as_deref()
    }
}

impl Reducer for AuthState {
    type Action = AuthAction;

    fn reduce(&mut self, action: AuthAction) {
        match action {
            AuthAction::Login(phase) => {
                let failed = phase.is_failed();
                if matches!(phase, Phase::Started) {
                    self.session.clear_error();
                }
                self.session.apply(phase, |token, t| *token = Some(t));
                if failed {
                    self.session.data = None;
                }
            }
            AuthAction::Logout | AuthAction::SessionExpired => {
                self.session.data = None;
            }
        }
    }
}
