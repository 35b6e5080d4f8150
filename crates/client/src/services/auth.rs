//! Session login.

use storefront_shared::{ApiError, LOGIN_PATH};

use super::extract_text;
use crate::api_client::ApiClient;

pub(crate) fn check_credentials(phone: &str, password: &str) -> Result<(), ApiError> {
    if phone.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Precondition(
            "Phone and password are required".to_string(),
        ));
    }
    Ok(())
}

impl ApiClient {
    /// `POST /login?phone&password`, returning the opaque bearer token.
    ///
    /// Does not persist the token; that is the session's job.
    pub async fn login(&self, phone: &str, password: &str) -> Result<String, ApiError> {
        check_credentials(phone, password)?;

        let query = [
            ("phone", phone.trim().to_string()),
            ("password", password.to_string()),
        ];
        let body = self.post_query_text(LOGIN_PATH, &query).await?;

        extract_text(&body)
            .ok_or_else(|| ApiError::Deserialize("login response carried no token".to_string()))
    }
}
