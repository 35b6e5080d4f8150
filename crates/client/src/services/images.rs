//! Product image upload.

use reqwest::multipart::{Form, Part};
use storefront_shared::{ApiError, UPLOAD_FIELD, UPLOAD_PATH};

use super::extract_text;
use crate::api_client::ApiClient;
use crate::forms::ImageFile;

impl ApiClient {
    /// `POST /api/products/upload` as multipart field `image`.
    ///
    /// Returns the relative URL the backend assigned to the stored file.
    pub async fn upload_image(&self, file: &ImageFile) -> Result<String, ApiError> {
        file.validate()?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::Precondition(format!("Invalid image type: {e}")))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let body = self.post_multipart_text(UPLOAD_PATH, form).await?;
        let url = extract_text(&body)
            .ok_or_else(|| ApiError::Deserialize("upload response carried no URL".to_string()))?;

        tracing::info!(file = %file.file_name, %url, "image uploaded");
        Ok(url)
    }
}
