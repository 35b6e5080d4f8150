//! Product catalog endpoints.

use storefront_shared::{
    ApiError, Category, PageRequest, Product, ProductDraft, ProductId, ProductPage,
    PRODUCTS_BY_CATEGORY_PATH, PRODUCTS_PATH,
};

use crate::api_client::ApiClient;

pub(crate) fn page_query(page: PageRequest) -> Result<[(&'static str, String); 2], ApiError> {
    if !page.is_valid() {
        return Err(ApiError::Precondition("Page size must be greater than zero".to_string()));
    }
    Ok([("page", page.page.to_string()), ("size", page.size.to_string())])
}

pub(crate) fn require_image(draft: &ProductDraft) -> Result<(), ApiError> {
    let has_image = draft
        .image_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty());
    if has_image {
        Ok(())
    } else {
        Err(ApiError::Precondition(
            "A new product needs an uploaded image".to_string(),
        ))
    }
}

impl ApiClient {
    /// `GET /api/products?page&size`
    pub async fn list_products(&self, page: PageRequest) -> Result<ProductPage, ApiError> {
        let query = page_query(page)?;
        self.get_json(PRODUCTS_PATH, &query).await
    }

    /// `GET /api/products/category/{category}?page&size`
    pub async fn list_products_by_category(
        &self,
        category: Category,
        page: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        let query = page_query(page)?;
        self.get_json(&format!("{PRODUCTS_BY_CATEGORY_PATH}/{category}"), &query)
            .await
    }

    /// `GET /api/products/{id}`; an unknown id yields [`ApiError::NotFound`].
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get_json(&format!("{PRODUCTS_PATH}/{id}"), &[]).await
    }

    /// `POST /api/products`. New products must already have an uploaded image.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        require_image(draft)?;
        self.post_json(PRODUCTS_PATH, draft).await
    }

    /// `PUT /api/products/{id}`
    pub async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        self.put_json(&format!("{PRODUCTS_PATH}/{id}"), draft).await
    }

    /// `DELETE /api/products/{id}`
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("{PRODUCTS_PATH}/{id}")).await
    }
}
