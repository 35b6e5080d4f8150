//! Product form and image file validation.
//!
//! Everything here runs before a request is built, so a failing check never
//! reaches the network.

use storefront_shared::{ApiError, Category, Condition, Product, ProductDraft, ProductStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in all product details.")]
    MissingFields,
    #[error("Price must be a non-negative number, got {0:?}")]
    InvalidPrice(String),
    #[error("Please upload an image for a new product and wait for the upload to complete.")]
    MissingImage,
    #[error("Please select an image file (e.g., .jpg, .png), got {0:?}")]
    NotAnImage(String),
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        ApiError::Precondition(e.to_string())
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.is_image() {
            Ok(())
        } else {
            Err(FormError::NotAnImage(self.content_type.clone()))
        }
    }
}

/// Whether the form creates a new product or edits an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Add,
    Edit(Product),
}

impl FormMode {
    /// Pick the image URL to submit.
    ///
    /// Adding requires a freshly uploaded image; editing falls back to the
    /// product's current image when nothing new was uploaded.
    pub fn resolve_image_url(&self, uploaded: Option<&str>) -> Result<Option<String>, FormError> {
        let uploaded = uploaded.filter(|u| !u.trim().is_empty());
        match (self, uploaded) {
            (_, Some(url)) => Ok(Some(url.to_string())),
            (FormMode::Add, None) => Err(FormError::MissingImage),
            (FormMode::Edit(product), None) => Ok(product.image_url.clone()),
        }
    }
}

/// Raw admin form input. Price stays text until validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub description: String,
    pub status: ProductStatus,
    pub category: Category,
    pub price: String,
    pub location: String,
    pub product_type: String,
    pub condition: Condition,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            description: String::new(),
            status: ProductStatus::Available,
            category: Category::Home,
            price: String::new(),
            location: String::new(),
            product_type: String::new(),
            condition: Condition::BrandNew,
        }
    }
}

impl ProductForm {
    /// Prefill for edit mode.
    pub fn from_product(product: &Product) -> Self {
        Self {
            description: product.description.clone(),
            status: product.status,
            category: product.category,
            price: product.price.to_string(),
            location: product.location.clone(),
            product_type: product.product_type.clone(),
            condition: product.condition,
        }
    }

    /// Check required fields and return the parsed price.
    pub fn validate(&self) -> Result<f64, FormError> {
        let blank = [
            &self.description,
            &self.price,
            &self.location,
            &self.product_type,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if blank {
            return Err(FormError::MissingFields);
        }

        match self.price.trim().parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
            _ => Err(FormError::InvalidPrice(self.price.clone())),
        }
    }

    pub fn into_draft(self, image_url: Option<String>) -> Result<ProductDraft, FormError> {
        let price = self.validate()?;
        Ok(ProductDraft {
            description: self.description.trim().to_string(),
            status: self.status,
            category: self.category,
            price,
            location: self.location.trim().to_string(),
            product_type: self.product_type.trim().to_string(),
            condition: self.condition,
            image_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ProductForm {
        ProductForm {
            description: "Abstract canvas".into(),
            price: "2500".into(),
            location: "Nairobi".into(),
            product_type: "Wall art".into(),
            ..ProductForm::default()
        }
    }

    fn product() -> Product {
        Product {
            id: 9,
            description: "Desk".into(),
            status: ProductStatus::Sold,
            category: Category::Office,
            price: 99.5,
            location: "Kisumu".into(),
            product_type: "Desk".into(),
            condition: Condition::Used,
            image_url: Some("/api/products/uploads/desk.png".into()),
            posted_at: None,
            views: Some(3),
        }
    }

    #[test]
    fn default_form_matches_admin_defaults() {
        let form = ProductForm::default();
        assert_eq!(form.status, ProductStatus::Available);
        assert_eq!(form.category, Category::Home);
        assert_eq!(form.condition, Condition::BrandNew);
        assert_eq!(form.validate(), Err(FormError::MissingFields));
    }

    #[test]
    fn blank_field_is_rejected() {
        let mut form = filled();
        form.location = "   ".into();
        assert_eq!(form.validate(), Err(FormError::MissingFields));
    }

    #[test]
    fn price_must_be_non_negative_number() {
        let mut form = filled();
        form.price = "-1".into();
        assert!(matches!(form.validate(), Err(FormError::InvalidPrice(_))));
        form.price = "cheap".into();
        assert!(matches!(form.validate(), Err(FormError::InvalidPrice(_))));
        form.price = " 12.50 ".into();
        assert_eq!(form.validate(), Ok(12.5));
    }

    #[test]
    fn into_draft_trims_and_keeps_image() {
        let mut form = filled();
        form.description = "  Abstract canvas ".into();
        let draft = form.into_draft(Some("/api/products/uploads/x.png".into())).unwrap();
        assert_eq!(draft.description, "Abstract canvas");
        assert_eq!(draft.price, 2500.0);
        assert_eq!(draft.image_url.as_deref(), Some("/api/products/uploads/x.png"));
    }

    #[test]
    fn edit_prefill_round_trips() {
        let p = product();
        let draft = ProductForm::from_product(&p).into_draft(p.image_url.clone()).unwrap();
        assert_eq!(draft, ProductDraft::from(&p));
    }

    #[test]
    fn add_mode_requires_uploaded_image() {
        assert_eq!(FormMode::Add.resolve_image_url(None), Err(FormError::MissingImage));
        assert_eq!(FormMode::Add.resolve_image_url(Some(" ")), Err(FormError::MissingImage));
        assert_eq!(
            FormMode::Add.resolve_image_url(Some("/u/new.png")),
            Ok(Some("/u/new.png".to_string()))
        );
    }

    #[test]
    fn edit_mode_reuses_existing_image() {
        let mode = FormMode::Edit(product());
        assert_eq!(
            mode.resolve_image_url(None),
            Ok(Some("/api/products/uploads/desk.png".to_string()))
        );
        assert_eq!(
            mode.resolve_image_url(Some("/u/new.png")),
            Ok(Some("/u/new.png".to_string()))
        );
    }

    #[test]
    fn image_mime_check() {
        assert!(ImageFile::new("a.png", "image/png", vec![1, 2]).validate().is_ok());
        assert!(ImageFile::new("a.JPG", "IMAGE/JPEG", vec![]).is_image());
        let err = ImageFile::new("a.pdf", "application/pdf", vec![]).validate().unwrap_err();
        assert_eq!(err, FormError::NotAnImage("application/pdf".into()));
        assert!(matches!(ApiError::from(err), ApiError::Precondition(_)));
    }
}
