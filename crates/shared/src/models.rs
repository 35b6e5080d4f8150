//! Shared data models for the storefront catalog and chat.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-assigned product identifier.
pub type ProductId = i64;

// --- Enumerations ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    #[default]
    Available,
    Sold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[default]
    Home,
    Office,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Home, Category::Office];

    /// Path segment used by `/api/products/category/{category}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Home => "HOME",
            Category::Office => "OFFICE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts both the wire form ("HOME") and the display form ("Home").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOME" => Ok(Category::Home),
            "OFFICE" => Ok(Category::Office),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Condition {
    #[default]
    #[serde(rename = "BRAND NEW")]
    BrandNew,
    #[serde(rename = "USED")]
    Used,
}

impl Condition {
    /// Wire spelling, e.g. `BRAND NEW`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::BrandNew => "BRAND NEW",
            Condition::Used => "USED",
        }
    }
}

// --- Catalog ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub status: ProductStatus,
    pub category: Category,
    pub price: f64,
    pub location: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub condition: Condition,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

/// Body of create and update requests. The server owns `id`, `postedAt` and `views`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub description: String,
    pub status: ProductStatus,
    pub category: Category,
    pub price: f64,
    pub location: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub condition: Condition,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductDraft {
    fn from(p: &Product) -> Self {
        Self {
            description: p.description.clone(),
            status: p.status,
            category: p.category,
            price: p.price,
            location: p.location.clone(),
            product_type: p.product_type.clone(),
            condition: p.condition,
            image_url: p.image_url.clone(),
        }
    }
}

/// One page of a paginated product listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub content: Vec<Product>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based index of this page.
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn first(size: u32) -> Self {
        Self { page: 0, size }
    }

    pub fn is_valid(&self) -> bool {
        self.size > 0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(Self::DEFAULT_SIZE)
    }
}

// --- Chat ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}
