//! Product catalog state: the current page plus the selected product.

use storefront_shared::{Category, PageRequest, Product, ProductId, ProductPage};

use super::{AsyncResource, Phase, Reducer, RequestStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum ProductsAction {
    /// Listing of all products (`category: None`) or one category.
    FetchPage {
        request: PageRequest,
        category: Option<Category>,
        phase: Phase<ProductPage>,
    },
    FetchOne(Phase<Product>),
    Create(Phase<Product>),
    Update(Phase<Product>),
    Delete(Phase<ProductId>),
    ClearError,
    ClearSelected,
}

/// Cached, possibly stale, copy of the backend catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub selected: Option<Product>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub current_page: u32,
    /// Category of the last successful listing; `None` for all products.
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductsState {
    catalog: AsyncResource<Catalog>,
}

impl ProductsState {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog.data
    }

    pub fn products(&self) -> &[Product] {
        &self.catalog.data.products
    }

    pub fn selected(&self) -> Option<&Product> {
        self.catalog.data.selected.as_ref()
    }

    pub fn status(&self) -> RequestStatus {
        self.catalog.status
    }

    pub fn error(&self) -> Option<&str> {
        self.catalog.error.as_deref()
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products().iter().find(|p| p.id == id)
    }

    /// Products on the current page whose description contains `query`,
    /// ignoring case. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products()
            .iter()
            .filter(|p| needle.is_empty() || p.description.to_lowercase().contains(&needle))
            .collect()
    }
}

impl Reducer for ProductsState {
    type Action = ProductsAction;

    fn reduce(&mut self, action: ProductsAction) {
        match action {
            ProductsAction::FetchPage {
                request,
                category,
                phase,
            } => self.catalog.apply(phase, |catalog, page| {
                let mut content = page.content;
                content.truncate(request.size as usize);
                catalog.products = content;
                catalog.total_elements = page.total_elements;
                catalog.total_pages = page.total_pages;
                catalog.current_page = page.number;
                catalog.category = category;
            }),
            ProductsAction::FetchOne(phase) => {
                let failed = phase.is_failed();
                self.catalog
                    .apply(phase, |catalog, product| catalog.selected = Some(product));
                if failed {
                    self.catalog.data.selected = None;
                }
            }
            ProductsAction::Create(phase) => self
                .catalog
                .apply(phase, |catalog, product| catalog.products.push(product)),
            ProductsAction::Update(phase) => self.catalog.apply(phase, |catalog, product| {
                if let Some(slot) = catalog.products.iter_mut().find(|p| p.id == product.id) {
                    *slot = product.clone();
                }
                if catalog.selected.as_ref().is_some_and(|s| s.id == product.id) {
                    catalog.selected = Some(product);
                }
            }),
            ProductsAction::Delete(phase) => self.catalog.apply(phase, |catalog, id| {
                catalog.products.retain(|p| p.id != id);
                if catalog.selected.as_ref().is_some_and(|s| s.id == id) {
                    catalog.selected = None;
                }
            }),
            ProductsAction::ClearError => self.catalog.clear_error(),
            ProductsAction::ClearSelected => self.catalog.data.selected = None,
        }
    }
}
