//! Catalog query engine: filtering, search and pagination over a snapshot
//! of the product store. Pure functions, no state of their own.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Product;
use crate::store::ProductStore;

#[derive(Clone, Debug, Default)]
pub struct CatalogFilter {
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring match over title and description.
    pub search: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort: SortKey,
}

/// Explicit reorder applied before pagination. `Unsorted` preserves the
/// store's iteration order, which is the contract most callers rely on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Unsorted,
    PriceAsc,
    PriceDesc,
    Title,
}

/// One page of results plus the page count for the whole filtered set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
}

/// Slices one 1-based page out of the full result set.
///
/// `total_pages` is the ceiling of `len / page_size`; a page past the end is
/// a valid empty slice, not an error.
pub fn paginate<T>(mut items: Vec<T>, page: usize, page_size: usize) -> Paginated<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let items = if start >= items.len() {
        Vec::new()
    } else {
        items.truncate(items.len().min(start + page_size));
        items.split_off(start)
    };
    Paginated { items, total_pages }
}

/// Filters the active catalog and returns the requested page.
pub fn query(
    store: &ProductStore,
    filter: &CatalogFilter,
    page: usize,
    page_size: usize,
) -> Paginated<Product> {
    let mut products = store.list_active();

    if let Some(category) = filter.category.as_deref() {
        let category = category.to_lowercase();
        products.retain(|p| p.category.to_lowercase() == category);
    }
    if let Some(search) = filter.search.as_deref() {
        let needle = search.to_lowercase();
        products.retain(|p| {
            p.title.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        });
    }
    if let Some(min) = filter.price_min {
        products.retain(|p| p.price >= min);
    }
    if let Some(max) = filter.price_max {
        products.retain(|p| p.price <= max);
    }

    match filter.sort {
        SortKey::Unsorted => {}
        SortKey::PriceAsc => products.sort_by_key(|p| p.price),
        SortKey::PriceDesc => {
            products.sort_by_key(|p| p.price);
            products.reverse();
        }
        SortKey::Title => products.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    paginate(products, page, page_size)
}
