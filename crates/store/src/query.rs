use common::Category;

use crate::Product;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Builder for filtered, paginated catalog reads.
///
/// Pages are 1-based. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Filter by category.
    pub category: Option<Category>,

    /// Case-insensitive substring matched against name, description and brand.
    pub search: Option<String>,

    /// Include products with `is_visible = false`.
    pub include_hidden: bool,

    /// 1-based page number.
    pub page: u32,

    /// Maximum number of products per page.
    pub limit: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            include_hidden: false,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ProductQuery {
    /// Creates a query for the first page of visible products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Filters by a search term. Blank terms are ignored.
    pub fn search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    /// Includes hidden products (admin listing).
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Selects a page, clamped to at least 1.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    /// Number of matching products to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Lowercased search needle, if any.
    pub fn search_needle(&self) -> Option<String> {
        self.search.as_deref().map(str::to_lowercase)
    }
}

/// One page of a catalog read.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub limit: u32,
    /// Number of products matching the filter across all pages.
    pub total: u64,
}

impl ProductPage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.limit.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let query = ProductQuery::new();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);
        assert!(!query.include_hidden);
    }

    #[test]
    fn clamps_page_and_limit() {
        let query = ProductQuery::new().page(0).limit(1_000);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_LIMIT);

        let query = ProductQuery::new().limit(0);
        assert_eq!(query.limit, 1);
    }

    #[test]
    fn offset_follows_page() {
        let query = ProductQuery::new().page(3).limit(20);
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(ProductQuery::new().search("   ").search, None);
        let query = ProductQuery::new().search("  Lamp ");
        assert_eq!(query.search.as_deref(), Some("Lamp"));
        assert_eq!(query.search_needle().as_deref(), Some("lamp"));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = ProductPage {
            products: vec![],
            page: 1,
            limit: 10,
            total: 21,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
