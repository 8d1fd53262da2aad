//! Catalog commands and queries.

use common::{Category, Money};
use store::ProductQuery;

use super::CatalogError;

/// Command to add a product to the catalog.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub brand: String,
    /// Category wire name, e.g. `electronics`.
    pub category: String,
    pub price_cents: i64,
    pub stock: u32,
    pub image: Option<String>,
    pub is_visible: bool,
}

impl CreateProduct {
    /// Validates the command and returns the trimmed name, category and price.
    pub fn validate(&self) -> Result<(String, Category, Money), CatalogError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CatalogError::MissingName);
        }
        let category = self
            .category
            .parse::<Category>()
            .map_err(|e| CatalogError::InvalidCategory(e.0))?;
        if self.price_cents < 0 {
            return Err(CatalogError::NegativePrice(self.price_cents));
        }
        Ok((name.to_string(), category, Money::from_cents(self.price_cents)))
    }
}

/// Catalog listing parameters as supplied by a caller.
#[derive(Debug, Clone, Default)]
pub struct ListProducts {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListProducts {
    /// Builds the store query. Non-admin callers only see visible products.
    pub fn to_query(&self, is_admin: bool) -> Result<ProductQuery, CatalogError> {
        let mut query = ProductQuery::new().include_hidden(is_admin);

        if let Some(category) = self.category.as_deref().map(str::trim)
            && !category.is_empty()
        {
            let category = category
                .parse::<Category>()
                .map_err(|e| CatalogError::InvalidCategory(e.0))?;
            query = query.category(category);
        }
        if let Some(search) = &self.search {
            query = query.search(search);
        }
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, category: &str, price_cents: i64) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: String::new(),
            brand: "Acme".to_string(),
            category: category.to_string(),
            price_cents,
            stock: 1,
            image: None,
            is_visible: true,
        }
    }

    #[test]
    fn validate_create_product() {
        let (name, category, price) = create("  Lamp ", "Home", 1999).validate().unwrap();
        assert_eq!(name, "Lamp");
        assert_eq!(category, Category::Home);
        assert_eq!(price, Money::from_cents(1999));

        assert!(matches!(
            create(" ", "home", 1).validate(),
            Err(CatalogError::MissingName)
        ));
        assert!(matches!(
            create("Lamp", "furniture", 1).validate(),
            Err(CatalogError::InvalidCategory(_))
        ));
        assert!(matches!(
            create("Lamp", "home", -1).validate(),
            Err(CatalogError::NegativePrice(-1))
        ));
    }

    #[test]
    fn listing_defaults_hide_invisible_products() {
        let query = ListProducts::default().to_query(false).unwrap();
        assert!(!query.include_hidden);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, store::DEFAULT_PAGE_LIMIT);

        let query = ListProducts::default().to_query(true).unwrap();
        assert!(query.include_hidden);
    }

    #[test]
    fn listing_parses_and_clamps() {
        let list = ListProducts {
            category: Some("books".to_string()),
            search: Some(" novel ".to_string()),
            page: Some(0),
            limit: Some(500),
        };
        let query = list.to_query(false).unwrap();
        assert_eq!(query.category, Some(Category::Books));
        assert_eq!(query.search.as_deref(), Some("novel"));
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, store::MAX_PAGE_LIMIT);
    }

    #[test]
    fn listing_rejects_unknown_category() {
        let list = ListProducts {
            category: Some("weapons".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            list.to_query(false),
            Err(CatalogError::InvalidCategory(ref c)) if c == "weapons"
        ));
    }
}
