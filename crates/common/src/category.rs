//! Fixed set of catalog categories.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electronics,
    Fashion,
    Home,
    Beauty,
    Sports,
    Books,
    Toys,
    Grocery,
}

/// Returned when parsing a category outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid category: {0}")]
pub struct ParseCategoryError(pub String);

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Electronics,
        Category::Fashion,
        Category::Home,
        Category::Beauty,
        Category::Sports,
        Category::Books,
        Category::Toys,
        Category::Grocery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Fashion => "fashion",
            Category::Home => "home",
            Category::Beauty => "beauty",
            Category::Sports => "sports",
            Category::Books => "books",
            Category::Toys => "toys",
            Category::Grocery => "grocery",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
