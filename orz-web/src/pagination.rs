//! Page size normalization
//!
//! List operations accept a client supplied page size. [`adjust_page_size`]
//! replaces missing or non-positive sizes with the configured default and caps
//! everything at the configured maximum.
//!
//! ```rust
//! use orz_web::pagination::{adjust_page_size, PageConfig};
//!
//! let page = PageConfig::default();
//! assert_eq!(adjust_page_size(None, &page), 50);
//! assert_eq!(adjust_page_size(Some(20), &page), 20);
//! assert_eq!(adjust_page_size(Some(500), &page), 100);
//! ```

use serde::{Deserialize, Serialize};

/// Page size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Size used when the client sends none
    pub default_size: i64,
    /// Largest size ever answered
    pub max_size: i64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_size: 50,
            max_size: 100,
        }
    }
}

/// Normalize a requested page size
pub fn adjust_page_size(size: Option<i64>, page: &PageConfig) -> i64 {
    let size = size.filter(|s| *s > 0).unwrap_or(page.default_size);
    size.min(page.max_size)
}
