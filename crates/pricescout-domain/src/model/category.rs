//! Device categories and their base resale prices

use serde::Serialize;

/// A label keyword and the base price of devices it identifies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceCategory {
    pub keyword: &'static str,
    pub base_price: f64,
}

/// Base price when no category keyword matches
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

/// Category table, checked in order. The first keyword contained in the
/// label wins, so "laptop camera" resolves to laptop.
pub const PRICE_CATEGORIES: &[PriceCategory] = &[
    PriceCategory { keyword: "phone", base_price: 600.0 },
    PriceCategory { keyword: "laptop", base_price: 1000.0 },
    PriceCategory { keyword: "camera", base_price: 700.0 },
    PriceCategory { keyword: "monitor", base_price: 300.0 },
    PriceCategory { keyword: "television", base_price: 400.0 },
    PriceCategory { keyword: "keyboard", base_price: 80.0 },
];

/// Find the first category whose keyword appears in `label` (case-insensitive)
pub fn find_category(label: &str) -> Option<&'static PriceCategory> {
    let normalized = label.to_lowercase();
    PRICE_CATEGORIES
        .iter()
        .find(|category| normalized.contains(category.keyword))
}
