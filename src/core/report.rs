//! Dashboard figures.
//!
//! Framework-agnostic numbers derived from the current snapshots; the bot layer formats them.

use super::{
    need::{Need, StatusSummary, status_summary},
    product::{Product, categories},
};

/// Overview shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Products in the warehouse
    pub product_count: usize,
    /// Total units across all products
    pub total_units: u64,
    /// Distinct product categories
    pub category_count: usize,
    /// Purchase requests
    pub need_count: usize,
    /// Purchase requests per status
    pub needs_by_status: StatusSummary,
}

/// Builds the dashboard overview from the current snapshots.
#[must_use]
pub fn dashboard_summary(products: &[Product], needs: &[Need]) -> DashboardSummary {
    DashboardSummary {
        product_count: products.len(),
        total_units: products.iter().map(|p| u64::from(p.quantity)).sum(),
        category_count: categories(products).len(),
        need_count: needs.len(),
        needs_by_status: status_summary(needs),
    }
}
