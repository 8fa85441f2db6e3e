//! Read model of the drill-down expense report.

use serde::Serialize;

/// All expenses aggregated by category, then by sub-category.
///
/// Lists are sorted ascending by amount, mirroring the drill-down view
/// this report backs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseReport {
    /// Grand total in minor currency units.
    pub total: i64,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_id: i32,
    pub name: String,
    pub total: i64,
    pub sub_categories: Vec<SubCategoryTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubCategoryTotal {
    pub sub_category_id: i32,
    pub name: String,
    pub total: i64,
}
