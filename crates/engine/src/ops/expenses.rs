//! Expense record operations and the drill-down report.

use std::collections::HashMap;

use sea_orm::{DbErr, QueryFilter, QueryOrder, prelude::*};

use crate::{
    Engine, EngineError, Expense, NewExpense, ResultEngine,
    expense_items,
    export::{UNKNOWN_CATEGORY, UNKNOWN_SUB_CATEGORY},
    report::{CategoryTotal, ExpenseReport, SubCategoryTotal},
    taxonomy::Scope,
};

use super::normalize_required_name;

impl Engine {
    /// Persist a new expense and return it with its database id.
    pub async fn add_expense(&self, new: &NewExpense) -> ResultEngine<Expense> {
        normalize_required_name(&new.paid_by, "paid by")?;
        self.validate_expense_refs(new.category_id, new.sub_category_id)?;

        let model = expense_items::ActiveModel::from(new)
            .insert(&self.database)
            .await?;
        tracing::debug!(expense_id = model.id, "added expense");
        Ok(Expense::from(model))
    }

    /// Overwrite a persisted expense with the given snapshot.
    pub async fn update_expense(&self, expense: &Expense) -> ResultEngine<()> {
        normalize_required_name(&expense.paid_by, "paid by")?;
        self.validate_expense_refs(expense.category_id, expense.sub_category_id)?;

        match expense_items::ActiveModel::from(expense)
            .update(&self.database)
            .await
        {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(EngineError::KeyNotFound(format!(
                "expense {}",
                expense.id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_expense(&self, expense_id: i32) -> ResultEngine<()> {
        let result = expense_items::Entity::delete_by_id(expense_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("expense {expense_id}")));
        }
        Ok(())
    }

    /// Drop every expense record. The taxonomy is untouched.
    pub async fn delete_all_expenses(&self) -> ResultEngine<u64> {
        let result = expense_items::Entity::delete_many()
            .exec(&self.database)
            .await?;
        tracing::debug!(deleted = result.rows_affected, "cleared expense items");
        Ok(result.rows_affected)
    }

    /// All expenses, newest first.
    ///
    /// Ordered by date descending with the id as tiebreak: entries made
    /// on the same day keep their entry order even though the user only
    /// records a day, and a later date edit still wins over the id.
    pub async fn expenses(&self) -> ResultEngine<Vec<Expense>> {
        let models = expense_items::Entity::find()
            .order_by_desc(expense_items::Column::Date)
            .order_by_desc(expense_items::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }

    /// True iff at least one expense references the category.
    pub async fn is_category_used(&self, category_id: i32) -> ResultEngine<bool> {
        let count = expense_items::Entity::find()
            .filter(expense_items::Column::CatId.eq(category_id))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }

    /// True iff at least one expense references the sub-category.
    pub async fn is_sub_category_used(&self, sub_category_id: i32) -> ResultEngine<bool> {
        let count = expense_items::Entity::find()
            .filter(expense_items::Column::SubcatId.eq(sub_category_id))
            .count(&self.database)
            .await?;
        Ok(count > 0)
    }

    /// Aggregate all expenses into per-category totals with a
    /// per-sub-category breakdown, every list ascending by amount.
    pub async fn report(&self) -> ResultEngine<ExpenseReport> {
        let expenses = self.expenses().await?;

        let mut total = 0i64;
        let mut category_totals: HashMap<i32, i64> = HashMap::new();
        let mut sub_totals: HashMap<i32, HashMap<i32, i64>> = HashMap::new();

        for expense in &expenses {
            total += expense.amount;
            *category_totals.entry(expense.category_id).or_default() += expense.amount;
            *sub_totals
                .entry(expense.category_id)
                .or_default()
                .entry(expense.sub_category_id)
                .or_default() += expense.amount;
        }

        let mut categories: Vec<CategoryTotal> = category_totals
            .into_iter()
            .map(|(category_id, amount)| {
                let mut sub_categories: Vec<SubCategoryTotal> = sub_totals
                    .remove(&category_id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(sub_category_id, amount)| SubCategoryTotal {
                        sub_category_id,
                        name: self
                            .sub_category_name(sub_category_id)
                            .unwrap_or(UNKNOWN_SUB_CATEGORY)
                            .to_string(),
                        total: amount,
                    })
                    .collect();
                sub_categories.sort_by_key(|sub| sub.total);

                CategoryTotal {
                    category_id,
                    name: self
                        .category_name(category_id)
                        .unwrap_or(UNKNOWN_CATEGORY)
                        .to_string(),
                    total: amount,
                    sub_categories,
                }
            })
            .collect();
        categories.sort_by_key(|category| category.total);

        Ok(ExpenseReport { total, categories })
    }

    fn validate_expense_refs(&self, category_id: i32, sub_category_id: i32) -> ResultEngine<()> {
        if !self.taxonomy.contains(Scope::Categories, category_id) {
            return Err(EngineError::KeyNotFound(format!("category {category_id}")));
        }
        if !self
            .taxonomy
            .contains(Scope::SubCategories { category_id }, sub_category_id)
        {
            return Err(EngineError::KeyNotFound(format!(
                "sub-category {sub_category_id} in category {category_id}"
            )));
        }
        Ok(())
    }
}
