//! Expense records and their read model.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: DateTimeUtc,
    pub cat_id: i32,
    pub subcat_id: i32,
    pub paid_by: String,
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CatId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::sub_categories::Entity",
        from = "Column::SubcatId",
        to = "super::sub_categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SubCategory,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::sub_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A persisted expense record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub category_id: i32,
    pub sub_category_id: i32,
    pub paid_by: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub description: Option<String>,
}

/// An expense record that has not been persisted yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub date: DateTime<Utc>,
    pub category_id: i32,
    pub sub_category_id: i32,
    pub paid_by: String,
    pub amount: i64,
    pub description: Option<String>,
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Expense {
            id: model.id,
            date: model.date,
            category_id: model.cat_id,
            sub_category_id: model.subcat_id,
            paid_by: model.paid_by,
            amount: model.amount,
            description: model.description,
        }
    }
}

impl From<&NewExpense> for ActiveModel {
    fn from(new: &NewExpense) -> Self {
        ActiveModel {
            id: ActiveValue::NotSet,
            date: ActiveValue::Set(new.date),
            cat_id: ActiveValue::Set(new.category_id),
            subcat_id: ActiveValue::Set(new.sub_category_id),
            paid_by: ActiveValue::Set(new.paid_by.clone()),
            amount: ActiveValue::Set(new.amount),
            description: ActiveValue::Set(new.description.clone()),
        }
    }
}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        ActiveModel {
            id: ActiveValue::Set(expense.id),
            date: ActiveValue::Set(expense.date),
            cat_id: ActiveValue::Set(expense.category_id),
            subcat_id: ActiveValue::Set(expense.sub_category_id),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            amount: ActiveValue::Set(expense.amount),
            description: ActiveValue::Set(expense.description.clone()),
        }
    }
}
