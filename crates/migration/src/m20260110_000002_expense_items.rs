use sea_orm_migration::prelude::*;

use super::m20260110_000001_taxonomy::{Categories, SubCategories};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpenseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseItems::Date).timestamp().not_null())
                    .col(ColumnDef::new(ExpenseItems::CatId).integer().not_null())
                    .col(ColumnDef::new(ExpenseItems::SubcatId).integer().not_null())
                    .col(ColumnDef::new(ExpenseItems::PaidBy).string().not_null())
                    .col(ColumnDef::new(ExpenseItems::Amount).big_integer().not_null())
                    .col(ColumnDef::new(ExpenseItems::Description).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_items-cat_id")
                            .from(ExpenseItems::Table, ExpenseItems::CatId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_items-subcat_id")
                            .from(ExpenseItems::Table, ExpenseItems::SubcatId)
                            .to(SubCategories::Table, SubCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_items-date")
                    .table(ExpenseItems::Table)
                    .col(ExpenseItems::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpenseItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ExpenseItems {
    Table,
    Id,
    Date,
    CatId,
    SubcatId,
    PaidBy,
    Amount,
    Description,
}
