pub use sea_orm_migration::prelude::*;

mod m20260110_000001_taxonomy;
mod m20260110_000002_expense_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_taxonomy::Migration),
            Box::new(m20260110_000002_expense_items::Migration),
        ]
    }
}
