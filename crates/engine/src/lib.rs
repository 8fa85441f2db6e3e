//! Core engine of the Quaderno expense tracker.
//!
//! Expenses are recorded against a two-level category / sub-category
//! taxonomy. Both taxonomy levels are user-orderable: every item carries
//! a sparse `sequence_no` and moving an item only rewrites the numbers
//! between the two endpoints of the move. The engine
//! keeps an in-memory ordered cache of the taxonomy in lockstep with the
//! store, so ordering and name lookups never touch the database.
//!
//! The engine owns no global state: it is built over a
//! [`DatabaseConnection`] and the caller owns its lifecycle, one engine
//! per opened database.

use sea_orm::DatabaseConnection;

pub use error::EngineError;
pub use expense_items::{Expense, NewExpense};
pub use export::backup_database;
pub use report::{CategoryTotal, ExpenseReport, SubCategoryTotal};

mod categories;
mod error;
mod expense_items;
mod export;
mod ops;
mod reorder;
mod report;
mod sub_categories;
mod taxonomy;

use taxonomy::Taxonomy;

pub type ResultEngine<T> = Result<T, EngineError>;

#[derive(Debug)]
pub struct Engine {
    taxonomy: Taxonomy,
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`, loading the taxonomy cache from the store.
    pub async fn build(self) -> ResultEngine<Engine> {
        let taxonomy = Taxonomy::load(&self.database).await?;
        Ok(Engine {
            taxonomy,
            database: self.database,
        })
    }
}
