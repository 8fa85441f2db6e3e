//! CSV export of the expense log and raw database backup.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use csv::QuoteStyle;

use crate::{Engine, EngineError, ResultEngine};

pub(crate) const UNKNOWN_CATEGORY: &str = "<Unknown Category>";
pub(crate) const UNKNOWN_SUB_CATEGORY: &str = "<Unknown Sub-Category>";

impl Engine {
    /// Write the whole expense log as CSV, newest entry first.
    ///
    /// Columns: date (MM/DD/YYYY), category, paid by, sub category,
    /// amount, description. Every field is quoted; there is no header
    /// row. Taxonomy ids that no longer resolve render as
    /// `<Unknown Category>` / `<Unknown Sub-Category>` rather than
    /// aborting the export.
    pub async fn write_csv<W: Write>(&self, writer: W) -> ResultEngine<()> {
        let expenses = self.expenses().await?;

        let mut csv_writer = csv::WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(writer);

        for expense in &expenses {
            let date = expense.date.format("%m/%d/%Y").to_string();
            let amount = expense.amount.to_string();
            let category = self
                .category_name(expense.category_id)
                .unwrap_or(UNKNOWN_CATEGORY);
            let sub_category = self
                .sub_category_name(expense.sub_category_id)
                .unwrap_or(UNKNOWN_SUB_CATEGORY);

            csv_writer.write_record([
                date.as_str(),
                category,
                expense.paid_by.as_str(),
                sub_category,
                amount.as_str(),
                expense.description.as_deref().unwrap_or(""),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Export the expense log into `dir` as `ExpenseLog-D-M-YYYY.csv`
    /// (current local date), creating the directory if needed. Returns
    /// the path written.
    pub async fn export_csv(&self, dir: &Path) -> ResultEngine<PathBuf> {
        fs::create_dir_all(dir)?;

        let today = Local::now();
        let file_name = format!("ExpenseLog-{}.csv", today.format("%-d-%-m-%Y"));
        let path = dir.join(file_name);

        let file = fs::File::create(&path)?;
        self.write_csv(file).await?;

        tracing::info!(path = %path.display(), "expense log exported");
        Ok(path)
    }
}

/// Copy the SQLite database file into `dest_dir` for offline analysis,
/// creating the directory if needed. Returns the path of the copy.
pub fn backup_database(db_file: &Path, dest_dir: &Path) -> ResultEngine<PathBuf> {
    if !db_file.is_file() {
        return Err(EngineError::KeyNotFound(db_file.display().to_string()));
    }
    fs::create_dir_all(dest_dir)?;

    let file_name = db_file
        .file_name()
        .ok_or_else(|| EngineError::KeyNotFound(db_file.display().to_string()))?;
    let dest = dest_dir.join(file_name);
    fs::copy(db_file, &dest)?;

    tracing::info!(
        source = %db_file.display(),
        dest = %dest.display(),
        "database backup written"
    );
    Ok(dest)
}
