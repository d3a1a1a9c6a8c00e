pub mod auth;
pub mod google;
pub mod memory;

use crate::errors::AppResult;
use crate::models::WorksheetHandle;
use std::future::Future;

pub use google::GoogleSheetsStore;
pub use memory::MemoryStore;

/// Remote spreadsheet operations the logger depends on. Rows and columns are
/// 1-based, matching what a user sees in the sheet.
pub trait SpreadsheetStore: Send + Sync {
    /// Returns `None` when no worksheet carries `title`.
    fn find_worksheet(&self, title: &str) -> impl Future<Output = AppResult<Option<WorksheetHandle>>> + Send;

    fn add_worksheet(
        &self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> impl Future<Output = AppResult<WorksheetHandle>> + Send;

    fn update_cell(
        &self,
        sheet: &WorksheetHandle,
        row: u32,
        col: u32,
        value: &str,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// Blanks every cell of `row` from column `col` rightwards.
    fn clear_row_from(
        &self,
        sheet: &WorksheetHandle,
        row: u32,
        col: u32,
    ) -> impl Future<Output = AppResult<()>> + Send;

    /// Inserts `values` as a new row at `index`; the row previously there and
    /// everything below it move down by one.
    fn insert_row(
        &self,
        sheet: &WorksheetHandle,
        values: &[String],
        index: u32,
    ) -> impl Future<Output = AppResult<()>> + Send;
}
