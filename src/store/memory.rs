use super::SpreadsheetStore;
use crate::errors::{AppError, AppResult};
use crate::models::WorksheetHandle;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find_worksheet: usize,
    pub add_worksheet: usize,
    pub update_cell: usize,
    pub clear_row: usize,
    pub insert_row: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.find_worksheet + self.add_worksheet + self.update_cell + self.clear_row + self.insert_row
    }
}

#[derive(Debug, Default)]
struct MemorySheet {
    sheet_id: i64,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: BTreeMap<String, MemorySheet>,
    next_sheet_id: i64,
    calls: CallCounts,
}

/// Spreadsheet kept in process memory. Counts every call so callers can
/// assert how much remote traffic an operation would have caused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worksheet(self, title: &str, rows: Vec<Vec<String>>) -> Self {
        {
            let mut state = self.lock();
            let sheet_id = state.next_sheet_id;
            state.next_sheet_id += 1;
            state.sheets.insert(title.to_string(), MemorySheet { sheet_id, rows });
        }
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn reset_calls(&self) {
        self.lock().calls = CallCounts::default();
    }

    pub fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.lock().sheets.get(title).map(|sheet| sheet.rows.clone())
    }

    pub fn worksheet_titles(&self) -> Vec<String> {
        self.lock().sheets.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn sheet_mut<'a>(state: &'a mut MemoryState, sheet: &WorksheetHandle) -> AppResult<&'a mut MemorySheet> {
    state
        .sheets
        .get_mut(&sheet.title)
        .filter(|stored| stored.sheet_id == sheet.sheet_id)
        .ok_or_else(|| AppError::RemoteStore(format!("worksheet {} no longer exists", sheet.title)))
}

impl SpreadsheetStore for MemoryStore {
    async fn find_worksheet(&self, title: &str) -> AppResult<Option<WorksheetHandle>> {
        let mut state = self.lock();
        state.calls.find_worksheet += 1;
        Ok(state.sheets.get(title).map(|sheet| WorksheetHandle {
            sheet_id: sheet.sheet_id,
            title: title.to_string(),
        }))
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> AppResult<WorksheetHandle> {
        let mut state = self.lock();
        state.calls.add_worksheet += 1;
        if state.sheets.contains_key(title) {
            return Err(AppError::RemoteStore(format!("worksheet {} already exists", title)));
        }
        let sheet_id = state.next_sheet_id;
        state.next_sheet_id += 1;
        let grid = vec![vec![String::new(); cols as usize]; rows as usize];
        state.sheets.insert(title.to_string(), MemorySheet { sheet_id, rows: grid });
        Ok(WorksheetHandle {
            sheet_id,
            title: title.to_string(),
        })
    }

    async fn update_cell(&self, sheet: &WorksheetHandle, row: u32, col: u32, value: &str) -> AppResult<()> {
        if row == 0 || col == 0 {
            return Err(AppError::RemoteStore(format!("cell ({}, {}) is out of range", row, col)));
        }
        let mut state = self.lock();
        state.calls.update_cell += 1;
        let stored = sheet_mut(&mut state, sheet)?;
        let (row, col) = (row as usize - 1, col as usize - 1);
        if stored.rows.len() <= row {
            stored.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut stored.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    async fn clear_row_from(&self, sheet: &WorksheetHandle, row: u32, col: u32) -> AppResult<()> {
        if row == 0 || col == 0 {
            return Err(AppError::RemoteStore(format!("cell ({}, {}) is out of range", row, col)));
        }
        let mut state = self.lock();
        state.calls.clear_row += 1;
        let stored = sheet_mut(&mut state, sheet)?;
        if let Some(cells) = stored.rows.get_mut(row as usize - 1) {
            cells.truncate(col as usize - 1);
        }
        Ok(())
    }

    async fn insert_row(&self, sheet: &WorksheetHandle, values: &[String], index: u32) -> AppResult<()> {
        if index == 0 {
            return Err(AppError::RemoteStore("row index 0 is out of range".to_string()));
        }
        let mut state = self.lock();
        state.calls.insert_row += 1;
        let stored = sheet_mut(&mut state, sheet)?;
        let at = (index as usize - 1).min(stored.rows.len());
        stored.rows.insert(at, values.to_vec());
        Ok(())
    }
}
