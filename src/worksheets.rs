use crate::errors::AppResult;
use crate::models::WorksheetHandle;
use crate::registry;
use crate::store::SpreadsheetStore;
use std::collections::HashMap;

/// Caches one worksheet handle per metric for the lifetime of the process.
/// Headers are rewritten only the first time a metric is resolved.
#[derive(Debug, Default)]
pub struct WorksheetResolver {
    cache: HashMap<String, WorksheetHandle>,
}

impl WorksheetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve<S: SpreadsheetStore>(&mut self, store: &S, metric: &str) -> AppResult<WorksheetHandle> {
        let headers = registry::fields_for(metric)?;

        if let Some(sheet) = self.cache.get(metric) {
            return Ok(sheet.clone());
        }

        let width = headers.len() as u32;
        let (sheet, existing) = match store.find_worksheet(metric).await? {
            Some(sheet) => {
                tracing::info!(metric = %metric, sheet_id = sheet.sheet_id, "using existing worksheet");
                (sheet, true)
            }
            None => (store.add_worksheet(metric, 1, width).await?, false),
        };

        for (index, header) in headers.iter().enumerate() {
            store.update_cell(&sheet, 1, index as u32 + 1, header).await?;
        }
        // A reused sheet may carry stale header cells past the registry width.
        if existing {
            store.clear_row_from(&sheet, 1, width + 1).await?;
        }
        tracing::debug!(metric = %metric, headers = ?headers, "wrote worksheet headers");

        self.cache.insert(metric.to_string(), sheet.clone());
        Ok(sheet)
    }
}
