use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub added: usize,
    pub skipped: usize,
}

impl SyncResult {
    pub fn message(&self) -> String {
        format!("Synced {} new items", self.added)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: i64,
    pub url: String,
    pub error: String,
}

/// Outcome of one processing batch. Per-item failures never abort the batch,
/// they are collected here in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    pub succeeded: Vec<i64>,
    pub failed: Vec<ItemFailure>,
    pub message: String,
}

impl ProcessResult {
    pub fn record_success(&mut self, id: i64) {
        self.succeeded.push(id);
    }

    pub fn record_failure(&mut self, id: i64, url: &str, error: impl ToString) {
        self.failed.push(ItemFailure {
            id,
            url: url.to_string(),
            error: error.to_string(),
        });
    }

    pub fn finish(mut self) -> Self {
        self.message = if self.failed.is_empty() {
            format!("Processed {} items", self.succeeded.len())
        } else {
            format!(
                "Processed {} items, {} failed",
                self.succeeded.len(),
                self.failed.len()
            )
        };
        self
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|f| f.id).collect()
    }
}
