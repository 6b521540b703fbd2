//! Batch operation reports.
//!
//! Bulk operations (default bootstrapping, zone reload) isolate per-item
//! failures: one bad item never aborts the batch. The report collects what
//! happened so callers can decide on user-visible messaging.

/// One failed item in a batch.
#[derive(Debug)]
pub struct BatchFailure<E> {
    /// Name of the item that failed (record name, flag type id, ...).
    pub item: String,
    /// Why it failed.
    pub error: E,
}

/// Outcome of a batch operation.
#[derive(Debug)]
pub struct BatchReport<E> {
    /// Items applied successfully.
    pub succeeded: usize,
    /// Items intentionally passed over.
    pub skipped: usize,
    /// Items that failed, in processing order.
    pub failures: Vec<BatchFailure<E>>,
}

impl<E> Default for BatchReport<E> {
    fn default() -> Self {
        Self {
            succeeded: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }
}

impl<E> BatchReport<E> {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one success.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Count one skipped item.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Record a failed item.
    pub fn record_failure(&mut self, item: impl Into<String>, error: E) {
        self.failures.push(BatchFailure {
            item: item.into(),
            error,
        });
    }

    /// Number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// True if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the failed items.
    pub fn failed_items(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.item.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report: BatchReport<String> = BatchReport::new();
        assert!(report.is_clean());

        report.record_success();
        report.record_success();
        report.record_skip();
        report.record_failure("b.json", "bad".to_string());

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.failed_items().collect::<Vec<_>>(), vec!["b.json"]);
    }
}
