//! Snapshot/rollback bookkeeping for batch edits.
//!
//! A transaction holds the pre-batch content for exactly as long as the
//! batch runs. Committing drops it; rolling back hands it back verbatim.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::source::SourceText;

#[derive(Debug)]
pub struct Transaction
{
    snapshot: Arc<str>,
    cid: String,
    applied: usize,
}

impl Transaction
{
    /// Capture the current content before any operation runs
    pub fn begin(
        source: &SourceText,
        cid: &str,
    ) -> Self
    {
        debug!(len = source.len(), cid, "transaction started");
        Self {
            snapshot: source.snapshot(),
            cid: cid.to_string(),
            applied: 0,
        }
    }

    /// Record one successfully applied operation
    pub fn record(&mut self)
    {
        self.applied += 1;
    }

    /// Pre-batch content, for diffing against the result
    pub fn snapshot(&self) -> &str
    {
        &self.snapshot
    }

    /// Content id of the file as it was when the batch began
    pub fn cid(&self) -> &str
    {
        &self.cid
    }

    /// Finish successfully; returns the number of applied operations
    pub fn commit(self) -> usize
    {
        debug!(applied = self.applied, "transaction committed");
        self.applied
    }

    /// Abandon the batch; returns the content to restore
    pub fn rollback(self) -> Arc<str>
    {
        warn!(applied = self.applied, "transaction rolled back");
        self.snapshot
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn rollback_returns_the_exact_snapshot()
    {
        let source = SourceText::from("a\r\nb\n");
        let mut tx = Transaction::begin(&source, "cid");
        tx.record();
        tx.record();
        assert_eq!(tx.cid(), "cid");
        assert_eq!(&*tx.rollback(), "a\r\nb\n");
    }

    #[test]
    fn commit_reports_applied_count()
    {
        let source = SourceText::from("x");
        let mut tx = Transaction::begin(&source, "c");
        tx.record();
        assert_eq!(tx.snapshot(), "x");
        assert_eq!(tx.commit(), 1);
    }
}
