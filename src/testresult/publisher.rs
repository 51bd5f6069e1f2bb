use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::PublishError;

use super::model::TestRun;

/// Destination for validated test runs.
///
/// Implemented by embedders; the crate never talks to a backend itself.
/// Uploads run on spawned tasks, so implementations must be shareable.
#[async_trait]
pub trait TestRunPublisher: Send + Sync {
    /// Uploads one validated run. The run manager logs failures during
    /// drain; there is no retry.
    async fn publish(&self, run: TestRun) -> Result<(), PublishError>;
}

/// Collects published runs in memory.
///
/// Useful in tests and for embedders that batch runs after the stream ends.
#[derive(Default)]
pub struct MemoryPublisher {
    runs: Mutex<Vec<TestRun>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every published run, in publish order.
    pub fn runs(&self) -> Vec<TestRun> {
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of published runs.
    pub fn count(&self) -> usize {
        self.runs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl TestRunPublisher for MemoryPublisher {
    async fn publish(&self, run: TestRun) -> Result<(), PublishError> {
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(run);
        Ok(())
    }
}
