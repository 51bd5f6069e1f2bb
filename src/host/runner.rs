use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::diag::TraceLogger;
use crate::error::SubscriptionError;
use crate::lines::{panic_message, LineHandler, LogLine};
use crate::plugins::LogPlugin;

/// Bus-side adapter around one plugin.
///
/// Forwards each delivered line to the plugin, traces the first processing
/// error per plugin (later ones are swallowed so a flaky plugin cannot spam
/// the log), and runs the plugin's finalize hook when the stream closes.
/// Plugin errors never end the subscription; a plugin panic does, and the
/// bus surfaces it on `complete`.
pub(crate) struct PluginRunner {
    plugin: Box<dyn LogPlugin>,
    logger: Arc<dyn TraceLogger>,
    finalized: Arc<AtomicBool>,
    error_reported: bool,
}

impl PluginRunner {
    pub(crate) fn new(
        plugin: Box<dyn LogPlugin>,
        logger: Arc<dyn TraceLogger>,
        finalized: Arc<AtomicBool>,
    ) -> Self {
        Self {
            plugin,
            logger,
            finalized,
            error_reported: false,
        }
    }
}

#[async_trait]
impl LineHandler for PluginRunner {
    async fn on_line(&mut self, line: &LogLine) -> Result<(), SubscriptionError> {
        if let Err(err) = self.plugin.process_line(line).await {
            if !self.error_reported {
                self.error_reported = true;
                self.logger.warning(&format!(
                    "Plugin '{}' failed to process line {}: {err}",
                    self.plugin.name(),
                    line.seq
                ));
            }
        }
        Ok(())
    }

    async fn on_complete(&mut self) -> Result<(), SubscriptionError> {
        let name = self.plugin.name();
        let outcome = std::panic::AssertUnwindSafe(self.plugin.finalize())
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.logger
                    .warning(&format!("Plugin '{name}' failed to finalize: {err}"));
            }
            Err(payload) => {
                self.logger.warning(&format!(
                    "Plugin '{name}' panicked during finalize: {}",
                    panic_message(payload)
                ));
            }
        }
        self.finalized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.plugin.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemoryLogger;
    use crate::error::PluginError;

    struct FailingPlugin;

    #[async_trait]
    impl LogPlugin for FailingPlugin {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn process_line(&mut self, _line: &LogLine) -> Result<(), PluginError> {
            Err(PluginError::Process {
                error: "bad line".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_only_first_process_error_is_traced() {
        let logger = Arc::new(MemoryLogger::new());
        let finalized = Arc::new(AtomicBool::new(false));
        let mut runner = PluginRunner::new(Box::new(FailingPlugin), logger.clone(), finalized);

        for seq in 1..=3 {
            runner
                .on_line(&LogLine::new(seq, "x"))
                .await
                .expect("plugin errors must not end the subscription");
        }

        assert_eq!(logger.count_containing("failed to process"), 1);
    }

    #[tokio::test]
    async fn test_finalize_outcome_is_logged_and_flagged() {
        struct FinalizeFails;

        #[async_trait]
        impl LogPlugin for FinalizeFails {
            fn name(&self) -> &'static str {
                "finalize-fails"
            }

            async fn process_line(&mut self, _line: &LogLine) -> Result<(), PluginError> {
                Ok(())
            }

            async fn finalize(&mut self) -> Result<(), PluginError> {
                Err(PluginError::Finalize {
                    error: "cleanup failed".to_string(),
                })
            }
        }

        let logger = Arc::new(MemoryLogger::new());
        let finalized = Arc::new(AtomicBool::new(false));
        let mut runner = PluginRunner::new(Box::new(FinalizeFails), logger.clone(), finalized.clone());

        runner.on_complete().await.unwrap();

        assert!(logger.contains("failed to finalize"));
        assert!(finalized.load(Ordering::SeqCst));
    }
}
