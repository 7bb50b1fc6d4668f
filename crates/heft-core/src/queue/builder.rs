//! QueueBuilder: construction with fail-fast runtime lookup.

use tokio::runtime::Handle;

use super::Queue;
use crate::config::QueueConfig;
use crate::error::QueueError;

/// Builds a [`Queue`].
///
/// ```ignore
/// let queue = Queue::builder()
///     .weight_limit(5)
///     .autostart(true)
///     .build()?;
/// ```
///
/// `build()` needs a tokio runtime to schedule drain passes on: either the
/// one passed to [`QueueBuilder::runtime`], or the current one. Without
/// either it returns [`QueueError::NoRuntime`].
#[derive(Debug, Default)]
pub struct QueueBuilder {
    config: QueueConfig,
    runtime: Option<Handle>,
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole config.
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn weight_limit(mut self, limit: u32) -> Self {
        self.config.weight_limit = limit;
        self
    }

    pub fn autostart(mut self, autostart: bool) -> Self {
        self.config.autostart = autostart;
        self
    }

    /// Schedule drain passes and task work on this runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> Result<Queue, QueueError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| QueueError::NoRuntime)?,
        };
        Ok(Queue::from_parts(self.config, runtime))
    }
}
