//! heft-core
//!
//! In-process admission control for asynchronous work.
//!
//! A [`Queue`] admits tasks under a global integer weight budget, highest
//! priority first and FIFO among equal priorities. A task whose weight does
//! not fit blocks everything behind it until enough in-flight weight is
//! released; smaller tasks are never let past it.
//!
//! ```ignore
//! let queue = Queue::builder().weight_limit(5).build()?;
//! let outcome = queue.enqueue(|| async { Ok::<_, MyError>(fetch().await) },
//!     TaskParams::default().with_weight(2))?;
//! queue.start();
//! let value = outcome.await?;
//! ```
//!
//! # Modules
//! - **queue**: the scheduler ([`Queue`], [`QueueBuilder`])
//! - **outcome**: outcome handles and progress relaying
//! - **config**: queue and task parameters with their defaults
//! - **error**: [`QueueError`] (caller errors) and [`OutcomeError`] (task failures)
//! - **observability**: [`QueueStats`]

pub mod config;
pub mod error;
pub mod observability;
pub mod outcome;
pub mod queue;

pub use config::{QueueConfig, QueueParams, TaskParams};
pub use error::{OutcomeError, QueueError};
pub use observability::QueueStats;
pub use outcome::{Notifier, Outcome};
pub use queue::{Queue, QueueBuilder, TaskId};
