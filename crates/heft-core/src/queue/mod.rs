//! Queue module: pending store, admission state and the scheduler handle.

mod builder;
mod pending;
mod record;
mod scheduler;
mod state;

pub use builder::QueueBuilder;
pub use record::TaskId;
pub use scheduler::Queue;
