use serde::Serialize;

/// Point-in-time counters of a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Enqueued, not yet admitted.
    pub pending: usize,
    /// Admitted, not yet settled.
    pub processing: usize,
    /// Settled since the queue was built. Never decreases.
    pub processed: u64,
    /// Sum of weights of in-flight tasks.
    pub weight_in_use: u64,
    pub weight_limit: u32,
}
