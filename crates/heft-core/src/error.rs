use thiserror::Error;

/// Errors raised synchronously by the queue itself.
///
/// These are caller errors (bad parameters, missing runtime). They never
/// travel through a task's outcome handle.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("task with weight of {weight} can't be performed in queue with limit of {limit}")]
    WeightExceedsLimit { weight: u32, limit: u32 },

    #[error("task weight must be a positive integer")]
    ZeroWeight,

    #[error("no tokio runtime available to schedule drain passes")]
    NoRuntime,

    #[error("invalid queue config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failure side of an awaited [`Outcome`](crate::Outcome).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError<E> {
    /// The work itself failed; the error is passed through unchanged.
    #[error("task failed: {0}")]
    Failed(E),

    /// The task was dropped before it settled (its work panicked, or the
    /// runtime went away).
    #[error("task was abandoned before it settled")]
    Abandoned,
}

impl<E> OutcomeError<E> {
    /// Returns the work's own error, if that is what this is.
    pub fn into_failed(self) -> Option<E> {
        match self {
            OutcomeError::Failed(err) => Some(err),
            OutcomeError::Abandoned => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_error_names_both_values() {
        let err = QueueError::WeightExceedsLimit {
            weight: 6,
            limit: 5,
        };
        assert_eq!(
            err.to_string(),
            "task with weight of 6 can't be performed in queue with limit of 5"
        );
    }

    #[test]
    fn failed_passes_error_through() {
        let err: OutcomeError<&str> = OutcomeError::Failed("boom");
        assert_eq!(err.into_failed(), Some("boom"));
        assert_eq!(OutcomeError::<&str>::Abandoned.into_failed(), None);
    }
}
