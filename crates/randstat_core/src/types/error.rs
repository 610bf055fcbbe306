//! Error types for statistics and aggregation.
//!
//! Both are internal-invariant violations: the service validates that every
//! batch holds at least three values before any statistic is computed.

use thiserror::Error;

/// Statistics computation errors.
///
/// # Examples
///
/// ```
/// use randstat_core::types::StatisticsError;
///
/// let err = StatisticsError::EmptyInput;
/// assert_eq!(format!("{}", err), "Cannot compute statistics of an empty sequence");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsError {
    /// The input sequence has no elements.
    #[error("Cannot compute statistics of an empty sequence")]
    EmptyInput,
}

/// Errors raised while merging batch results into an aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// No batches were supplied.
    #[error("No batch results to assemble")]
    NoBatches,

    /// Batch indices are not exactly `0..n`.
    #[error("Batch index {found} out of sequence, expected {expected}")]
    IndexOutOfSequence {
        /// Index expected at this position
        expected: usize,
        /// Index actually found
        found: usize,
    },

    /// Statistics failed for one of the entries.
    #[error("Statistics error for entry {index}: {source}")]
    Statistics {
        /// Entry index
        index: usize,
        /// Underlying statistics error
        #[source]
        source: StatisticsError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_error_display() {
        let err = AssembleError::IndexOutOfSequence {
            expected: 1,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Batch index 2 out of sequence, expected 1"
        );

        let err = AssembleError::Statistics {
            index: 3,
            source: StatisticsError::EmptyInput,
        };
        assert!(err.to_string().contains("entry 3"));
        assert!(err.to_string().contains("empty sequence"));
    }
}
