//! Per-batch work units and their successful results.

/// Lowest integer the provider is asked to produce.
pub const VALUE_MIN: i64 = 0;

/// Highest integer the provider is asked to produce.
pub const VALUE_MAX: i64 = 10;

/// One unit of upstream work.
///
/// Every batch of a single incoming request carries the same
/// `correlation_id`; it is sent upstream and never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRequest {
    /// Position of this batch in the aggregate (`0..requests`)
    pub index: usize,
    /// Number of integers requested
    pub length: usize,
    /// Identifier shared by all batches of one request
    pub correlation_id: u64,
}

impl BatchRequest {
    /// Builds `count` batches indexed `0..count`, all sharing `correlation_id`.
    pub fn plan(count: usize, length: usize, correlation_id: u64) -> Vec<Self> {
        (0..count)
            .map(|index| Self {
                index,
                length,
                correlation_id,
            })
            .collect()
    }
}

/// Integers returned by the provider for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSuccess {
    /// Index of the originating [`BatchRequest`]
    pub index: usize,
    /// Values in the order the provider returned them
    pub values: Vec<i64>,
}

impl BatchSuccess {
    /// Create a new batch result
    pub fn new(index: usize, values: Vec<i64>) -> Self {
        Self { index, values }
    }

    /// Whether every value lies in `[VALUE_MIN, VALUE_MAX]`.
    pub fn is_in_domain(&self) -> bool {
        self.values
            .iter()
            .all(|v| (VALUE_MIN..=VALUE_MAX).contains(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_indexes_batches_in_order() {
        let plan = BatchRequest::plan(3, 4, 42);

        assert_eq!(plan.len(), 3);
        for (i, batch) in plan.iter().enumerate() {
            assert_eq!(batch.index, i);
            assert_eq!(batch.length, 4);
            assert_eq!(batch.correlation_id, 42);
        }
    }

    #[test]
    fn test_plan_empty() {
        assert!(BatchRequest::plan(0, 5, 1).is_empty());
    }

    #[test]
    fn test_domain_check() {
        assert!(BatchSuccess::new(0, vec![0, 5, 10]).is_in_domain());
        assert!(!BatchSuccess::new(0, vec![0, 11]).is_in_domain());
        assert!(!BatchSuccess::new(0, vec![-1, 3]).is_in_domain());
    }
}
