//! Ordered aggregation of batch results.
//!
//! [`assemble`] turns a complete set of [`BatchSuccess`] values into an
//! [`AggregateResult`]: one entry per batch at its own index, followed by a
//! combined entry over every value in ascending batch order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::stats::population_std_dev;
use crate::types::{AssembleError, BatchSuccess};

/// Standard deviation and data of one aggregate entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Population standard deviation of `data`
    pub stddev: f64,
    /// The integers this entry summarises
    pub data: Vec<i64>,
}

impl BatchSummary {
    fn from_values(index: usize, data: Vec<i64>) -> Result<Self, AssembleError> {
        let stddev = population_std_dev(&data)
            .map_err(|source| AssembleError::Statistics { index, source })?;
        Ok(Self { stddev, data })
    }
}

/// Aggregate of every batch plus the combined entry.
///
/// Serialises as a JSON object keyed `"0"..="n"` in numeric order, where
/// `"n"` (the batch count) is the combined entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    entries: BTreeMap<usize, BatchSummary>,
}

impl AggregateResult {
    /// Number of entries, including the combined one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for an assembled result.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of batches summarised.
    pub fn batch_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&BatchSummary> {
        self.entries.get(&index)
    }

    /// The combined entry over all batches.
    pub fn combined(&self) -> Option<&BatchSummary> {
        self.entries.values().next_back()
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BatchSummary)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Merges batch results into an [`AggregateResult`].
///
/// Batches may arrive in any order; they are sorted by index first, and the
/// indices must then be exactly `0..n`.
///
/// # Errors
///
/// - [`AssembleError::NoBatches`] for an empty input
/// - [`AssembleError::IndexOutOfSequence`] for gaps or duplicate indices
/// - [`AssembleError::Statistics`] if an entry has no values
pub fn assemble(mut batches: Vec<BatchSuccess>) -> Result<AggregateResult, AssembleError> {
    if batches.is_empty() {
        return Err(AssembleError::NoBatches);
    }

    batches.sort_by_key(|b| b.index);

    let count = batches.len();
    let total: usize = batches.iter().map(|b| b.values.len()).sum();
    let mut combined = Vec::with_capacity(total);
    let mut entries = BTreeMap::new();

    for (expected, batch) in batches.into_iter().enumerate() {
        if batch.index != expected {
            return Err(AssembleError::IndexOutOfSequence {
                expected,
                found: batch.index,
            });
        }
        combined.extend_from_slice(&batch.values);
        entries.insert(expected, BatchSummary::from_values(expected, batch.values)?);
    }

    entries.insert(count, BatchSummary::from_values(count, combined)?);

    Ok(AggregateResult { entries })
}
