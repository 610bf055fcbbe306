//! Batch and error types shared by the aggregation layer and the service.
//!
//! This module provides:
//! - `batch`: per-batch work units and their outcomes
//! - `error`: structured error types for statistics and aggregation

pub mod batch;
pub mod error;

pub use batch::{BatchRequest, BatchSuccess, VALUE_MAX, VALUE_MIN};
pub use error::{AssembleError, StatisticsError};
