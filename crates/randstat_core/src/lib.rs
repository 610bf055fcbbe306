//! # randstat_core: Statistics and Aggregation for Random Batches
//!
//! ## Layer Role
//!
//! randstat_core is the pure foundation below the HTTP service. It provides:
//! - Population standard deviation (`math::stats`)
//! - Batch request/outcome and error types (`types`)
//! - Ordered aggregation of batch results (`aggregate`)
//!
//! Nothing in this crate performs I/O; the service layer owns networking and
//! concurrency.
//!
//! ## Usage Examples
//!
//! ```rust
//! use randstat_core::aggregate::assemble;
//! use randstat_core::types::BatchSuccess;
//!
//! let result = assemble(vec![
//!     BatchSuccess::new(1, vec![4, 5, 6]),
//!     BatchSuccess::new(0, vec![1, 2, 3]),
//! ])
//! .unwrap();
//!
//! assert_eq!(result.len(), 3);
//! assert_eq!(result.combined().unwrap().data, vec![1, 2, 3, 4, 5, 6]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod math;
pub mod types;

pub use aggregate::{assemble, AggregateResult, BatchSummary};
pub use math::stats::population_std_dev;
