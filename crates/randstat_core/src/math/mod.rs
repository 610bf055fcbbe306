//! Numerical helpers.
//!
//! - `stats`: descriptive statistics over integer samples

pub mod stats;
