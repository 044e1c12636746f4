//! Conversion Strategy Module
//!
//! - Single tree: `convert::convert`
//! - Batch: independent trees converted in parallel

pub mod parallel;

pub use parallel::convert_many;
