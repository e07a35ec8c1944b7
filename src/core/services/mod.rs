//! Business logic services
//!
//! Pure logic that operates on domain models. These services have no
//! I/O dependencies - they operate on data passed in and return
//! results.
//!
//! - [`verdict`] - fold per-check outcomes into one decision
//! - [`applicability`] - match checks to events

pub mod applicability;
pub mod verdict;

pub use applicability::Applicability;
pub use verdict::{build_result, overall_status};
