//! Comparison plumbing around the prediction service.
//!
//! Responsibilities:
//!
//! - validate selections into a `ComparisonRequest` (`request`)
//! - turn the positional server response into chart series (`series`)

pub mod request;
pub mod series;

pub use request::*;
pub use series::*;
