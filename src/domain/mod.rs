//! Domain types used throughout the workflow.
//!
//! This module defines:
//!
//! - the method catalog and ordered selections (`Method`, `MethodSelection`)
//! - wire types for the prediction service (`ComparisonRequest`, `ComparisonResultRaw`)
//! - chart-ready outputs (`ChartSeries`, `ChartDataset`)
//! - session configuration (`SessionConfig`)

pub mod types;

pub use types::*;
