//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`Scope`, `NegativeDaily`, `PopulationPolicy`, `SourceMode`)
//! - canonical location keys and raw report rows (`LocationKey`, `RawRow`, `Counts`)
//! - the metric vocabulary shared by the store, reports and exports (`Metric`)

pub mod types;

pub use types::*;
