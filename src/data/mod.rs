//! Data providers and static reference data.
//!
//! - daily report sources: remote archive or local directory (`source`)
//! - abbreviation/population/alias tables (`tables`)
//! - manual overlays for known-bad snapshots (`corrections`)

pub mod corrections;
pub mod source;
pub mod tables;

pub use corrections::{Correction, CorrectionTable};
pub use source::{CsseClient, DEFAULT_BASE_URL, LocalDir, ReportSource};
pub use tables::ReferenceTables;
