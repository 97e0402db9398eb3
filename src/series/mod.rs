//! Time-series construction.
//!
//! Responsibilities:
//!
//! - ordered report dates with O(1) position lookup (`date_index`)
//! - aligned per-location metric arrays (`store`) and point sites (`sites`)
//! - resolve + group + correct one date's rows (`aggregate`)
//! - active / daily / per-capita metrics (`derived`)
//! - date-ordered orchestration and diagnostics (`builder`)

pub mod aggregate;
pub mod builder;
pub mod date_index;
pub mod derived;
pub mod sites;
pub mod store;

pub use builder::{BuiltSeries, Diagnostics, SeriesBuilder};
pub use date_index::DateIndex;
pub use sites::{SiteSeries, SiteStore};
pub use store::{LocationSeries, SeriesStore};
