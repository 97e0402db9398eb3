//! `covid-series` library crate.
//!
//! The binary (`covid`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the built series can be consumed by other front-ends (chart/map renderers, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod location;
pub mod report;
pub mod series;
