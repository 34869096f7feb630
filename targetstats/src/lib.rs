//! Structural statistics for a Prometheus exposition snapshot.
//!
//! This library supports the targetstats binary found elsewhere in this
//! project. It reads one scrape of Prometheus text exposition, classifies
//! every line and reports how many entries of each kind, how many metrics of
//! each declared type and how many series per metric name the scrape holds.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod analyze;
pub mod config;
pub mod report;
pub mod source;
pub mod stats;
