//! # ataqc-core
//!
//! Shared building blocks for ATAC-seq alignment quality control: interval
//! features and peaks, a borrowed view of alignment records, the reference
//! genome configuration, and helpers for reading BED-like files.
//!
//! ```rust
//! use ataqc_core::models::{Feature, Peak};
//!
//! let peak = Peak::new("chr1", 100, 200, "peak_1").unwrap();
//! let read = Feature::new("chr1", 150, 250).unwrap();
//!
//! assert!(peak.overlaps(&read));
//! ```
pub mod errors;
pub mod models;
pub mod reference;
pub mod utils;
