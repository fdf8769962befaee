//! Alignment classification and quality metrics for ATAC-seq experiments.
//!
//! Each read group gets a [`ReadGroupMetrics`] that classifies alignments
//! into a fixed taxonomy while they stream past, keeps mapping quality and
//! fragment length histograms, and counts high quality autosomal alignments
//! (hqaa) against the read group's peaks. A [`MetricsCollector`] routes
//! alignments to their read groups and finalizes them all at the end.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ataqc_core::models::{AlignmentRecord, Flags};
//! use ataqc_core::reference::{ReferenceCache, ReferenceGenome};
//! use ataqc_metrics::{Classification, ReadGroupMetrics};
//!
//! let genome = Arc::new(ReferenceGenome::new("human", "chrM"));
//! let mut metrics = ReadGroupMetrics::new("rg1", ReferenceCache::new(genome));
//!
//! let record = AlignmentRecord {
//!     name: "read1",
//!     flags: Flags::from_bits(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::MATE_REVERSE),
//!     mapping_quality: 60,
//!     reference_id: Some(0),
//!     reference_name: Some("chr1"),
//!     mate_reference_id: Some(0),
//!     position: Some(10000),
//!     mate_position: Some(10150),
//!     alignment_end: Some(10050),
//!     template_length: 200,
//! };
//!
//! assert_eq!(metrics.classify(&record), Classification::ProperlyPaired);
//! metrics.finalize().unwrap();
//! assert_eq!(metrics.counts().hqaa, 1);
//! ```

pub mod collector;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod problems;
pub mod ranking;
pub mod report;
pub mod statistics;
pub mod summary;

// re-exports
pub use collector::{CollectorConfig, MetricsCollector, PeakSource};
pub use errors::MetricsError;
pub use metrics::ReadGroupMetrics;
pub use models::{Classification, Experiment, Library, ReadCounts};
pub use report::ReadGroupReport;
pub use summary::Configuration;
