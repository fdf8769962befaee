//! Peak overlap counting for ATAC-seq alignment quality control.
//!
//! Peaks are loaded once, grouped by reference sequence, and then each high
//! quality alignment is counted against the peaks it overlaps. Afterwards the
//! peaks can be listed in structural order or ranked by overlap count or size.
//!
//! This is not a general interval tree: the peak set is fixed after loading
//! and the only query is "increment every peak this feature overlaps".
//!
//! ## Quick Start
//!
//! ```rust
//! use ataqc_core::models::{Feature, Peak};
//! use ataqc_peaks::{PeakIndex, ScanStrategy};
//!
//! let mut index = PeakIndex::new(ScanStrategy::Exact);
//! index.add(Peak::new("chr1", 100, 200, "peak_1").unwrap()).unwrap();
//! index.add(Peak::new("chr1", 150, 300, "peak_2").unwrap()).unwrap();
//!
//! let read = Feature::new("chr1", 180, 250).unwrap();
//! assert_eq!(index.increment_overlap(&read), 2);
//!
//! let ranked = index.rank_by_overlap_descending();
//! assert_eq!(ranked[0].overlapping_hqaa, 1);
//! ```

/// Peaks of a single reference sequence.
pub mod collection;

pub mod errors;

/// Genome-wide peak indexing.
pub mod index;

// re-exports
pub use self::collection::ReferencePeakCollection;
pub use self::errors::PeakIndexError;
pub use self::index::PeakIndex;

/// How a collection finds the peaks overlapping a feature.
///
/// # Variants
///
/// * `UpperBound` - Start at the first peak ordered after the feature by
///   `(start, end)` and walk forward until a peak no longer overlaps. Peaks
///   starting at or before the feature are never counted, nor is anything
///   after the first gap.
/// * `Exact` - Start at the first peak that could reach the feature given the
///   longest peak length and walk forward until peaks start at or after the
///   feature's end. Every overlapping peak is counted.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScanStrategy {
    #[default]
    UpperBound,
    Exact,
}

impl std::str::FromStr for ScanStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper-bound" => Ok(ScanStrategy::UpperBound),
            "exact" => Ok(ScanStrategy::Exact),
            other => Err(format!(
                "unknown peak scan strategy \"{}\" (expected \"upper-bound\" or \"exact\")",
                other
            )),
        }
    }
}

impl std::fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStrategy::UpperBound => write!(f, "upper-bound"),
            ScanStrategy::Exact => write!(f, "exact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("upper-bound", ScanStrategy::UpperBound)]
    #[case("exact", ScanStrategy::Exact)]
    fn test_parse_scan_strategy(#[case] name: &str, #[case] expected: ScanStrategy) {
        let strategy: ScanStrategy = name.parse().unwrap();
        assert_eq!(strategy, expected);
        assert_eq!(strategy.to_string(), name);
    }

    #[rstest]
    fn test_parse_unknown_scan_strategy() {
        assert!("fastest".parse::<ScanStrategy>().is_err());
    }
}
