use ataqc_core::models::{Feature, Peak};

use crate::ScanStrategy;
use crate::errors::PeakIndexError;

///
/// The peaks of a single reference sequence.
///
/// Peaks are kept in structural order (`start`, `end`, then name) so that the
/// first candidate for a feature can be found with a binary search. The span
/// of all peaks is tracked as they are added and used to reject features that
/// cannot overlap anything before any searching happens.
///
#[derive(Debug, Clone)]
pub struct ReferencePeakCollection {
    reference: String,
    peaks: Vec<Peak>,
    min_start: u64,
    max_end: u64,
    /// The length of the longest peak
    max_len: u64,
    sorted: bool,
}

impl ReferencePeakCollection {
    pub fn new(reference: impl Into<String>) -> Self {
        ReferencePeakCollection {
            reference: reference.into(),
            peaks: Vec::new(),
            min_start: u64::MAX,
            max_end: 0,
            max_len: 0,
            sorted: true,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    ///
    /// Add a peak to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`PeakIndexError::ReferenceMismatch`] if the peak is on another
    /// reference.
    ///
    pub fn add(&mut self, peak: Peak) -> Result<(), PeakIndexError> {
        if peak.reference != self.reference {
            return Err(PeakIndexError::ReferenceMismatch {
                peak: peak.to_string(),
                expected: self.reference.clone(),
                found: peak.reference,
            });
        }

        self.min_start = self.min_start.min(peak.start);
        self.max_end = self.max_end.max(peak.end);
        self.max_len = self.max_len.max(peak.size());

        if let Some(last) = self.peaks.last() {
            if *last > peak {
                self.sorted = false;
            }
        }
        self.peaks.push(peak);

        Ok(())
    }

    ///
    /// Check whether a feature could overlap any peak in the collection at all.
    ///
    pub fn spans(&self, feature: &Feature) -> bool {
        !self.peaks.is_empty()
            && self.reference == feature.reference
            && self.min_start < feature.end
            && feature.start < self.max_end
    }

    ///
    /// Count `feature` against every overlapping peak found by the scan
    /// strategy. Returns the number of peaks whose count was incremented.
    ///
    pub fn increment_overlap(&mut self, feature: &Feature, strategy: ScanStrategy) -> usize {
        if !self.spans(feature) {
            return 0;
        }
        self.sort();

        let mut incremented = 0;
        match strategy {
            ScanStrategy::UpperBound => {
                let first = self
                    .peaks
                    .partition_point(|p| (p.start, p.end) <= (feature.start, feature.end));

                for peak in self.peaks[first..].iter_mut() {
                    if !peak.overlaps_range(feature.start, feature.end) {
                        break;
                    }
                    peak.overlapping_hqaa += 1;
                    incremented += 1;
                }
            }
            ScanStrategy::Exact => {
                let first = Self::lower_bound(
                    feature.start.saturating_sub(self.max_len),
                    &self.peaks,
                );

                for peak in self.peaks[first..].iter_mut() {
                    if peak.overlaps_range(feature.start, feature.end) {
                        peak.overlapping_hqaa += 1;
                        incremented += 1;
                    } else if peak.start >= feature.end {
                        break;
                    }
                }
            }
        }

        incremented
    }

    ///
    /// Find the index of the first peak whose start is not less than `start`.
    /// The peaks must be sorted.
    ///
    fn lower_bound(start: u64, peaks: &[Peak]) -> usize {
        let mut size = peaks.len();
        let mut low = 0;

        while size > 0 {
            let half = size / 2;
            let other_half = size - half;
            let probe = low + half;
            let other_low = low + other_half;
            size = half;
            low = if peaks[probe].start < start { other_low } else { low }
        }
        low
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.peaks.sort();
            self.sorted = true;
        }
    }

    /// The peaks in insertion order until the first overlap query sorts them.
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}
