use std::collections::BTreeSet;

use ataqc_core::utils::fraction;
use ataqc_peaks::PeakIndex;

/// Rank cutoffs for the cumulative "top N peaks" counts.
pub const TOP_PEAK_CUTOFFS: [usize; 5] = [1, 10, 100, 1000, 10000];

///
/// Peak statistics computed once every alignment has been counted: how many
/// high quality autosomal alignments the best peaks collected, and how
/// alignments and territory accumulate over the ranked peaks.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakRanking {
    pub hqaa_in_peaks: u64,
    /// Running sums at each of [TOP_PEAK_CUTOFFS]. A cutoff beyond the
    /// number of peaks holds the full sum.
    pub top_peak_counts: [u64; 5],
    /// Cumulative fraction of hqaa over peaks ranked by overlap count,
    /// sampled at each percentile rank.
    pub cumulative_fraction_of_hqaa: Vec<f64>,
    /// Cumulative fraction of peak territory over peaks ranked by size,
    /// sampled at each percentile rank.
    pub cumulative_fraction_of_territory: Vec<f64>,
}

impl PeakRanking {
    pub fn compute(index: &PeakIndex, hqaa: u64) -> Self {
        let by_overlap = index.rank_by_overlap_descending();
        let ranks = percentile_ranks(by_overlap.len() as u64);

        let mut ranking = PeakRanking::default();
        let mut cumulative_fraction = 0.0;
        for (rank, peak) in (1..).zip(by_overlap.iter()) {
            ranking.hqaa_in_peaks += peak.overlapping_hqaa;
            for (cutoff, count) in TOP_PEAK_CUTOFFS.iter().zip(ranking.top_peak_counts.iter_mut()) {
                if rank <= *cutoff {
                    *count = ranking.hqaa_in_peaks;
                }
            }

            cumulative_fraction += fraction(peak.overlapping_hqaa, hqaa);
            if ranks.contains(&(rank as u64)) {
                ranking.cumulative_fraction_of_hqaa.push(cumulative_fraction);
            }
        }

        // cutoffs past the last peak hold the full sum
        for (cutoff, count) in TOP_PEAK_CUTOFFS.iter().zip(ranking.top_peak_counts.iter_mut()) {
            if *cutoff > by_overlap.len() {
                *count = ranking.hqaa_in_peaks;
            }
        }

        let territory = index.total_territory();
        let mut cumulative_fraction = 0.0;
        for (rank, peak) in (1u64..).zip(index.rank_by_size_descending().iter()) {
            cumulative_fraction += fraction(peak.size(), territory);
            if ranks.contains(&rank) {
                ranking.cumulative_fraction_of_territory.push(cumulative_fraction);
            }
        }

        ranking
    }

    pub fn top_peak(&self) -> u64 {
        self.top_peak_counts[0]
    }

    pub fn top_10_peaks(&self) -> u64 {
        self.top_peak_counts[1]
    }

    pub fn top_100_peaks(&self) -> u64 {
        self.top_peak_counts[2]
    }

    pub fn top_1000_peaks(&self) -> u64 {
        self.top_peak_counts[3]
    }

    pub fn top_10000_peaks(&self) -> u64 {
        self.top_peak_counts[4]
    }
}

///
/// The distinct ranks `floor(peak_count * p / 100)` for `p` in `1..=100`.
///
pub fn percentile_ranks(peak_count: u64) -> BTreeSet<u64> {
    (1..=100).map(|p| peak_count * p / 100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use ataqc_core::models::{Feature, Peak};
    use ataqc_peaks::ScanStrategy;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// Peaks A to D with sizes 10, 300, 20, 50 and counts 5, 5, 3, 1.
    #[fixture]
    fn index() -> PeakIndex {
        let mut index = PeakIndex::new(ScanStrategy::Exact);
        for (reference, start, end, name) in [
            ("chr1", 0, 10, "A"),
            ("chr1", 100, 400, "B"),
            ("chr2", 0, 20, "C"),
            ("chr2", 100, 150, "D"),
        ] {
            index.add(Peak::new(reference, start, end, name).unwrap()).unwrap();
        }

        let hits = [("chr1", 5, 5), ("chr1", 200, 5), ("chr2", 10, 3), ("chr2", 120, 1)];
        for (reference, position, count) in hits {
            for _ in 0..count {
                index.increment_overlap(&Feature::new(reference, position, position + 1).unwrap());
            }
        }
        index
    }

    #[rstest]
    fn test_percentile_ranks() {
        assert_eq!(percentile_ranks(4), BTreeSet::from([0, 1, 2, 3, 4]));
        assert_eq!(percentile_ranks(0), BTreeSet::from([0]));
        assert_eq!(percentile_ranks(1000).len(), 100);
        assert!(percentile_ranks(100).contains(&29));
    }

    #[rstest]
    fn test_top_peaks(index: PeakIndex) {
        let ranking = PeakRanking::compute(&index, 20);

        assert_eq!(ranking.hqaa_in_peaks, 14);
        assert_eq!(ranking.top_peak(), 5);
        assert_eq!(ranking.top_10_peaks(), 14);
        assert_eq!(ranking.top_10000_peaks(), 14);
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{:?} != {:?}", actual, expected);
        }
    }

    #[rstest]
    fn test_cumulative_fractions(index: PeakIndex) {
        let ranking = PeakRanking::compute(&index, 20);

        assert_close(&ranking.cumulative_fraction_of_hqaa, &[0.25, 0.5, 0.65, 0.7]);
        assert_close(
            &ranking.cumulative_fraction_of_territory,
            &[300.0 / 380.0, 350.0 / 380.0, 370.0 / 380.0, 1.0],
        );
    }

    #[rstest]
    fn test_no_hqaa_is_nan(index: PeakIndex) {
        let ranking = PeakRanking::compute(&index, 0);
        assert_eq!(ranking.cumulative_fraction_of_hqaa.len(), 4);
        assert!(ranking.cumulative_fraction_of_hqaa.iter().all(|f| f.is_nan()));
    }

    #[rstest]
    fn test_no_peaks() {
        let ranking = PeakRanking::compute(&PeakIndex::new(ScanStrategy::default()), 10);
        assert_eq!(ranking, PeakRanking::default());
    }
}
