use std::cmp::Reverse;

use fxhash::FxHashMap;

use ataqc_core::models::{Feature, Peak};
use ataqc_core::reference::ReferenceCache;
use ataqc_core::utils::natural_cmp;

use crate::ScanStrategy;
use crate::collection::ReferencePeakCollection;
use crate::errors::PeakIndexError;

///
/// Genome-wide peak index: one [`ReferencePeakCollection`] per reference
/// name seen while loading peaks.
///
/// Alignment features are counted against the index with
/// [`increment_overlap`](PeakIndex::increment_overlap); the ranking views
/// return snapshots, so the counts never influence where a peak is stored.
///
#[derive(Debug, Clone, Default)]
pub struct PeakIndex {
    collections: FxHashMap<String, ReferencePeakCollection>,
    strategy: ScanStrategy,
    total_territory: u64,
}

impl PeakIndex {
    pub fn new(strategy: ScanStrategy) -> Self {
        PeakIndex {
            collections: FxHashMap::default(),
            strategy,
            total_territory: 0,
        }
    }

    ///
    /// Build an index from a list of peaks, keeping only peaks on autosomal
    /// references that overlap none of the excluded regions.
    ///
    /// # Arguments
    ///
    /// - peaks: the peaks to index
    /// - references: reference classification for the read group
    /// - excluded: regions whose peaks are dropped
    /// - strategy: how overlapping peaks are found for each feature
    ///
    pub fn from_peaks<I>(
        peaks: I,
        references: &mut ReferenceCache,
        excluded: &[Feature],
        strategy: ScanStrategy,
    ) -> Result<Self, PeakIndexError>
    where
        I: IntoIterator<Item = Peak>,
    {
        let mut index = PeakIndex::new(strategy);

        for peak in peaks {
            if !references.is_autosomal(&peak.reference) {
                continue;
            }

            if let Some(region) = excluded.iter().find(|region| peak.overlaps(region)) {
                log::debug!(
                    "Excluding peak [{}] which overlaps excluded region [{}]",
                    peak,
                    region
                );
                continue;
            }

            index.add(peak)?;
        }

        Ok(index)
    }

    pub fn add(&mut self, peak: Peak) -> Result<(), PeakIndexError> {
        let size = peak.size();
        self.collections
            .entry(peak.reference.clone())
            .or_insert_with(|| ReferencePeakCollection::new(peak.reference.clone()))
            .add(peak)?;
        self.total_territory += size;
        Ok(())
    }

    ///
    /// Count a feature against the peaks it overlaps. Features on references
    /// without peaks are ignored. Returns the number of peaks incremented.
    ///
    pub fn increment_overlap(&mut self, feature: &Feature) -> usize {
        let strategy = self.strategy;
        match self.collections.get_mut(&feature.reference) {
            Some(collection) => collection.increment_overlap(feature, strategy),
            None => 0,
        }
    }

    pub fn strategy(&self) -> ScanStrategy {
        self.strategy
    }

    /// Sum of the sizes of every indexed peak.
    pub fn total_territory(&self) -> u64 {
        self.total_territory
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Peak> {
        self.collections
            .values()
            .flat_map(|c| c.peaks().iter().cloned())
            .collect()
    }

    /// Every peak in structural order, references in natural order.
    pub fn list_peaks(&self) -> Vec<Peak> {
        let mut peaks = self.snapshot();
        peaks.sort();
        peaks
    }

    /// Every peak by overlapping alignment count, largest first.
    pub fn rank_by_overlap_descending(&self) -> Vec<Peak> {
        let mut peaks = self.list_peaks();
        peaks.sort_by_key(|p| Reverse(p.overlapping_hqaa));
        peaks
    }

    /// Every peak by size, largest first.
    pub fn rank_by_size_descending(&self) -> Vec<Peak> {
        let mut peaks = self.list_peaks();
        peaks.sort_by_key(|p| Reverse(p.size()));
        peaks
    }

    /// Number of peaks per reference, references in natural order.
    pub fn reference_peak_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .collections
            .values()
            .map(|c| (c.reference(), c.len()))
            .collect();
        counts.sort_by(|a, b| natural_cmp(a.0, b.0));
        counts
    }
}
