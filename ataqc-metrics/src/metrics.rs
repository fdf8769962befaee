use std::collections::BTreeMap;

use fxhash::FxHashMap;

use ataqc_core::models::AlignmentRecord;
use ataqc_core::reference::{ReferenceCache, ReferenceKind};
use ataqc_core::utils::{fraction, percentage};
use ataqc_peaks::PeakIndex;

use crate::errors::MetricsError;
use crate::models::{Classification, Experiment, Library, ReadCounts};
use crate::problems::{Problem, ProblemSink};
use crate::ranking::PeakRanking;
use crate::report::{
    FRAGMENT_LENGTH_COUNTS_FIELDS, FragmentLengthCount, HQAA_FRAGMENT_LENGTH_COUNTS_FIELDS,
    MAPQ_COUNTS_FIELDS, MAPQ_THRESHOLD_FIELDS, PEAKS_FIELDS, PeakPercentiles, PeakSummary, Ratio,
    ReadGroupReport,
};
use crate::statistics::{
    MAPQ_THRESHOLDS, fragment_length_table, mean_mapq, median_mapq, reads_with_mapq_at_least,
};

/// Minimum mapping quality of a high quality autosomal alignment.
pub const HQAA_MINIMUM_MAPQ: u8 = 30;

/// Fragment lengths counted as short (nucleosome free).
pub const SHORT_FRAGMENT_LENGTHS: std::ops::RangeInclusive<u64> = 50..=100;

/// Fragment lengths counted as mononucleosomal.
pub const MONONUCLEOSOMAL_FRAGMENT_LENGTHS: std::ops::RangeInclusive<u64> = 150..=200;

///
/// All measurements for one read group.
///
/// Alignments are fed one at a time to [`classify`](ReadGroupMetrics::classify)
/// in stream order. Reads that are paired and mapped but not properly paired
/// can only be diagnosed once the longest proper fragment is known, so
/// [`finalize`](ReadGroupMetrics::finalize) must be called exactly once after
/// the last alignment.
///
pub struct ReadGroupMetrics {
    name: String,
    library: Library,
    counts: ReadCounts,
    mapq_counts: BTreeMap<u8, u64>,
    fragment_length_counts: BTreeMap<u64, u64>,
    hqaa_fragment_length_counts: BTreeMap<u64, u64>,
    /// fragment lengths of improperly paired reads, by read name
    unlikely_fragment_sizes: FxHashMap<String, Vec<u64>>,
    references: ReferenceCache,
    peaks: Option<PeakIndex>,
    problems: Option<Box<dyn ProblemSink>>,
    ranking: Option<PeakRanking>,
    finalized: bool,
}

impl ReadGroupMetrics {
    pub fn new(name: impl Into<String>, references: ReferenceCache) -> Self {
        ReadGroupMetrics {
            name: name.into(),
            library: Library::default(),
            counts: ReadCounts::default(),
            mapq_counts: BTreeMap::new(),
            fragment_length_counts: BTreeMap::new(),
            hqaa_fragment_length_counts: BTreeMap::new(),
            unlikely_fragment_sizes: FxHashMap::default(),
            references,
            peaks: None,
            problems: None,
            ranking: None,
            finalized: false,
        }
    }

    pub fn with_library(mut self, library: Library) -> Self {
        self.library = library;
        self
    }

    pub fn with_peaks(mut self, peaks: PeakIndex) -> Self {
        self.peaks = Some(peaks);
        self
    }

    pub fn with_problem_sink(mut self, sink: Box<dyn ProblemSink>) -> Self {
        self.problems = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn counts(&self) -> &ReadCounts {
        &self.counts
    }

    pub fn mapq_counts(&self) -> &BTreeMap<u8, u64> {
        &self.mapq_counts
    }

    pub fn fragment_length_counts(&self) -> &BTreeMap<u64, u64> {
        &self.fragment_length_counts
    }

    pub fn hqaa_fragment_length_counts(&self) -> &BTreeMap<u64, u64> {
        &self.hqaa_fragment_length_counts
    }

    pub fn peaks(&self) -> Option<&PeakIndex> {
        self.peaks.as_ref()
    }

    /// Available once the read group has been finalized with peaks loaded.
    pub fn ranking(&self) -> Option<&PeakRanking> {
        self.ranking.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    ///
    /// Count one alignment and assign it to exactly one category. The first
    /// matching test wins, in the order the variants of [Classification] are
    /// checked below.
    ///
    pub fn classify(&mut self, record: &AlignmentRecord) -> Classification {
        let flags = record.flags;
        let counts = &mut self.counts;

        counts.total_reads += 1;
        *self.mapq_counts.entry(record.mapping_quality).or_insert(0) += 1;

        if flags.is_reverse() {
            counts.reverse_reads += 1;
        } else {
            counts.forward_reads += 1;
        }
        if flags.is_secondary() {
            counts.secondary_reads += 1;
        }
        if flags.is_supplementary() {
            counts.supplementary_reads += 1;
        }
        if flags.is_duplicate() {
            counts.duplicate_reads += 1;
        }
        if flags.is_read1() {
            counts.first_reads += 1;
        }
        if flags.is_read2() {
            counts.second_reads += 1;
        }
        if flags.is_mate_reverse() {
            counts.reverse_mate_reads += 1;
        } else {
            counts.forward_mate_reads += 1;
        }
        if flags.is_paired() {
            counts.paired_reads += 1;
        }

        let classification = if flags.is_qc_fail() {
            counts.qc_failed_reads += 1;
            Classification::QcFailed
        } else if !flags.is_paired() {
            counts.unpaired_reads += 1;
            Classification::Unpaired
        } else if flags.is_unmapped() {
            counts.unmapped_reads += 1;
            Classification::Unmapped
        } else if flags.is_mate_unmapped() {
            counts.unmapped_mate_reads += 1;
            Classification::UnmappedMate
        } else if record.is_rf() {
            counts.rf_reads += 1;
            Classification::Rf
        } else if record.is_ff() {
            counts.ff_reads += 1;
            Classification::Ff
        } else if record.is_rr() {
            counts.rr_reads += 1;
            Classification::Rr
        } else if record.mapping_quality == 0 {
            counts.reads_mapped_with_zero_quality += 1;
            Classification::ZeroQuality
        } else if flags.is_paired_and_mapped() {
            counts.paired_and_mapped_reads += 1;

            if flags.is_properly_paired() {
                self.count_proper_pair(record);
                Classification::ProperlyPaired
            } else if record.reference_id != record.mate_reference_id {
                counts.reads_with_mate_mapped_to_different_reference += 1;
                Classification::DifferentReference
            } else {
                // the mate may be too far away, which can only be judged
                // once the longest proper fragment is known
                self.unlikely_fragment_sizes
                    .entry(record.name.to_string())
                    .or_default()
                    .push(record.fragment_length());
                Classification::Deferred
            }
        } else {
            counts.unclassified_reads += 1;
            Classification::Unclassified
        };

        if let Some(sink) = self.problems.as_mut() {
            if let Ok(problem) = Problem::try_from(classification) {
                sink.report(problem, &record.to_string());
            }
        }

        classification
    }

    fn count_proper_pair(&mut self, record: &AlignmentRecord) {
        let flags = record.flags;
        let counts = &mut self.counts;
        counts.properly_paired_and_mapped_reads += 1;

        if record.is_fr() {
            counts.fr_reads += 1;
        }

        if !flags.is_original() {
            return;
        }

        // only original alignments on a named reference count as autosomal
        // or mitochondrial
        let kind = record
            .reference_name
            .map(|reference| self.references.kind(reference));
        match kind {
            Some(ReferenceKind::Autosomal) => {
                counts.total_autosomal_reads += 1;
                if flags.is_duplicate() {
                    counts.duplicate_autosomal_reads += 1;
                }
            }
            Some(ReferenceKind::Mitochondrial) => {
                counts.total_mitochondrial_reads += 1;
                if flags.is_duplicate() {
                    counts.duplicate_mitochondrial_reads += 1;
                }
            }
            _ => {}
        }

        let fragment_length = record.fragment_length();
        *self.fragment_length_counts.entry(fragment_length).or_insert(0) += 1;
        counts.maximum_proper_pair_fragment_size =
            counts.maximum_proper_pair_fragment_size.max(fragment_length);

        let hqaa = !flags.is_duplicate()
            && record.mapping_quality >= HQAA_MINIMUM_MAPQ
            && kind == Some(ReferenceKind::Autosomal);
        if !hqaa {
            return;
        }

        counts.hqaa += 1;
        *self
            .hqaa_fragment_length_counts
            .entry(fragment_length)
            .or_insert(0) += 1;

        if SHORT_FRAGMENT_LENGTHS.contains(&fragment_length) {
            counts.hqaa_short_count += 1;
        }
        if MONONUCLEOSOMAL_FRAGMENT_LENGTHS.contains(&fragment_length) {
            counts.hqaa_mononucleosomal_count += 1;
        }

        if let (Some(peaks), Some(feature)) = (self.peaks.as_mut(), record.feature()) {
            peaks.increment_overlap(&feature);
        }
    }

    ///
    /// Diagnose the deferred reads and rank the peaks. Reads whose fragment is
    /// longer than every proper pair's had a mate too distant; the rest were
    /// improperly paired for reasons unknown.
    ///
    /// # Errors
    ///
    /// Fails if the read group was already finalized. A problem log that
    /// cannot be flushed is only warned about.
    ///
    pub fn finalize(&mut self) -> Result<(), MetricsError> {
        if self.finalized {
            return Err(MetricsError::AlreadyFinalized(self.name.clone()));
        }

        let maximum = self.counts.maximum_proper_pair_fragment_size;
        for (read_name, fragment_lengths) in self.unlikely_fragment_sizes.drain() {
            for fragment_length in fragment_lengths {
                let problem = if fragment_length > maximum {
                    self.counts.reads_with_mate_too_distant += 1;
                    Problem::MateTooDistant
                } else {
                    self.counts.reads_mapped_and_paired_but_improperly += 1;
                    Problem::Undiagnosed
                };
                if let Some(sink) = self.problems.as_mut() {
                    sink.report(problem, &read_name);
                }
            }
        }

        self.ranking = self
            .peaks
            .as_ref()
            .map(|peaks| PeakRanking::compute(peaks, self.counts.hqaa));

        self.finalized = true;

        if let Some(sink) = self.problems.as_mut() {
            if let Err(err) = sink.flush() {
                log::warn!("Could not flush the problem log for {}: {}", self.name, err);
            }
        }

        let unaccounted = self.counts.total_reads - self.counts.classified_reads();
        if unaccounted > 0 || self.counts.unclassified_reads > 0 {
            log::warn!(
                "Read group {}: {} reads slipped through the classification and {} were unclassified",
                self.name,
                unaccounted,
                self.counts.unclassified_reads
            );
        }
        log::info!(
            "Read group {}: {} reads, {} high quality autosomal alignments",
            self.name,
            self.counts.total_reads,
            self.counts.hqaa
        );

        Ok(())
    }

    /// Lay out the read group's measurements for output.
    pub fn report(&self, experiment: &Experiment) -> ReadGroupReport {
        let counts = &self.counts;

        let peaks: Vec<PeakSummary> = self
            .peaks
            .as_ref()
            .map(|index| {
                index
                    .list_peaks()
                    .into_iter()
                    .map(|peak| {
                        let size = peak.size();
                        PeakSummary(peak.name, peak.overlapping_hqaa, size)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ranking = self.ranking.clone().unwrap_or_default();
        let to_ratios = |values: &[f64]| values.iter().copied().map(Ratio).collect::<Vec<_>>();
        let to_rows = |table: Vec<(u64, u64, f64)>| {
            table
                .into_iter()
                .map(|(length, count, fraction)| FragmentLengthCount(length, count, Ratio(fraction)))
                .collect::<Vec<_>>()
        };

        ReadGroupReport {
            name: self.name.clone(),
            organism: experiment.organism.clone(),
            description: experiment.description.clone(),
            url: experiment.url.clone(),
            library: self.library.clone(),
            counts: counts.clone(),
            total_problems: counts.total_problems(),
            short_mononucleosomal_ratio: Ratio(fraction(
                counts.hqaa_short_count,
                counts.hqaa_mononucleosomal_count,
            )),
            hqaa_percent_of_autosomal_reads: Ratio(percentage(
                counts.hqaa,
                counts.total_autosomal_reads,
            )),
            fragment_length_counts_fields: FRAGMENT_LENGTH_COUNTS_FIELDS,
            fragment_length_counts: to_rows(fragment_length_table(
                &self.fragment_length_counts,
                counts.total_reads,
            )),
            hqaa_fragment_length_counts_fields: HQAA_FRAGMENT_LENGTH_COUNTS_FIELDS,
            hqaa_fragment_length_counts: to_rows(fragment_length_table(
                &self.hqaa_fragment_length_counts,
                counts.hqaa,
            )),
            mapq_counts_fields: MAPQ_COUNTS_FIELDS,
            mapq_counts: self.mapq_counts.iter().map(|(q, c)| (*q, *c)).collect(),
            mean_mapq: Ratio(mean_mapq(&self.mapq_counts)),
            median_mapq: Ratio(median_mapq(&self.mapq_counts)),
            mapq_threshold_fields: MAPQ_THRESHOLD_FIELDS,
            reads_with_mapq_at_least: MAPQ_THRESHOLDS
                .iter()
                .map(|t| (*t, reads_with_mapq_at_least(&self.mapq_counts, *t)))
                .collect(),
            peaks_requested: self.peaks.is_some(),
            peaks_fields: PEAKS_FIELDS,
            total_peaks: peaks.len() as u64,
            peaks,
            peak_percentiles: PeakPercentiles {
                cumulative_fraction_of_hqaa: to_ratios(&ranking.cumulative_fraction_of_hqaa),
                cumulative_fraction_of_territory: to_ratios(
                    &ranking.cumulative_fraction_of_territory,
                ),
            },
            total_peak_territory: self.peaks.as_ref().map_or(0, |p| p.total_territory()),
            hqaa_in_peaks: ranking.hqaa_in_peaks,
            top_peak_hqaa_read_count: ranking.top_peak(),
            top_10_peak_hqaa_read_count: ranking.top_10_peaks(),
            top_100_peak_hqaa_read_count: ranking.top_100_peaks(),
            top_1000_peak_hqaa_read_count: ranking.top_1000_peaks(),
            top_10000_peak_hqaa_read_count: ranking.top_10000_peaks(),
            hqaa_overlapping_peaks_percent: Ratio(percentage(ranking.hqaa_in_peaks, counts.hqaa)),
        }
    }
}
