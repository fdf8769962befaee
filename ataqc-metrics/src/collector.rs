use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use ataqc_core::errors::AtaqcError;
use ataqc_core::models::{AlignmentRecord, Feature, Peak};
use ataqc_core::reference::{ReferenceCache, ReferenceGenome};
use ataqc_core::utils::{read_features, read_peaks};
use ataqc_peaks::{PeakIndex, ScanStrategy};

use crate::errors::MetricsError;
use crate::metrics::ReadGroupMetrics;
use crate::models::{Classification, Experiment, Library};
use crate::problems::{ProblemLog, problem_log_path};
use crate::report::ReadGroupReport;
use crate::summary::Configuration;

/// Where each read group's peaks come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PeakSource {
    #[default]
    None,
    /// One peak file shared by every read group.
    File(PathBuf),
    /// `<read group>.peaks` in the collector's directory.
    Auto,
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub experiment: Experiment,
    /// Replaces the DS field of every read group when set.
    pub library_description: Option<String>,
    pub peaks: PeakSource,
    pub scan_strategy: ScanStrategy,
    pub log_problematic_reads: bool,
    /// Directory holding automatic peak files and problematic read logs.
    pub directory: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            experiment: Experiment::default(),
            library_description: None,
            peaks: PeakSource::None,
            scan_strategy: ScanStrategy::default(),
            log_problematic_reads: false,
            directory: PathBuf::from("."),
        }
    }
}

///
/// Read all excluded regions from a list of BED-like files.
///
pub fn load_excluded_regions<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Feature>, AtaqcError> {
    let mut regions = Vec::new();
    for path in paths {
        let loaded = read_features(path)?;
        log::info!(
            "Read {} excluded regions from {}",
            loaded.len(),
            path.as_ref().display()
        );
        regions.extend(loaded);
    }
    Ok(regions)
}

///
/// Routes alignments to per read group metrics.
///
/// Read groups are declared up front, normally from the alignment header.
/// Alignments carrying an `RG` tag go to that read group; alignments without
/// one go to the read group of the previous tagged alignment, or the last
/// declared read group before any tagged alignment has been seen.
///
pub struct MetricsCollector {
    config: CollectorConfig,
    genome: Arc<ReferenceGenome>,
    excluded_regions: Vec<Feature>,
    shared_peaks: Option<Vec<Peak>>,
    read_groups: BTreeMap<String, ReadGroupMetrics>,
    current: Option<String>,
    total_reads: u64,
}

impl MetricsCollector {
    pub fn new(
        config: CollectorConfig,
        genome: ReferenceGenome,
        excluded_regions: Vec<Feature>,
    ) -> Result<Self, MetricsError> {
        let shared_peaks = match &config.peaks {
            PeakSource::File(path) => {
                let peaks = read_peaks(path).map_err(|source| MetricsError::PeakLoadError {
                    read_group: "*".to_string(),
                    source,
                })?;
                log::info!("Read {} peaks from {}", peaks.len(), path.display());
                Some(peaks)
            }
            _ => None,
        };

        Ok(MetricsCollector {
            config,
            genome: Arc::new(genome),
            excluded_regions,
            shared_peaks,
            read_groups: BTreeMap::new(),
            current: None,
            total_reads: 0,
        })
    }

    pub fn genome(&self) -> &ReferenceGenome {
        &self.genome
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// The experiment and reference genome settings, printable as text.
    pub fn configuration(&self) -> Configuration<'_> {
        Configuration {
            experiment: &self.config.experiment,
            genome: &self.genome,
        }
    }

    ///
    /// Declare a read group from the alignment header.
    ///
    pub fn add_read_group(&mut self, id: &str, library: Library) -> Result<(), MetricsError> {
        let source = self.config.peaks.clone();
        self.insert_read_group(id, library, &source)
    }

    ///
    /// Declare the single read group used when the alignment header declares
    /// none. Automatic peak files are keyed by read group, so none are loaded.
    ///
    pub fn add_default_read_group(&mut self, name: &str) -> Result<(), MetricsError> {
        let source = match &self.config.peaks {
            PeakSource::Auto => {
                log::warn!("No read groups in the alignment header; automatic peak files will not be loaded");
                PeakSource::None
            }
            other => other.clone(),
        };
        self.insert_read_group(name, Library::default(), &source)
    }

    fn insert_read_group(
        &mut self,
        id: &str,
        mut library: Library,
        source: &PeakSource,
    ) -> Result<(), MetricsError> {
        if self.read_groups.contains_key(id) {
            return Err(MetricsError::DuplicateReadGroup(id.to_string()));
        }

        if let Some(description) = &self.config.library_description {
            library.description = description.clone();
        }

        let mut references = ReferenceCache::new(Arc::clone(&self.genome));
        let peaks = self.build_peak_index(id, source, &mut references)?;

        let mut metrics = ReadGroupMetrics::new(id, references).with_library(library);
        if let Some(peaks) = peaks {
            metrics = metrics.with_peaks(peaks);
        }
        if self.config.log_problematic_reads {
            let path = problem_log_path(&self.config.directory, id);
            log::info!("Logging problematic reads for {} to {}", id, path.display());
            metrics = metrics.with_problem_sink(Box::new(ProblemLog::create(&path)?));
        }

        self.read_groups.insert(id.to_string(), metrics);
        self.current = Some(id.to_string());
        Ok(())
    }

    fn build_peak_index(
        &self,
        id: &str,
        source: &PeakSource,
        references: &mut ReferenceCache,
    ) -> Result<Option<PeakIndex>, MetricsError> {
        let start = Instant::now();
        let (peaks, origin) = match source {
            PeakSource::None => return Ok(None),
            PeakSource::File(path) => (
                self.shared_peaks.clone().unwrap_or_default(),
                path.clone(),
            ),
            PeakSource::Auto => {
                let path = self.config.directory.join(format!("{}.peaks", id));
                let peaks = read_peaks(&path).map_err(|source| MetricsError::PeakLoadError {
                    read_group: id.to_string(),
                    source,
                })?;
                (peaks, path)
            }
        };

        let index = PeakIndex::from_peaks(
            peaks,
            references,
            &self.excluded_regions,
            self.config.scan_strategy,
        )?;

        if index.is_empty() {
            log::warn!("No peaks were found in {}", origin.display());
        } else {
            for (reference, count) in index.reference_peak_counts() {
                log::debug!("{} peak count: {}", reference, count);
            }
            log::info!(
                "Loaded {} peaks for read group {} from {} in {:.2?}",
                index.len(),
                id,
                origin.display(),
                start.elapsed()
            );
        }

        Ok(Some(index))
    }

    ///
    /// Classify one alignment under its read group.
    ///
    /// # Errors
    ///
    /// Fails if the alignment names an undeclared read group, or if it has no
    /// read group and none has been declared.
    ///
    pub fn add_alignment(
        &mut self,
        read_group: Option<&str>,
        record: &AlignmentRecord,
    ) -> Result<Classification, MetricsError> {
        if let Some(read_group) = read_group {
            if self.current.as_deref() != Some(read_group) {
                self.current = Some(read_group.to_string());
            }
        }

        let id = self.current.as_deref().ok_or(MetricsError::NoReadGroup)?;
        let metrics = self
            .read_groups
            .get_mut(id)
            .ok_or_else(|| MetricsError::UnknownReadGroup(id.to_string()))?;

        self.total_reads += 1;
        Ok(metrics.classify(record))
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    /// Finalize every read group. Read groups are independent, so this runs
    /// in parallel.
    pub fn finalize(&mut self) -> Result<(), MetricsError> {
        self.read_groups
            .par_iter_mut()
            .try_for_each(|(_, metrics)| metrics.finalize())
    }

    pub fn get(&self, id: &str) -> Option<&ReadGroupMetrics> {
        self.read_groups.get(id)
    }

    pub fn read_groups(&self) -> impl Iterator<Item = &ReadGroupMetrics> {
        self.read_groups.values()
    }

    pub fn len(&self) -> usize {
        self.read_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_groups.is_empty()
    }

    pub fn reports(&self) -> Vec<ReadGroupReport> {
        self.read_groups
            .values()
            .map(|metrics| metrics.report(&self.config.experiment))
            .collect()
    }
}
