use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};

use ataqc_core::reference::ReferenceGenome;
use ataqc_core::utils::remove_all_extensions;
use ataqc_metrics::collector::load_excluded_regions;
use ataqc_metrics::{CollectorConfig, Experiment, MetricsCollector, PeakSource};
use ataqc_peaks::ScanStrategy;

use crate::cli::{AUTO_PEAK_FILE, METRICS_FILE_SUFFIX};
use crate::output::{write_metrics, write_summary};
use crate::reader::BamReader;

const PROGRESS_INTERVAL: u64 = 100_000;

pub fn run_ataqc(matches: &ArgMatches) -> Result<()> {
    let organism = matches
        .get_one::<String>("organism")
        .expect("An organism is required.");
    let alignment = PathBuf::from(
        matches
            .get_one::<String>("alignment")
            .expect("A path to an alignment file is required."),
    );

    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| remove_all_extensions(&alignment));
    let metrics_file = matches
        .get_one::<String>("metrics-file")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}{}", name, METRICS_FILE_SUFFIX)));
    let verbose = matches.get_flag("verbose");

    let genome = build_genome(matches, organism)?;
    let excluded_files: Vec<&String> = matches
        .get_many::<String>("excluded-region-file")
        .map(|files| files.collect())
        .unwrap_or_default();
    let excluded = load_excluded_regions(&excluded_files)
        .context("Failed to load excluded regions")?;
    if !excluded_files.is_empty() {
        log::info!(
            "Read {} excluded regions from {} files",
            excluded.len(),
            excluded_files.len()
        );
    }

    let config = build_config(matches, organism)?;
    let mut collector =
        MetricsCollector::new(config, genome, excluded).context("Failed to load peaks")?;

    let mut reader = BamReader::open(&alignment)?;
    log::debug!(
        "{} declares {} reference sequences",
        alignment.display(),
        reader.header().reference_sequences().len()
    );

    let read_groups = reader.read_groups();
    if read_groups.is_empty() {
        log::info!("No read groups declared; collecting all alignments as {}", name);
        collector.add_default_read_group(&name)?;
    }
    for (id, library) in read_groups {
        collector
            .add_read_group(&id, library)
            .with_context(|| format!("Failed to set up read group {}", id))?;
    }

    let start = Instant::now();
    let progress = verbose.then(|| spinner(&alignment));

    let count = reader.for_each_alignment(|read_group, record| {
        collector
            .add_alignment(read_group, record)
            .with_context(|| format!("Failed to classify alignment {}", record.name))?;
        if let Some(pb) = &progress {
            if collector.total_reads() % PROGRESS_INTERVAL == 0 {
                pb.set_position(collector.total_reads());
            }
        }
        Ok(())
    })?;

    if let Some(pb) = &progress {
        pb.finish_with_message(format!("Processed {}", alignment.display()));
    }
    log::info!(
        "Classified {} alignments in {:.2?}",
        count,
        start.elapsed()
    );

    collector.finalize()?;

    let reports = collector.reports();
    write_summary(&mut std::io::stdout().lock(), &collector.configuration(), &reports)
        .context("Failed to print the metrics summary")?;
    write_metrics(&metrics_file, &reports)?;
    log::info!("Metrics written to {}", metrics_file.display());

    Ok(())
}

fn build_genome(matches: &ArgMatches, organism: &str) -> Result<ReferenceGenome> {
    let mitochondrial = matches
        .get_one::<String>("mitochondrial-reference-name")
        .expect("A mitochondrial reference name has a default.");
    let genome = ReferenceGenome::new(organism, mitochondrial);

    let genome = match matches.get_one::<String>("autosomal-reference-file") {
        Some(path) => genome
            .with_autosomal_file(path)
            .with_context(|| format!("Failed to read autosomal references from {}", path))?,
        None => genome,
    };

    if genome.autosomal_references().is_empty() {
        log::warn!(
            "No autosomal references are known for {}; no alignments will be high quality autosomal",
            organism
        );
    }

    Ok(genome)
}

fn build_config(matches: &ArgMatches, organism: &str) -> Result<CollectorConfig> {
    let text = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();

    let peaks = match matches.get_one::<String>("peak-file") {
        Some(value) if value == AUTO_PEAK_FILE => PeakSource::Auto,
        Some(path) => PeakSource::File(PathBuf::from(path)),
        None => PeakSource::None,
    };

    let scan_strategy = matches
        .get_one::<String>("peak-scan")
        .map(|value| value.parse::<ScanStrategy>())
        .transpose()
        .map_err(|err| anyhow!(err))?
        .unwrap_or_default();

    Ok(CollectorConfig {
        experiment: Experiment {
            organism: organism.to_string(),
            description: text("description"),
            url: text("url"),
        },
        library_description: matches.get_one::<String>("library-description").cloned(),
        peaks,
        scan_strategy,
        log_problematic_reads: matches.get_flag("log-problematic-reads"),
        ..Default::default()
    })
}

fn spinner(alignment: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} reads)")
    {
        pb.set_style(style);
    }
    pb.set_message(format!(
        "Classifying {:?}",
        alignment.file_name().unwrap_or_default()
    ));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::cli::create_ataqc_cli;

    fn parse(args: &[&str]) -> ArgMatches {
        create_ataqc_cli().try_get_matches_from(args).unwrap()
    }

    #[rstest]
    #[case(&["ataqc", "human", "a.bam"], PeakSource::None)]
    #[case(&["ataqc", "human", "a.bam", "--peak-file", "auto"], PeakSource::Auto)]
    #[case(
        &["ataqc", "human", "a.bam", "--peak-file", "peaks.bed"],
        PeakSource::File(PathBuf::from("peaks.bed"))
    )]
    fn test_peak_source(#[case] args: &[&str], #[case] expected: PeakSource) {
        let config = build_config(&parse(args), "human").unwrap();
        assert_eq!(config.peaks, expected);
    }

    #[rstest]
    fn test_config_from_arguments() {
        let matches = parse(&[
            "ataqc",
            "mouse",
            "a.bam",
            "--description",
            "liver",
            "--library-description",
            "lane 1",
            "--peak-scan",
            "exact",
            "--log-problematic-reads",
        ]);
        let config = build_config(&matches, "mouse").unwrap();

        assert_eq!(config.experiment.organism, "mouse");
        assert_eq!(config.experiment.description, "liver");
        assert_eq!(config.experiment.url, "");
        assert_eq!(config.library_description.as_deref(), Some("lane 1"));
        assert_eq!(config.scan_strategy, ScanStrategy::Exact);
        assert!(config.log_problematic_reads);
    }

    #[rstest]
    fn test_genome_from_arguments() {
        let matches = parse(&[
            "ataqc",
            "rat",
            "a.bam",
            "--mitochondrial-reference-name",
            "MT",
        ]);
        let genome = build_genome(&matches, "rat").unwrap();

        assert_eq!(genome.mitochondrial, "MT");
        assert!(genome.is_autosomal("chr20"));
        assert!(!genome.is_autosomal("chr21"));
    }

    #[rstest]
    fn test_missing_autosomal_file() {
        let matches = parse(&[
            "ataqc",
            "human",
            "a.bam",
            "--autosomal-reference-file",
            "does/not/exist.txt",
        ]);
        assert!(build_genome(&matches, "human").is_err());
    }
}
