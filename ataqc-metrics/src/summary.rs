//! Plain text rendering of the collector configuration and read group reports.

use std::fmt::{self, Display};

use ataqc_core::reference::ReferenceGenome;
use ataqc_core::utils::{fraction, percentage, wrap};

use crate::models::{Experiment, Library};
use crate::report::ReadGroupReport;

const LABEL_WIDTH: usize = 40;
const WRAP_WIDTH: usize = 72;

/// `" (12.500%)"`, or `" (NaN%)"` when the denominator is zero.
fn share(numerator: u64, denominator: u64) -> String {
    share_of(numerator, denominator, 3, "")
}

fn share_of(numerator: u64, denominator: u64, precision: usize, of: &str) -> String {
    format!(
        " ({:.*}%{})",
        precision,
        percentage(numerator, denominator),
        of
    )
}

fn line(f: &mut fmt::Formatter<'_>, label: &str, count: u64, denominator: u64) -> fmt::Result {
    writeln!(
        f,
        "{:<width$}{}{}",
        format!("  {}: ", label),
        count,
        share(count, denominator),
        width = LABEL_WIDTH
    )
}

fn underlined(f: &mut fmt::Formatter<'_>, title: &str, rule: char, indent: &str) -> fmt::Result {
    writeln!(f, "{}{}", indent, title)?;
    writeln!(
        f,
        "{}{}",
        indent,
        rule.to_string().repeat(title.chars().count())
    )
}

///
/// The experiment and reference genome settings shared by every read group.
///
pub struct Configuration<'a> {
    pub experiment: &'a Experiment,
    pub genome: &'a ReferenceGenome,
}

impl Display for Configuration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        underlined(f, "Experiment information", '=', "")?;
        writeln!(f, "Organism: {}", self.experiment.organism)?;
        writeln!(f, "Description: {}", self.experiment.description)?;
        writeln!(f, "URL: {}", self.experiment.url)?;
        writeln!(f)?;

        underlined(f, "Reference genome configuration", '=', "")?;
        writeln!(f, "Mitochondrial reference: {}", self.genome.mitochondrial)?;
        writeln!(f, "Autosomal references: ")?;
        let references = self.genome.autosomal_references().join(", ");
        write!(f, "{}", wrap(&references, WRAP_WIDTH, 2))?;
        writeln!(f)
    }
}

impl Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Library: {}", self.library)?;
        writeln!(f, "Sample: {}", self.sample)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f)?;
        writeln!(f, "Sequencing center: {}", self.center)?;
        writeln!(f, "Sequencing date: {}", self.date)?;
        writeln!(f, "Sequencing platform: {}", self.platform)?;
        writeln!(f, "Platform model: {}", self.platform_model)?;
        writeln!(f, "Platform unit: {}", self.platform_unit)?;
        writeln!(f, "Flow order: {}", self.flow_order)?;
        writeln!(f, "Key sequence: {}", self.key_sequence)?;
        writeln!(
            f,
            "Predicted median insert size: {}",
            self.predicted_median_insert_size
        )?;
        writeln!(f, "Programs: {}", self.programs)
    }
}

impl Display for ReadGroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        let total = c.total_reads;

        underlined(f, "Read Group", '=', "")?;
        writeln!(f, "ID: {}", self.name)?;
        writeln!(f, "{}", self.library)?;

        underlined(f, "Metrics", '-', "")?;
        writeln!(f)?;

        underlined(f, "Read Mapping Metrics", '-', "  ")?;
        writeln!(f, "  Total reads: {}", total)?;
        writeln!(
            f,
            "  Total problems: {}{}",
            self.total_problems,
            share(self.total_problems, total)
        )?;
        writeln!(
            f,
            "  Properly paired and mapped reads: {}{}",
            c.properly_paired_and_mapped_reads,
            share(c.properly_paired_and_mapped_reads, total)
        )?;
        writeln!(
            f,
            "  Secondary reads: {}{}",
            c.secondary_reads,
            share(c.secondary_reads, total)
        )?;
        writeln!(
            f,
            "  Supplementary reads: {}{}",
            c.supplementary_reads,
            share(c.supplementary_reads, total)
        )?;
        writeln!(
            f,
            "  Duplicate reads: {}{}",
            c.duplicate_reads,
            share_of(c.duplicate_reads, total, 3, " of all reads")
        )?;
        writeln!(f)?;

        underlined(f, "Quality Indicators", '-', "  ")?;
        writeln!(
            f,
            "  Short to mononucleosomal ratio: {:.3}",
            fraction(c.hqaa_short_count, c.hqaa_mononucleosomal_count)
        )?;
        writeln!(
            f,
            "  High quality, nonduplicate, properly paired, uniquely mapped autosomal alignments: {}",
            c.hqaa
        )?;
        writeln!(
            f,
            "    as a percentage of autosomal reads: {:.3}%",
            percentage(c.hqaa, c.total_autosomal_reads)
        )?;
        writeln!(
            f,
            "    as a percentage of all reads: {:.3}%",
            percentage(c.hqaa, total)
        )?;
        writeln!(f)?;

        underlined(f, "Paired Read Metrics", '-', "  ")?;
        line(f, "Paired reads", c.paired_reads, total)?;
        line(f, "Paired and mapped reads", c.paired_and_mapped_reads, total)?;
        writeln!(
            f,
            "{:<width$}{}{}",
            "  FR reads: ",
            c.fr_reads,
            share_of(c.fr_reads, total, 6, ""),
            width = LABEL_WIDTH
        )?;
        line(f, "First of pair", c.first_reads, total)?;
        line(f, "Second of pair", c.second_reads, total)?;
        line(f, "Forward reads", c.forward_reads, total)?;
        line(f, "Reverse reads", c.reverse_reads, total)?;
        line(f, "Forward mate reads", c.forward_mate_reads, total)?;
        line(f, "Reverse mate reads", c.reverse_mate_reads, total)?;
        writeln!(f)?;

        underlined(f, "Unmapped Read Metrics", '-', "  ")?;
        line(f, "Unmapped reads", c.unmapped_reads, total)?;
        line(f, "Unmapped mate reads", c.unmapped_mate_reads, total)?;
        line(f, "Reads not passing quality controls", c.qc_failed_reads, total)?;
        line(f, "Unpaired reads", c.unpaired_reads, total)?;
        line(
            f,
            "Reads with zero mapping quality",
            c.reads_mapped_with_zero_quality,
            total,
        )?;
        writeln!(f)?;

        underlined(f, "Aberrant Mapping Metrics", '-', "  ")?;
        line(f, "RF reads", c.rf_reads, total)?;
        line(f, "FF reads", c.ff_reads, total)?;
        line(f, "RR reads", c.rr_reads, total)?;
        writeln!(f, "  Reads that paired and mapped but...")?;
        line(
            f,
            "  on different chromosomes",
            c.reads_with_mate_mapped_to_different_reference,
            total,
        )?;
        writeln!(
            f,
            "{:<width$}{}{} (longest proper fragment seems to be {})",
            "    probably too far from their mates: ",
            c.reads_with_mate_too_distant,
            share(c.reads_with_mate_too_distant, total),
            c.maximum_proper_pair_fragment_size,
            width = LABEL_WIDTH
        )?;
        line(
            f,
            "  just not properly",
            c.reads_mapped_and_paired_but_improperly,
            total,
        )?;
        writeln!(f)?;

        underlined(f, "Autosomal/Mitochondrial Metrics", '-', "  ")?;
        writeln!(
            f,
            "  Total autosomal reads: {}{}",
            c.total_autosomal_reads,
            share_of(c.total_autosomal_reads, total, 3, " of all reads")
        )?;
        writeln!(
            f,
            "  Total mitochondrial reads: {}{}",
            c.total_mitochondrial_reads,
            share_of(c.total_mitochondrial_reads, total, 3, " of all reads")
        )?;
        writeln!(
            f,
            "  Duplicate autosomal reads: {}{}",
            c.duplicate_autosomal_reads,
            share_of(
                c.duplicate_autosomal_reads,
                c.total_autosomal_reads,
                3,
                " of all autosomal reads"
            )
        )?;
        writeln!(
            f,
            "  Duplicate mitochondrial reads: {}{}",
            c.duplicate_mitochondrial_reads,
            share_of(
                c.duplicate_mitochondrial_reads,
                c.total_mitochondrial_reads,
                3,
                " of all mitochondrial reads"
            )
        )?;
        writeln!(f)?;

        underlined(f, "Mapping Quality", '-', "  ")?;
        writeln!(f, "  Mean MAPQ: {:.6}", self.mean_mapq.0)?;
        writeln!(f, "  Median MAPQ: {:.6}", self.median_mapq.0)?;
        writeln!(f, "  Reads with MAPQ >=...")?;
        for (threshold, count) in &self.reads_with_mapq_at_least {
            writeln!(f, "{:>20}: {}{}", threshold, count, share(*count, total))?;
        }

        if self.peaks_requested {
            let of_hqaa = " of all high quality autosomal alignments";
            writeln!(f)?;
            underlined(f, "Peak Metrics", '-', "  ")?;
            writeln!(f, "  Peak count: {}", self.total_peaks)?;
            writeln!(f)?;
            writeln!(
                f,
                "  High quality autosomal alignments that overlapped peaks: {}{}",
                self.hqaa_in_peaks,
                share_of(self.hqaa_in_peaks, c.hqaa, 3, of_hqaa)
            )?;
            writeln!(
                f,
                "  Number of high quality autosomal alignments overlapping the top 10,000 peaks: "
            )?;
            for (label, count) in [
                ("Top peak: ", self.top_peak_hqaa_read_count),
                ("Top 10 peaks: ", self.top_10_peak_hqaa_read_count),
                ("Top 100 peaks: ", self.top_100_peak_hqaa_read_count),
                ("Top 1000 peaks: ", self.top_1000_peak_hqaa_read_count),
                ("Top 10,000 peaks: ", self.top_10000_peak_hqaa_read_count),
            ] {
                writeln!(
                    f,
                    "{:>20}{}{}",
                    label,
                    count,
                    share_of(count, c.hqaa, 3, of_hqaa)
                )?;
            }
        }

        let accounted = c.total_problems() + c.properly_paired_and_mapped_reads;
        if c.unclassified_reads > 0 || accounted != total {
            let mysteries = total.saturating_sub(c.unclassified_reads + accounted);
            writeln!(
                f,
                "  Some reads slipped through our taxonomy: {}{}",
                mysteries,
                share(mysteries, total)
            )?;
            writeln!(f, "  Unclassified reads: {}", c.unclassified_reads)?;
        }

        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use ataqc_core::models::{AlignmentRecord, Flags, Peak};
    use ataqc_core::reference::{ReferenceCache, ReferenceGenome};
    use ataqc_peaks::{PeakIndex, ScanStrategy};
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::metrics::ReadGroupMetrics;

    const PROPER: u16 = Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::MATE_REVERSE;

    fn record(name: &str, flags: u16, mapq: u8) -> AlignmentRecord<'_> {
        AlignmentRecord {
            name,
            flags: Flags::from_bits(flags),
            mapping_quality: mapq,
            reference_id: Some(0),
            reference_name: Some("chr1"),
            mate_reference_id: Some(0),
            position: Some(1000),
            mate_position: Some(1150),
            alignment_end: Some(1050),
            template_length: 200,
        }
    }

    fn metrics() -> ReadGroupMetrics {
        let genome = Arc::new(ReferenceGenome::new("human", "chrM"));
        ReadGroupMetrics::new("rg1", ReferenceCache::new(genome))
    }

    #[rstest]
    #[case(1, 2, " (50.000%)")]
    #[case(2, 1, " (200.000%)")]
    #[case(1, 0, " (NaN%)")]
    fn test_share(#[case] numerator: u64, #[case] denominator: u64, #[case] expected: &str) {
        assert_eq!(share(numerator, denominator), expected);
    }

    #[rstest]
    fn test_share_of() {
        assert_eq!(share_of(1, 3, 5, " of all reads"), " (33.33333% of all reads)");
    }

    #[rstest]
    fn test_configuration() {
        let experiment = Experiment {
            organism: "human".to_string(),
            description: "liver".to_string(),
            url: "https://example.org".to_string(),
        };
        let genome = ReferenceGenome::new("human", "chrM");
        let text = Configuration {
            experiment: &experiment,
            genome: &genome,
        }
        .to_string();

        assert!(text.starts_with("Experiment information\n======================\nOrganism: human\n"));
        assert!(text.contains("Mitochondrial reference: chrM\n"));
        assert!(text.contains("  1, 2, 3, 4,"));
        for line in text.lines() {
            assert!(line.len() <= WRAP_WIDTH, "{}", line);
        }
    }

    #[rstest]
    fn test_report_text() {
        let mut metrics = metrics();
        metrics.classify(&record("proper", PROPER, 60));
        metrics.classify(&record("dup", PROPER | Flags::DUPLICATE, 60));
        metrics.classify(&record("unpaired", 0, 60));
        metrics.classify(&record("qcfail", Flags::QC_FAIL, 60));
        metrics.finalize().unwrap();

        let text = metrics.report(&Experiment::default()).to_string();

        assert!(text.starts_with("Read Group\n==========\nID: rg1\nLibrary: \n"));
        assert!(text.contains("  Total reads: 4\n"));
        assert!(text.contains("  Total problems: 2 (50.000%)\n"));
        assert!(text.contains("  Duplicate reads: 1 (25.000% of all reads)\n"));
        assert!(text.contains("  FR reads: "));
        assert!(text.contains("2 (50.000000%)"));
        assert!(text.contains("  Duplicate autosomal reads: 1 (50.000% of all autosomal reads)\n"));
        assert!(text.contains("  Duplicate mitochondrial reads: 0 (NaN% of all mitochondrial reads)\n"));
        assert!(text.contains("                  30: 4 (100.000%)\n"));
        assert!(!text.contains("Peak Metrics"));
        assert!(!text.contains("slipped through"));
    }

    #[rstest]
    fn test_report_text_with_peaks() {
        let mut index = PeakIndex::new(ScanStrategy::UpperBound);
        index.add(Peak::new("chr1", 1020, 1100, "hit").unwrap()).unwrap();
        let mut metrics = metrics().with_peaks(index);
        metrics.classify(&record("proper", PROPER, 60));
        metrics.finalize().unwrap();

        let text = metrics.report(&Experiment::default()).to_string();

        assert!(text.contains("  Peak count: 1\n"));
        assert!(text.contains(
            "  High quality autosomal alignments that overlapped peaks: 1 (100.000% of all high quality autosomal alignments)\n"
        ));
        assert!(text.contains("          Top peak: 1 (100.000%"));
    }

    #[rstest]
    fn test_report_text_flags_unaccounted_reads() {
        let mut metrics = metrics();
        metrics.classify(&record("proper", PROPER, 60));
        metrics.finalize().unwrap();

        let mut report = metrics.report(&Experiment::default());
        report.counts.total_reads += 1;
        let text = report.to_string();

        assert!(text.contains("  Some reads slipped through our taxonomy: 1 (50.000%)\n"));
    }
}
