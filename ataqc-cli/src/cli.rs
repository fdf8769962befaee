use clap::{ArgAction, Command, arg};

use ataqc_core::reference::DEFAULT_MITOCHONDRIAL_REFERENCE;

pub const ATAQC_CMD: &str = "ataqc";

/// The `--peak-file` value that loads `<read group>.peaks` for every read group.
pub const AUTO_PEAK_FILE: &str = "auto";
pub const METRICS_FILE_SUFFIX: &str = ".ataqc.json";

pub fn create_ataqc_cli() -> Command {
    Command::new(ATAQC_CMD)
        .arg_required_else_help(true)
        .arg(arg!(<organism> "Organism of the experiment (human, mouse or rat select built-in autosomes)"))
        .arg(arg!(<alignment> "Coordinate or name sorted BAM file of paired-end alignments"))
        .arg(arg!(--name <NAME> "Read group name used when the alignment header declares none"))
        .arg(arg!(--description <TEXT> "Description of the experiment").default_value(""))
        .arg(arg!(--url <URL> "URL of the experiment").default_value(""))
        .arg(arg!(--"library-description" <TEXT> "Replaces the DS field of every read group"))
        .arg(arg!(--"autosomal-reference-file" <PATH> "File of autosomal reference names, replacing the organism defaults"))
        .arg(
            arg!(--"mitochondrial-reference-name" <NAME> "Name of the mitochondrial reference")
                .default_value(DEFAULT_MITOCHONDRIAL_REFERENCE),
        )
        .arg(arg!(--"peak-file" <PATH> "BED file of peaks, or 'auto' to read <read group>.peaks"))
        .arg(
            arg!(--"excluded-region-file" <PATH> "BED file of regions whose peaks are ignored")
                .action(ArgAction::Append),
        )
        .arg(
            arg!(--"peak-scan" <STRATEGY> "How far back to scan for overlapping peaks")
                .value_parser(["upper-bound", "exact"])
                .default_value("upper-bound"),
        )
        .arg(arg!(--"metrics-file" <PATH> "Output JSON file, gzipped if it ends in .gz [default: <name>.ataqc.json]"))
        .arg(arg!(--"log-problematic-reads" "Write problematic reads to <read group>.problems"))
        .arg(arg!(-v --verbose "Show progress and debug logging"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_defaults() {
        let matches = create_ataqc_cli()
            .try_get_matches_from(["ataqc", "human", "sample.bam"])
            .unwrap();

        assert_eq!(matches.get_one::<String>("organism").unwrap(), "human");
        assert_eq!(matches.get_one::<String>("alignment").unwrap(), "sample.bam");
        assert_eq!(
            matches
                .get_one::<String>("mitochondrial-reference-name")
                .unwrap(),
            "chrM"
        );
        assert_eq!(matches.get_one::<String>("peak-scan").unwrap(), "upper-bound");
        assert_eq!(matches.get_one::<String>("peak-file"), None);
        assert!(!matches.get_flag("log-problematic-reads"));
        assert!(!matches.get_flag("verbose"));
    }

    #[rstest]
    fn test_repeated_excluded_regions() {
        let matches = create_ataqc_cli()
            .try_get_matches_from([
                "ataqc",
                "mouse",
                "sample.bam",
                "--excluded-region-file",
                "blacklist.bed",
                "--excluded-region-file",
                "repeats.bed.gz",
                "--peak-file",
                AUTO_PEAK_FILE,
                "--peak-scan",
                "exact",
            ])
            .unwrap();

        let excluded: Vec<&String> = matches
            .get_many::<String>("excluded-region-file")
            .unwrap()
            .collect();
        assert_eq!(excluded, vec!["blacklist.bed", "repeats.bed.gz"]);
        assert_eq!(matches.get_one::<String>("peak-file").unwrap(), "auto");
        assert_eq!(matches.get_one::<String>("peak-scan").unwrap(), "exact");
    }

    #[rstest]
    #[case(&["ataqc", "human"])]
    #[case(&["ataqc", "human", "sample.bam", "--peak-scan", "fuzzy"])]
    fn test_rejected_arguments(#[case] args: &[&str]) {
        assert!(create_ataqc_cli().try_get_matches_from(args).is_err());
    }
}
