use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;

use ataqc_metrics::{Configuration, ReadGroupReport};

use crate::consts::VERSION;

/// One entry of the metrics file.
#[derive(Debug, Serialize)]
pub struct MetricsEntry<'a> {
    pub ataqc_version: &'static str,
    pub timestamp: String,
    pub metrics: &'a ReadGroupReport,
}

pub fn metrics_entries(reports: &[ReadGroupReport]) -> Vec<MetricsEntry<'_>> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    reports
        .iter()
        .map(|metrics| MetricsEntry {
            ataqc_version: VERSION,
            timestamp: timestamp.clone(),
            metrics,
        })
        .collect()
}

///
/// Write the reports as a pretty printed JSON array, gzipped when the path
/// ends in `.gz`.
///
pub fn write_metrics(path: &Path, reports: &[ReadGroupReport]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create metrics file: {}", path.display()))?;

    let entries = metrics_entries(reports);
    let writer = BufWriter::new(file);
    let result = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_entries(&mut encoder, &entries)
            .and_then(|_| Ok(encoder.finish()?.flush()?))
    } else {
        write_entries(writer, &entries)
    };

    result.with_context(|| format!("Failed to write metrics file: {}", path.display()))
}

///
/// Print the configuration and every read group report as plain text.
///
pub fn write_summary<W: Write>(
    writer: &mut W,
    configuration: &Configuration,
    reports: &[ReadGroupReport],
) -> Result<()> {
    writeln!(writer, "ataqc {}\n", VERSION)?;
    write!(writer, "{}", configuration)?;
    for report in reports {
        write!(writer, "{}", report)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_entries<W: Write>(mut writer: W, entries: &[MetricsEntry]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;
    use std::sync::Arc;

    use ataqc_core::reference::{ReferenceCache, ReferenceGenome};
    use ataqc_metrics::{Experiment, ReadGroupMetrics};
    use flate2::read::MultiGzDecoder;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    #[fixture]
    fn reports() -> Vec<ReadGroupReport> {
        let genome = Arc::new(ReferenceGenome::new("human", "chrM"));
        let mut metrics = ReadGroupMetrics::new("sample", ReferenceCache::new(genome));
        metrics.finalize().unwrap();

        let experiment = Experiment {
            organism: "human".to_string(),
            ..Default::default()
        };
        vec![metrics.report(&experiment)]
    }

    #[rstest]
    #[case("sample.ataqc.json")]
    #[case("sample.ataqc.json.gz")]
    fn test_write_metrics(reports: Vec<ReadGroupReport>, #[case] file_name: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(file_name);

        write_metrics(&path, &reports).unwrap();

        let mut contents = String::new();
        let file = File::open(&path).unwrap();
        if file_name.ends_with(".gz") {
            MultiGzDecoder::new(file).read_to_string(&mut contents).unwrap();
        } else {
            let mut file = file;
            file.read_to_string(&mut contents).unwrap();
        }

        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["ataqc_version"], VERSION);
        assert_eq!(entries[0]["metrics"]["name"], "sample");
        assert_eq!(entries[0]["metrics"]["organism"], "human");
        assert_eq!(entries[0]["metrics"]["median_mapq"], "NaN");
        assert!(entries[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[rstest]
    fn test_write_summary(reports: Vec<ReadGroupReport>) {
        let experiment = Experiment {
            organism: "human".to_string(),
            ..Default::default()
        };
        let genome = ReferenceGenome::new("human", "chrM");
        let configuration = Configuration {
            experiment: &experiment,
            genome: &genome,
        };

        let mut out = Vec::new();
        write_summary(&mut out, &configuration, &reports).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(&format!("ataqc {}\n\nExperiment information\n", VERSION)));
        assert!(text.contains("Read Group\n==========\nID: sample\n"));
        assert!(text.contains("  Total reads: 0\n"));
        assert!(!text.contains("Peak Metrics"));
    }

    #[rstest]
    fn test_unwritable_path(reports: Vec<ReadGroupReport>) {
        let path = Path::new("does/not/exist/sample.ataqc.json");
        assert!(write_metrics(path, &reports).is_err());
    }
}
