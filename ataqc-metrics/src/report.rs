use serde::{Serialize, Serializer};

use crate::models::{Library, ReadCounts};

///
/// A ratio in the report. Ratios with a zero denominator are NaN, which JSON
/// cannot represent, so non-finite values are written as the string `"NaN"`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio(pub f64);

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str("NaN")
        }
    }
}

impl From<f64> for Ratio {
    fn from(value: f64) -> Self {
        Ratio(value)
    }
}

/// `(fragment length, read count, fraction)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FragmentLengthCount(pub u64, pub u64, pub Ratio);

/// `(name, overlapping hqaa, territory)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeakSummary(pub String, pub u64, pub u64);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakPercentiles {
    pub cumulative_fraction_of_hqaa: Vec<Ratio>,
    pub cumulative_fraction_of_territory: Vec<Ratio>,
}

///
/// Everything measured for one read group, laid out for JSON output.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadGroupReport {
    pub name: String,
    pub organism: String,
    pub description: String,
    pub url: String,
    pub library: Library,

    #[serde(flatten)]
    pub counts: ReadCounts,
    pub total_problems: u64,
    pub short_mononucleosomal_ratio: Ratio,
    pub hqaa_percent_of_autosomal_reads: Ratio,

    pub fragment_length_counts_fields: [&'static str; 3],
    pub fragment_length_counts: Vec<FragmentLengthCount>,
    pub hqaa_fragment_length_counts_fields: [&'static str; 3],
    pub hqaa_fragment_length_counts: Vec<FragmentLengthCount>,

    pub mapq_counts_fields: [&'static str; 2],
    pub mapq_counts: Vec<(u8, u64)>,
    pub mean_mapq: Ratio,
    pub median_mapq: Ratio,
    pub mapq_threshold_fields: [&'static str; 2],
    pub reads_with_mapq_at_least: Vec<(u8, u64)>,

    /// Whether peaks were loaded for the read group at all.
    #[serde(skip)]
    pub peaks_requested: bool,
    pub peaks_fields: [&'static str; 3],
    pub peaks: Vec<PeakSummary>,
    pub peak_percentiles: PeakPercentiles,
    pub total_peaks: u64,
    pub total_peak_territory: u64,
    pub hqaa_in_peaks: u64,
    pub top_peak_hqaa_read_count: u64,
    pub top_10_peak_hqaa_read_count: u64,
    pub top_100_peak_hqaa_read_count: u64,
    pub top_1000_peak_hqaa_read_count: u64,
    pub top_10000_peak_hqaa_read_count: u64,
    pub hqaa_overlapping_peaks_percent: Ratio,
}

pub const FRAGMENT_LENGTH_COUNTS_FIELDS: [&str; 3] =
    ["fragment_length", "read_count", "fraction_of_all_reads"];
pub const HQAA_FRAGMENT_LENGTH_COUNTS_FIELDS: [&str; 3] =
    ["fragment_length", "read_count", "fraction_of_hqaa"];
pub const MAPQ_COUNTS_FIELDS: [&str; 2] = ["mapq", "read_count"];
pub const MAPQ_THRESHOLD_FIELDS: [&str; 2] = ["mapq_threshold", "read_count"];
pub const PEAKS_FIELDS: [&str; 3] = ["name", "overlapping_hqaa", "territory"];

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(Ratio(0.5), "0.5")]
    #[case(Ratio(f64::NAN), "\"NaN\"")]
    #[case(Ratio(f64::INFINITY), "\"NaN\"")]
    fn test_ratio_serialization(#[case] ratio: Ratio, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&ratio).unwrap(), expected);
    }

    #[rstest]
    fn test_table_rows_are_arrays() {
        let row = FragmentLengthCount(150, 3, Ratio(f64::NAN));
        assert_eq!(serde_json::to_string(&row).unwrap(), "[150,3,\"NaN\"]");

        let peak = PeakSummary("peak_1".to_string(), 12, 250);
        assert_eq!(serde_json::to_string(&peak).unwrap(), "[\"peak_1\",12,250]");
    }
}
