//! Aggregate statistics over the histograms kept for each read group.

use std::collections::BTreeMap;

use ataqc_core::utils::fraction;

/// Mapping quality thresholds reported as "reads with MAPQ >= T".
pub const MAPQ_THRESHOLDS: [u8; 6] = [5, 10, 15, 20, 25, 30];

/// Fragment length tables always cover at least this many lengths.
pub const MINIMUM_FRAGMENT_TABLE_LENGTH: u64 = 1000;

///
/// Mean mapping quality. NaN when no reads were counted.
///
pub fn mean_mapq(mapq_counts: &BTreeMap<u8, u64>) -> f64 {
    let reads: u64 = mapq_counts.values().sum();
    let total_mapq: u64 = mapq_counts
        .iter()
        .map(|(mapq, count)| *mapq as u64 * count)
        .sum();
    fraction(total_mapq, reads)
}

///
/// Median mapping quality. With an even number of reads this is the mean of
/// the two middle values. NaN when no reads were counted.
///
pub fn median_mapq(mapq_counts: &BTreeMap<u8, u64>) -> f64 {
    let reads: u64 = mapq_counts.values().sum();
    if reads == 0 {
        return f64::NAN;
    }

    let (lower, upper) = if reads % 2 == 0 {
        (reads / 2 - 1, reads / 2)
    } else {
        (reads / 2, reads / 2)
    };

    match (nth_mapq(mapq_counts, lower), nth_mapq(mapq_counts, upper)) {
        (Some(lower), Some(upper)) => (lower as f64 + upper as f64) / 2.0,
        _ => f64::NAN,
    }
}

/// The mapping quality of the `index`th read (0-based) in sorted order.
fn nth_mapq(mapq_counts: &BTreeMap<u8, u64>, index: u64) -> Option<u8> {
    let mut seen = 0;
    for (mapq, count) in mapq_counts {
        seen += count;
        if index < seen {
            return Some(*mapq);
        }
    }
    None
}

pub fn reads_with_mapq_at_least(mapq_counts: &BTreeMap<u8, u64>, threshold: u8) -> u64 {
    mapq_counts.range(threshold..).map(|(_, count)| count).sum()
}

///
/// Expand a fragment length histogram into a dense table of
/// `(fragment length, count, count / denominator)`, from 0 up to the longer of
/// [MINIMUM_FRAGMENT_TABLE_LENGTH] and the longest observed fragment.
///
pub fn fragment_length_table(
    fragment_length_counts: &BTreeMap<u64, u64>,
    denominator: u64,
) -> Vec<(u64, u64, f64)> {
    let longest = fragment_length_counts
        .keys()
        .next_back()
        .map_or(0, |length| length + 1);
    let bound = longest.max(MINIMUM_FRAGMENT_TABLE_LENGTH);

    (0..bound)
        .map(|length| {
            let count = fragment_length_counts.get(&length).copied().unwrap_or(0);
            (length, count, fraction(count, denominator))
        })
        .collect()
}
