use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::AtaqcError;
use crate::models::feature::{parse_coordinate, Feature};
use crate::utils::natural_cmp;

///
/// Peak struct, a named region of interest and the number of high quality
/// autosomal alignments found overlapping it.
///
/// Equality and ordering only look at `(reference, start, end, name)`. The
/// overlap count changes while alignments are classified, so it must never
/// decide where a peak sits in a sorted collection.
///
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Peak {
    pub reference: String,
    pub start: u64,
    pub end: u64,
    pub name: String,

    pub overlapping_hqaa: u64,
}

impl Peak {
    pub fn new(
        reference: impl Into<String>,
        start: u64,
        end: u64,
        name: impl Into<String>,
    ) -> Result<Self, AtaqcError> {
        let feature = Feature::new(reference, start, end)?;
        Ok(Peak {
            reference: feature.reference,
            start: feature.start,
            end: feature.end,
            name: name.into(),
            overlapping_hqaa: 0,
        })
    }

    ///
    /// Get the territory (number of bases) covered by the peak
    ///
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn overlaps(&self, feature: &Feature) -> bool {
        self.reference == feature.reference && self.overlaps_range(feature.start, feature.end)
    }

    #[inline]
    pub fn overlaps_range(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }
}

impl PartialEq for Peak {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
            && self.start == other.start
            && self.end == other.end
            && self.name == other.name
    }
}

impl Eq for Peak {}

impl Ord for Peak {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.reference, &other.reference)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then_with(|| natural_cmp(&self.name, &other.name))
    }
}

impl PartialOrd for Peak {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Peak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.reference, self.start, self.end, self.name
        )
    }
}

impl FromStr for Peak {
    type Err = AtaqcError;

    /// Parse a `reference start end name` line. Extra columns (narrowPeak
    /// scores and the like) are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();

        let reference = fields
            .next()
            .ok_or_else(|| AtaqcError::InvalidFeature("missing reference field".to_string()))?;
        let start = parse_coordinate(fields.next(), "start", s)?;
        let end = parse_coordinate(fields.next(), "end", s)?;
        let name = fields.next().ok_or_else(|| {
            AtaqcError::InvalidFeature(format!("missing name field in \"{}\"", s))
        })?;

        Peak::new(reference, start, end, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_parse_peak() {
        let peak: Peak = "chr1\t100\t250\tpeak_1\t0\t.\t12.5".parse().unwrap();
        assert_eq!(peak.reference, "chr1");
        assert_eq!(peak.size(), 150);
        assert_eq!(peak.name, "peak_1");
        assert_eq!(peak.overlapping_hqaa, 0);
        assert_eq!(peak.to_string(), "chr1\t100\t250\tpeak_1");
    }

    #[rstest]
    fn test_parse_peak_without_name() {
        assert!("chr1\t100\t250".parse::<Peak>().is_err());
    }

    #[rstest]
    fn test_count_is_not_part_of_identity() {
        let a = Peak::new("chr1", 10, 20, "a").unwrap();
        let mut b = a.clone();
        b.overlapping_hqaa = 42;
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[rstest]
    fn test_structural_order() {
        let mut peaks = vec![
            Peak::new("chr10", 5, 10, "d").unwrap(),
            Peak::new("chr2", 50, 60, "c").unwrap(),
            Peak::new("chr2", 5, 20, "b").unwrap(),
            Peak::new("chr2", 5, 10, "a").unwrap(),
        ];
        peaks.sort();

        let names: Vec<&str> = peaks.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[rstest]
    fn test_overlaps_feature() {
        let peak = Peak::new("chr1", 100, 200, "p").unwrap();
        assert!(peak.overlaps(&Feature::new("chr1", 190, 260).unwrap()));
        assert!(!peak.overlaps(&Feature::new("chr1", 200, 260).unwrap()));
        assert!(!peak.overlaps(&Feature::new("chrX", 150, 160).unwrap()));
    }
}
