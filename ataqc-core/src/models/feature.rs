use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::AtaqcError;

///
/// Feature struct, a genomic interval on one reference sequence.
///
/// Coordinates are half-open: `start` is inclusive and `end` exclusive, the
/// same convention BED files use. Alignment footprints use the 0-based start
/// of the alignment and the end of its aligned span.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Feature {
    pub reference: String,
    pub start: u64,
    pub end: u64,
}

impl Feature {
    pub fn new(reference: impl Into<String>, start: u64, end: u64) -> Result<Self, AtaqcError> {
        let reference = reference.into();
        if end < start {
            return Err(AtaqcError::InvalidFeature(format!(
                "{}:{}-{} ends before it starts",
                reference, start, end
            )));
        }
        Ok(Feature {
            reference,
            start,
            end,
        })
    }

    ///
    /// Get the number of bases covered by the feature
    ///
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Check if two features overlap. Features on different references never do.
    #[inline]
    pub fn overlaps(&self, other: &Feature) -> bool {
        self.reference == other.reference && self.overlaps_range(other.start, other.end)
    }

    /// Check if the feature overlaps `start..end` on its own reference.
    #[inline]
    pub fn overlaps_range(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.reference, self.start, self.end)
    }
}

impl FromStr for Feature {
    type Err = AtaqcError;

    /// Parse the first three whitespace-delimited columns of a BED-like line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();

        let reference = fields
            .next()
            .ok_or_else(|| AtaqcError::InvalidFeature("missing reference field".to_string()))?;
        let start = parse_coordinate(fields.next(), "start", s)?;
        let end = parse_coordinate(fields.next(), "end", s)?;

        Feature::new(reference, start, end)
    }
}

pub(crate) fn parse_coordinate(field: Option<&str>, which: &str, line: &str) -> Result<u64, AtaqcError> {
    let field = field.ok_or_else(|| {
        AtaqcError::InvalidFeature(format!("missing {} field in \"{}\"", which, line))
    })?;
    field.parse::<u64>().map_err(|_| {
        AtaqcError::InvalidFeature(format!("{} position \"{}\" is not a valid coordinate", which, field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("chr1", 100, 200, true)]
    #[case("chr1", 150, 160, true)]
    #[case("chr1", 199, 300, true)]
    #[case("chr1", 200, 300, false)]
    #[case("chr1", 50, 100, false)]
    #[case("chr2", 100, 200, false)]
    fn test_overlaps(#[case] reference: &str, #[case] start: u64, #[case] end: u64, #[case] expected: bool) {
        let feature = Feature::new("chr1", 100, 200).unwrap();
        let other = Feature::new(reference, start, end).unwrap();
        assert_eq!(feature.overlaps(&other), expected);
        assert_eq!(other.overlaps(&feature), expected);
    }

    #[rstest]
    fn test_parse_feature() {
        let feature: Feature = "chr3\t10\t25\tignored".parse().unwrap();
        assert_eq!(feature, Feature::new("chr3", 10, 25).unwrap());
        assert_eq!(feature.size(), 15);
        assert_eq!(feature.to_string(), "chr3\t10\t25");
    }

    #[rstest]
    fn test_parse_feature_with_spaces() {
        let feature: Feature = "chr3 10   25".parse().unwrap();
        assert_eq!(feature.end, 25);
    }

    #[rstest]
    #[case("chr1\tten\t20")]
    #[case("chr1\t10")]
    #[case("chr1\t30\t20")]
    fn test_parse_invalid_feature(#[case] line: &str) {
        assert!(line.parse::<Feature>().is_err());
    }
}
