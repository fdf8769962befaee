use std::fmt::{self, Display};

use crate::models::feature::Feature;

/// SAM flag bits of one alignment record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(u16);

impl Flags {
    pub const PAIRED: u16 = 0x1;
    pub const PROPERLY_PAIRED: u16 = 0x2;
    pub const UNMAPPED: u16 = 0x4;
    pub const MATE_UNMAPPED: u16 = 0x8;
    pub const REVERSE: u16 = 0x10;
    pub const MATE_REVERSE: u16 = 0x20;
    pub const READ1: u16 = 0x40;
    pub const READ2: u16 = 0x80;
    pub const SECONDARY: u16 = 0x100;
    pub const QC_FAIL: u16 = 0x200;
    pub const DUPLICATE: u16 = 0x400;
    pub const SUPPLEMENTARY: u16 = 0x800;

    pub const fn from_bits(bits: u16) -> Self {
        Flags(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    #[inline]
    const fn has(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub const fn is_paired(&self) -> bool {
        self.has(Self::PAIRED)
    }

    pub const fn is_properly_paired(&self) -> bool {
        self.has(Self::PROPERLY_PAIRED)
    }

    pub const fn is_unmapped(&self) -> bool {
        self.has(Self::UNMAPPED)
    }

    pub const fn is_mate_unmapped(&self) -> bool {
        self.has(Self::MATE_UNMAPPED)
    }

    pub const fn is_reverse(&self) -> bool {
        self.has(Self::REVERSE)
    }

    pub const fn is_mate_reverse(&self) -> bool {
        self.has(Self::MATE_REVERSE)
    }

    pub const fn is_read1(&self) -> bool {
        self.has(Self::READ1)
    }

    pub const fn is_read2(&self) -> bool {
        self.has(Self::READ2)
    }

    pub const fn is_secondary(&self) -> bool {
        self.has(Self::SECONDARY)
    }

    pub const fn is_qc_fail(&self) -> bool {
        self.has(Self::QC_FAIL)
    }

    pub const fn is_duplicate(&self) -> bool {
        self.has(Self::DUPLICATE)
    }

    pub const fn is_supplementary(&self) -> bool {
        self.has(Self::SUPPLEMENTARY)
    }

    /// Paired, with both the read and its mate mapped.
    pub const fn is_paired_and_mapped(&self) -> bool {
        self.is_paired() && !self.is_unmapped() && !self.is_mate_unmapped()
    }

    /// Neither secondary nor supplementary.
    pub const fn is_original(&self) -> bool {
        !self.is_secondary() && !self.is_supplementary()
    }
}

impl From<u16> for Flags {
    fn from(bits: u16) -> Self {
        Flags(bits)
    }
}

///
/// A borrowed view of one alignment record, with its reference already
/// resolved to a name by whatever is reading the alignment file.
///
/// Positions are 0-based; `None` stands for an unavailable position.
///
#[derive(Debug, Clone, Default)]
pub struct AlignmentRecord<'a> {
    pub name: &'a str,
    pub flags: Flags,
    pub mapping_quality: u8,
    pub reference_id: Option<usize>,
    pub reference_name: Option<&'a str>,
    pub mate_reference_id: Option<usize>,
    pub position: Option<u64>,
    pub mate_position: Option<u64>,
    /// Exclusive end of the aligned span on the reference.
    pub alignment_end: Option<u64>,
    pub template_length: i32,
}

impl AlignmentRecord<'_> {
    /// Absolute template length, the fragment size used in every histogram.
    pub fn fragment_length(&self) -> u64 {
        self.template_length.unsigned_abs() as u64
    }

    fn same_reference_and_placed(&self) -> bool {
        !self.flags.is_unmapped()
            && !self.flags.is_mate_unmapped()
            && self.reference_id == self.mate_reference_id
            && self.position != Some(0)
            && self.mate_position != Some(0)
    }

    ///
    /// The end mapped to the smaller coordinate is on the forward strand and
    /// the other end on the reverse strand.
    ///
    pub fn is_fr(&self) -> bool {
        let flags = self.flags;
        self.same_reference_and_placed()
            && ((!flags.is_reverse() && flags.is_mate_reverse() && self.template_length > 0)
                || (flags.is_reverse() && !flags.is_mate_reverse() && self.template_length < 0))
    }

    pub fn is_rf(&self) -> bool {
        let flags = self.flags;
        self.same_reference_and_placed()
            && self.template_length != 0
            && ((flags.is_reverse() && !flags.is_mate_reverse() && self.template_length > 0)
                || (!flags.is_reverse() && flags.is_mate_reverse() && self.template_length < 0))
    }

    pub fn is_ff(&self) -> bool {
        !self.flags.is_reverse() && !self.flags.is_mate_reverse()
    }

    pub fn is_rr(&self) -> bool {
        self.flags.is_reverse() && self.flags.is_mate_reverse()
    }

    /// The reference footprint of the alignment, if it is placed on a named reference.
    pub fn feature(&self) -> Option<Feature> {
        let reference = self.reference_name?;
        let start = self.position?;
        let end = self.alignment_end.unwrap_or(start).max(start);
        Some(Feature {
            reference: reference.to_string(),
            start,
            end,
        })
    }
}

impl Display for AlignmentRecord<'_> {
    /// A SAM-like summary used in problem logs: name, flag, reference,
    /// 1-based position, mapq, mate reference id, 1-based mate position and
    /// template length.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let one_based = |p: Option<u64>| p.map_or(0, |p| p + 1);
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.name,
            self.flags.bits(),
            self.reference_name.unwrap_or("*"),
            one_based(self.position),
            self.mapping_quality,
            self.mate_reference_id
                .map_or_else(|| "*".to_string(), |id| id.to_string()),
            one_based(self.mate_position),
            self.template_length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn pair() -> AlignmentRecord<'static> {
        AlignmentRecord {
            name: "read",
            flags: Flags::from_bits(Flags::PAIRED | Flags::PROPERLY_PAIRED | Flags::MATE_REVERSE),
            mapping_quality: 60,
            reference_id: Some(0),
            reference_name: Some("chr1"),
            mate_reference_id: Some(0),
            position: Some(1000),
            mate_position: Some(1150),
            alignment_end: Some(1050),
            template_length: 200,
        }
    }

    #[rstest]
    fn test_flags() {
        let flags = Flags::from(0x63);
        assert!(flags.is_paired());
        assert!(flags.is_properly_paired());
        assert!(flags.is_mate_reverse());
        assert!(flags.is_read1());
        assert!(!flags.is_reverse());
        assert!(flags.is_paired_and_mapped());
        assert!(flags.is_original());
        assert!(!Flags::from(Flags::SUPPLEMENTARY).is_original());
    }

    #[rstest]
    fn test_fr_orientation(pair: AlignmentRecord<'static>) {
        assert!(pair.is_fr());
        assert!(!pair.is_rf());
        assert!(!pair.is_ff());
        assert!(!pair.is_rr());
    }

    #[rstest]
    fn test_rf_orientation(mut pair: AlignmentRecord<'static>) {
        pair.template_length = -200;
        assert!(pair.is_rf());
        assert!(!pair.is_fr());
    }

    #[rstest]
    fn test_orientation_needs_same_reference(mut pair: AlignmentRecord<'static>) {
        pair.mate_reference_id = Some(3);
        assert!(!pair.is_fr());
        pair.template_length = -200;
        assert!(!pair.is_rf());
    }

    #[rstest]
    fn test_orientation_needs_nonzero_positions(mut pair: AlignmentRecord<'static>) {
        pair.position = Some(0);
        assert!(!pair.is_fr());
    }

    #[rstest]
    fn test_feature(pair: AlignmentRecord<'static>) {
        assert_eq!(pair.feature(), Some(Feature::new("chr1", 1000, 1050).unwrap()));
        assert_eq!(pair.fragment_length(), 200);
    }

    #[rstest]
    fn test_summary(pair: AlignmentRecord<'static>) {
        assert_eq!(pair.to_string(), "read\t35\tchr1\t1001\t60\t0\t1151\t200");
    }
}
