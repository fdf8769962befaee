use serde::Serialize;

/// Sequencing library provenance, taken from a read group's header record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Library {
    /// LB
    pub library: String,
    /// SM
    pub sample: String,
    /// DS, unless a library description was given on the command line
    pub description: String,
    /// CN
    #[serde(rename = "sequencingcenter")]
    pub center: String,
    /// DT
    #[serde(rename = "sequencingdate")]
    pub date: String,
    /// PL
    #[serde(rename = "sequencingplatform")]
    pub platform: String,
    /// PM
    #[serde(rename = "platformmodel")]
    pub platform_model: String,
    /// PU
    #[serde(rename = "platformunit")]
    pub platform_unit: String,
    /// FO
    #[serde(rename = "floworder")]
    pub flow_order: String,
    /// KS
    #[serde(rename = "keysequence")]
    pub key_sequence: String,
    /// PI
    pub predicted_median_insert_size: String,
    /// PG
    pub programs: String,
}

/// Experiment-wide details repeated in every read group's report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Experiment {
    pub organism: String,
    pub description: String,
    pub url: String,
}

///
/// Every counter kept for a read group. Field names double as the keys of
/// the JSON report.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadCounts {
    pub total_reads: u64,
    pub hqaa: u64,

    // flag tallies, independent of the classification
    pub forward_reads: u64,
    pub reverse_reads: u64,
    pub secondary_reads: u64,
    pub supplementary_reads: u64,
    pub duplicate_reads: u64,
    pub paired_reads: u64,
    pub first_reads: u64,
    pub second_reads: u64,
    pub forward_mate_reads: u64,
    pub reverse_mate_reads: u64,

    // classification leaves
    #[serde(rename = "qcfailed_reads")]
    pub qc_failed_reads: u64,
    pub unpaired_reads: u64,
    pub unmapped_reads: u64,
    pub unmapped_mate_reads: u64,
    pub rf_reads: u64,
    pub ff_reads: u64,
    pub rr_reads: u64,
    pub reads_mapped_with_zero_quality: u64,
    pub properly_paired_and_mapped_reads: u64,
    pub reads_with_mate_mapped_to_different_reference: u64,
    pub reads_with_mate_too_distant: u64,
    pub reads_mapped_and_paired_but_improperly: u64,
    pub unclassified_reads: u64,

    pub paired_and_mapped_reads: u64,
    pub fr_reads: u64,
    pub maximum_proper_pair_fragment_size: u64,

    pub total_autosomal_reads: u64,
    pub total_mitochondrial_reads: u64,
    pub duplicate_autosomal_reads: u64,
    pub duplicate_mitochondrial_reads: u64,

    /// hqaa with fragment lengths of 50 to 100
    #[serde(rename = "hqaa_tf_count")]
    pub hqaa_short_count: u64,
    /// hqaa with fragment lengths of 150 to 200
    pub hqaa_mononucleosomal_count: u64,
}

impl ReadCounts {
    /// Reads in every problem category, including the deferred ones.
    pub fn total_problems(&self) -> u64 {
        self.unmapped_reads
            + self.unmapped_mate_reads
            + self.qc_failed_reads
            + self.unpaired_reads
            + self.reads_with_mate_mapped_to_different_reference
            + self.reads_mapped_with_zero_quality
            + self.reads_with_mate_too_distant
            + self.rf_reads
            + self.ff_reads
            + self.rr_reads
            + self.reads_mapped_and_paired_but_improperly
    }

    ///
    /// Sum of every terminal classification. Once deferred reads have been
    /// resolved this equals `total_reads`.
    ///
    pub fn classified_reads(&self) -> u64 {
        self.total_problems() + self.properly_paired_and_mapped_reads + self.unclassified_reads
    }
}

/// The terminal category an alignment was assigned while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    QcFailed,
    Unpaired,
    Unmapped,
    UnmappedMate,
    Rf,
    Ff,
    Rr,
    ZeroQuality,
    ProperlyPaired,
    DifferentReference,
    /// Paired and mapped but not properly; resolved when the read group is
    /// finalized.
    Deferred,
    Unclassified,
}
