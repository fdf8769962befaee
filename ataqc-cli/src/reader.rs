use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use noodles::bam;
use noodles::bgzf;
use noodles::sam;
use noodles::sam::alignment::Record as SamRecord;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use noodles::sam::header::record::value::map::read_group::tag;

use ataqc_core::models::{AlignmentRecord, Flags};
use ataqc_metrics::Library;

/// Mapping quality reported when a record has none.
const MISSING_MAPPING_QUALITY: u8 = 255;

pub struct BamReader {
    reader: bam::io::Reader<bgzf::Reader<File>>,
    header: sam::Header,
}

impl BamReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open BAM file: {}", path.display()))?;
        let mut reader = bam::io::reader::Builder::default().build_from_reader(file);

        let header = reader
            .read_header()
            .with_context(|| format!("Failed to read BAM header: {}", path.display()))?;

        Ok(BamReader { reader, header })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    ///
    /// Every read group declared in the header, with its library fields, in
    /// header order.
    ///
    pub fn read_groups(&self) -> Vec<(String, Library)> {
        self.header
            .read_groups()
            .iter()
            .map(|(id, map)| {
                let fields = map.other_fields();
                let library = Library {
                    library: lossy(fields.get(&tag::LIBRARY)),
                    sample: lossy(fields.get(&tag::SAMPLE)),
                    description: lossy(fields.get(&tag::DESCRIPTION)),
                    center: lossy(fields.get(&tag::SEQUENCING_CENTER)),
                    date: lossy(fields.get(&tag::PRODUCED_AT)),
                    platform: lossy(fields.get(&tag::PLATFORM)),
                    platform_model: lossy(fields.get(&tag::PLATFORM_MODEL)),
                    platform_unit: lossy(fields.get(&tag::PLATFORM_UNIT)),
                    flow_order: lossy(fields.get(&tag::FLOW_ORDER)),
                    key_sequence: lossy(fields.get(&tag::KEY_SEQUENCE)),
                    predicted_median_insert_size: lossy(
                        fields.get(&tag::PREDICTED_MEDIAN_INSERT_SIZE),
                    ),
                    programs: lossy(fields.get(&tag::PROGRAM)),
                };

                (lossy(Some(id)), library)
            })
            .collect()
    }

    ///
    /// Stream every record through `f` along with its read group tag, if any.
    ///
    /// Returns the number of records read.
    ///
    pub fn for_each_alignment<F>(&mut self, mut f: F) -> Result<u64>
    where
        F: FnMut(Option<&str>, &AlignmentRecord) -> Result<()>,
    {
        let mut record = bam::Record::default();
        let mut read_group = String::new();
        let mut count = 0;

        loop {
            let bytes = self
                .reader
                .read_record(&mut record)
                .with_context(|| format!("Failed to read BAM record {}", count + 1))?;
            if bytes == 0 {
                break;
            }
            count += 1;

            let alignment = to_alignment_record(&record, &self.header)
                .with_context(|| format!("Malformed BAM record {}", count))?;
            let tagged = read_group_tag(&record, &mut read_group)?;

            f(tagged.then_some(read_group.as_str()), &alignment)?;
        }

        Ok(count)
    }
}

fn lossy<T: AsRef<[u8]>>(value: Option<T>) -> String {
    value
        .map(|value| String::from_utf8_lossy(value.as_ref()).into_owned())
        .unwrap_or_default()
}

///
/// Copy the `RG` tag of a record into `buffer`. Returns `false` when the
/// record has none.
///
fn read_group_tag(record: &bam::Record, buffer: &mut String) -> Result<bool> {
    let data = record.data();
    match data.get(&Tag::READ_GROUP) {
        Some(Ok(Value::String(value))) => {
            buffer.clear();
            buffer.push_str(std::str::from_utf8(value.as_ref())?);
            Ok(true)
        }
        Some(Ok(_)) => anyhow::bail!("RG tag is not a string"),
        Some(Err(err)) => Err(err).context("Failed to decode RG tag"),
        None => Ok(false),
    }
}

///
/// View a BAM record as an [`AlignmentRecord`]. Positions become 0-based and
/// the alignment end exclusive.
///
pub fn to_alignment_record<'a>(
    record: &'a bam::Record,
    header: &'a sam::Header,
) -> Result<AlignmentRecord<'a>> {
    let name = match record.name() {
        Some(name) => std::str::from_utf8(name.as_ref())?,
        None => "*",
    };

    let reference_id = record.reference_sequence_id().transpose()?;
    let reference_name = match reference_id {
        Some(id) => header
            .reference_sequences()
            .get_index(id)
            .map(|(name, _)| std::str::from_utf8(name.as_ref()))
            .transpose()?,
        None => None,
    };

    let position = record
        .alignment_start()
        .transpose()?
        .map(|p| (usize::from(p) - 1) as u64);
    let mate_position = record
        .mate_alignment_start()
        .transpose()?
        .map(|p| (usize::from(p) - 1) as u64);
    // a 1-based inclusive end is the 0-based exclusive end
    let alignment_end = SamRecord::alignment_end(record)
        .transpose()?
        .map(|p| usize::from(p) as u64);

    Ok(AlignmentRecord {
        name,
        flags: Flags::from_bits(u16::from(record.flags())),
        mapping_quality: record
            .mapping_quality()
            .map(u8::from)
            .unwrap_or(MISSING_MAPPING_QUALITY),
        reference_id,
        reference_name,
        mate_reference_id: record.mate_reference_sequence_id().transpose()?,
        position,
        mate_position,
        alignment_end,
        template_length: record.template_length(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::num::NonZeroUsize;

    use noodles::core::Position;
    use noodles::sam::alignment::io::Write;
    use noodles::sam::alignment::record::cigar::Op;
    use noodles::sam::alignment::record::cigar::op::Kind;
    use noodles::sam::alignment::record::{Flags as SamFlags, MappingQuality};
    use noodles::sam::alignment::record_buf::RecordBuf;
    use noodles::sam::alignment::record_buf::data::field::Value as ValueBuf;
    use noodles::sam::header::record::value::Map;
    use noodles::sam::header::record::value::map::{ReadGroup, ReferenceSequence};
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::NamedTempFile;

    fn header() -> sam::Header {
        let mut rg1 = Map::<ReadGroup>::default();
        rg1.other_fields_mut().insert(tag::LIBRARY, "lib1".into());
        rg1.other_fields_mut().insert(tag::SAMPLE, "sample1".into());

        sam::Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::try_from(100_000).unwrap()),
            )
            .add_reference_sequence(
                "chr2",
                Map::<ReferenceSequence>::new(NonZeroUsize::try_from(100_000).unwrap()),
            )
            .add_read_group("rg1", rg1)
            .add_read_group("rg2", Map::<ReadGroup>::default())
            .build()
    }

    fn record(name: &str, read_group: Option<&str>) -> RecordBuf {
        let mut record = RecordBuf::default();
        record.name_mut().replace(name.into());
        *record.flags_mut() = SamFlags::SEGMENTED
            | SamFlags::PROPERLY_SEGMENTED
            | SamFlags::MATE_REVERSE_COMPLEMENTED
            | SamFlags::FIRST_SEGMENT;
        *record.reference_sequence_id_mut() = Some(1);
        *record.alignment_start_mut() = Position::new(1001);
        *record.mapping_quality_mut() = MappingQuality::new(42);
        record.cigar_mut().as_mut().push(Op::new(Kind::Match, 50));
        *record.mate_reference_sequence_id_mut() = Some(1);
        *record.mate_alignment_start_mut() = Position::new(1151);
        *record.template_length_mut() = 200;
        if let Some(read_group) = read_group {
            record
                .data_mut()
                .insert(Tag::READ_GROUP, ValueBuf::from(read_group));
        }
        record
    }

    #[fixture]
    fn bam_file() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let header = header();

        let mut writer = bam::io::Writer::new(File::create(file.path()).unwrap());
        writer.write_header(&header).unwrap();
        for record in [
            record("read1", Some("rg1")),
            record("read2", None),
            record("read3", Some("rg2")),
        ] {
            writer.write_alignment_record(&header, &record).unwrap();
        }
        writer.try_finish().unwrap();

        file
    }

    #[rstest]
    fn test_read_groups(bam_file: NamedTempFile) {
        let reader = BamReader::open(bam_file.path()).unwrap();
        let read_groups = reader.read_groups();

        let ids: Vec<&str> = read_groups.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["rg1", "rg2"]);
        assert_eq!(read_groups[0].1.library, "lib1");
        assert_eq!(read_groups[0].1.sample, "sample1");
        assert_eq!(read_groups[1].1, Library::default());
    }

    #[rstest]
    fn test_stream_records(bam_file: NamedTempFile) {
        let mut reader = BamReader::open(bam_file.path()).unwrap();

        let mut seen = Vec::new();
        let count = reader
            .for_each_alignment(|read_group, record| {
                seen.push((
                    read_group.map(str::to_string),
                    record.name.to_string(),
                    record.reference_name.map(str::to_string),
                    record.position,
                    record.mate_position,
                    record.alignment_end,
                ));
                assert_eq!(record.mapping_quality, 42);
                assert_eq!(record.template_length, 200);
                assert!(record.flags.is_properly_paired());
                assert!(record.is_fr());
                Ok(())
            })
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            seen[0],
            (
                Some("rg1".to_string()),
                "read1".to_string(),
                Some("chr2".to_string()),
                Some(1000),
                Some(1150),
                Some(1050)
            )
        );
        assert_eq!(seen[1].0, None);
        assert_eq!(seen[2].0.as_deref(), Some("rg2"));
    }

    #[rstest]
    fn test_missing_file() {
        assert!(BamReader::open(Path::new("does/not/exist.bam")).is_err());
    }
}
