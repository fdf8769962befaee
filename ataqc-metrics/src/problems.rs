use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::Classification;

/// Why an alignment was not counted as a properly paired read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Problem {
    QcFailed,
    Unpaired,
    Unmapped,
    UnmappedMate,
    Rf,
    Ff,
    Rr,
    ZeroQuality,
    DifferentReference,
    Improper,
    Unclassified,
    MateTooDistant,
    Undiagnosed,
}

impl Problem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Problem::QcFailed => "QC failed",
            Problem::Unpaired => "Unpaired",
            Problem::Unmapped => "Unmapped",
            Problem::UnmappedMate => "Unmapped mate",
            Problem::Rf => "RF",
            Problem::Ff => "FF",
            Problem::Rr => "RR",
            Problem::ZeroQuality => "Mapped with zero quality",
            Problem::DifferentReference => "Mate mapped to different reference",
            Problem::Improper => "Improper",
            Problem::Unclassified => "Unclassified",
            Problem::MateTooDistant => "Mate too distant",
            Problem::Undiagnosed => "Undiagnosed",
        }
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<Classification> for Problem {
    type Error = Classification;

    /// Properly paired reads are not problems.
    fn try_from(classification: Classification) -> Result<Self, Self::Error> {
        match classification {
            Classification::QcFailed => Ok(Problem::QcFailed),
            Classification::Unpaired => Ok(Problem::Unpaired),
            Classification::Unmapped => Ok(Problem::Unmapped),
            Classification::UnmappedMate => Ok(Problem::UnmappedMate),
            Classification::Rf => Ok(Problem::Rf),
            Classification::Ff => Ok(Problem::Ff),
            Classification::Rr => Ok(Problem::Rr),
            Classification::ZeroQuality => Ok(Problem::ZeroQuality),
            Classification::DifferentReference => Ok(Problem::DifferentReference),
            Classification::Deferred => Ok(Problem::Improper),
            Classification::Unclassified => Ok(Problem::Unclassified),
            Classification::ProperlyPaired => Err(classification),
        }
    }
}

///
/// Receives every problematic alignment of a read group. Reporting never
/// changes how the alignment is counted.
///
pub trait ProblemSink: Send {
    /// Record one problem. `detail` is a record summary, or just the read
    /// name for problems diagnosed after the stream ends.
    fn report(&mut self, problem: Problem, detail: &str);

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes problems as `reason<TAB>detail` lines.
pub struct ProblemLog<W: Write + Send> {
    writer: W,
    failed: bool,
}

impl ProblemLog<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(ProblemLog::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> ProblemLog<W> {
    pub fn new(writer: W) -> Self {
        ProblemLog {
            writer,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ProblemSink for ProblemLog<W> {
    fn report(&mut self, problem: Problem, detail: &str) {
        if self.failed {
            return;
        }
        let written = if detail.is_empty() {
            writeln!(self.writer, "{}", problem)
        } else {
            writeln!(self.writer, "{}\t{}", problem, detail)
        };
        if let Err(e) = written {
            log::warn!("Could not write to the problematic read log: {}", e);
            self.failed = true;
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// The file a read group's problematic reads are logged to.
pub fn problem_log_path(directory: &Path, read_group: &str) -> PathBuf {
    directory.join(format!("{}.problems", read_group))
}
