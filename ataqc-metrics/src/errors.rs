use thiserror::Error;

use ataqc_core::errors::AtaqcError;
use ataqc_peaks::PeakIndexError;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metrics for read group {0} have already been finalized")]
    AlreadyFinalized(String),
    #[error("Read group {0} was not declared in the alignment header")]
    UnknownReadGroup(String),
    #[error("Read group {0} was declared more than once")]
    DuplicateReadGroup(String),
    #[error("No read group is available for an alignment without an RG tag")]
    NoReadGroup,
    #[error("Could not load peaks for read group {read_group}: {source}")]
    PeakLoadError {
        read_group: String,
        #[source]
        source: AtaqcError,
    },
    #[error(transparent)]
    PeakIndex(#[from] PeakIndexError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
