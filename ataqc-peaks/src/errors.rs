use thiserror::Error;

/// Errors that can occur when building a [`PeakIndex`](crate::PeakIndex).
#[derive(Debug, Error)]
pub enum PeakIndexError {
    /// A peak was added to the collection of a different reference.
    #[error("Peak {peak} is on {found}, but the collection holds peaks on {expected}")]
    ReferenceMismatch {
        peak: String,
        expected: String,
        found: String,
    },
}
