use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtaqcError {
    #[error("Can't read file {path}: {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Error parsing feature on line {line} of {path}: {reason}")]
    FeatureParseError {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Error parsing feature: {0}")]
    InvalidFeature(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
