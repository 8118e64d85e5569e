use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum RefineError {
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("invalid mapping for dataset {dataset}: {message}")]
    InvalidMapping { dataset: String, message: String },

    #[error("invalid date value: {0}")]
    InvalidDate(String),

    #[error("invalid count value: {0}")]
    InvalidCount(String),

    #[error("failed to open source file at {0}")]
    SourceOpen(Utf8PathBuf),

    #[error("failed to read source record: {0}")]
    SourceRead(String),

    #[error("unsupported source encoding: {0}")]
    SourceEncoding(String),

    #[error("backbone request failed: {0}")]
    BackboneHttp(String),

    #[error("backbone returned status {status}: {message}")]
    BackboneStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
