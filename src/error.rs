use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file read failed: {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error for {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("probe fault: {0}")]
    Probe(String),

    #[error("report write failed: {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
