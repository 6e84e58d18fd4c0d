use thiserror::Error;

/// Fatal data-load failures. Everything per-row is absorbed as a dropped
/// record inside the loader; only these stop the program from serving.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: required column '{column}' not found")]
    MissingColumn { path: String, column: &'static str },
    #[error("no usable records after cleaning {path}")]
    EmptyAfterCleaning { path: String },
}
