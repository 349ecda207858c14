use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Input folder does not exist or is not a directory: {0}")]
    InvalidInputRoot(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read source '{path}': {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy PDF from '{from}' to '{to}': {source}")]
    CopyPdf {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to build PDF: {0}")]
    PdfEncode(String),

    #[error("Converter command failed: {0}")]
    CommandFailed(String),

    #[error("Converter produced no output at '{0}'")]
    MissingOutput(PathBuf),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Work queue closed unexpectedly")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, DocsiftError>;
