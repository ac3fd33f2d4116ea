use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SituationError {
    #[error("Config directory not found at {0}. Run 'situatie init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {source}")]
    ConfigSerialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Required field '{0}' is empty. Set it with 'situatie header'.")]
    MissingField(&'static str),

    #[error("The worksheet has no rows. Use 'situatie add-row' to add one.")]
    NoItems,

    #[error("Row {0} not found in the worksheet")]
    RowNotFound(u32),

    #[error("Cannot delete row {0}: a worksheet keeps at least one row")]
    LastRow(u32),

    #[error("Unknown factor '{0}'. Use 'total-qty', 'month-qty' or 'rate'.")]
    InvalidFactor(String),

    #[error("Invalid color '{0}'. Expected a hex value like '#1abd9c'.")]
    InvalidColor(String),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image: {0}")]
    Image(#[from] crate::render::ImageError),

    #[error("No footer image loaded. Use 'situatie image <path>' first.")]
    NoImage,

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SituationError>;
