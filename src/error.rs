use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::{CategoryId, ImageId};

/// Errors raised by the dataset stages.
///
/// The command-line layer wraps these in `anyhow` with extra context; the
/// variants stay matchable so callers can tell a missing image apart from a
/// broken file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("image id {0} not found in the dataset")]
    NotFound(ImageId),

    #[error("category id {0} is not defined in the dataset")]
    UnknownCategory(CategoryId),

    #[error("index {index} is out of range for a dataset of {len} images")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("good pair ({left}, {right}) does not fit {len} annotations")]
    InvalidPair { left: usize, right: usize, len: usize },

    #[error("failed to download {url}: status code {status}")]
    Http { url: String, status: u16 },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {origin}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write CSV {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to load image {}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported output extension: .{0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
