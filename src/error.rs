//! Error types for media loading and package writing.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read image file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image as {format}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// The payload matched no recognized encoding. The record is never
    /// created with empty output bytes; callers get this instead.
    #[error("unrecognized image format")]
    UnknownFormat,

    #[error("invalid metafile: {0}")]
    Metafile(&'static str),

    #[error("failed to write package member {name}")]
    Archive {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to finalize package")]
    Finish(#[source] zip::result::ZipError),
}
