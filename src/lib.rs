//! Embedded-image media parts for spreadsheet-style document packages.
//!
//! Loads an image from a file path, an in-memory buffer, or already-decoded
//! pixels, normalizes its encoding, and writes it under a deterministic
//! `/xl/media/image{id}.{ext}` member path in a zip package. GIF, JPEG, PNG
//! and the WMF/EMF metafile formats are preserved byte-for-byte; every other
//! recognized raster encoding is converted to PNG.
//!
//! ```no_run
//! use xl_media::{EmbeddedImage, MediaWriter};
//!
//! # fn main() -> xl_media::Result<()> {
//! let logo = EmbeddedImage::from_path("logo.png")?.with_desc("company logo");
//!
//! let mut media = MediaWriter::new(std::io::Cursor::new(Vec::new()));
//! let path = media.add_image(&logo)?;
//! assert_eq!(path, "/xl/media/image1.png");
//! let package = media.finish()?.into_inner();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod format;
pub mod media;
pub mod package;

// Re-export commonly used types
pub use error::{Error, Result};
pub use format::MediaFormat;
pub use media::{EmbeddedImage, ImageSource};
pub use package::MediaWriter;
