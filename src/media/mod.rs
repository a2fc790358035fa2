//! Loading and normalizing images for storage as package media parts.

mod encode;

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::format::{self, Detected, MediaFormat};

/// Where an embedded image came from.
///
/// Record equality is defined over the source alone, so two records built
/// from the same path or the same buffer compare equal even if their
/// normalized bytes differ.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Buffer(Vec<u8>),
    Decoded(DynamicImage),
}

/// An image normalized and cached in memory, ready to be written as a
/// `/xl/media/image{id}.{ext}` member of a document package.
///
/// Allow-listed encodings (GIF, JPEG, PNG, WMF, EMF) keep their original
/// bytes verbatim; every other recognized raster encoding is converted to
/// PNG at construction. The payload is populated once and never mutated.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    source: ImageSource,
    width: u32,
    height: u32,
    format: MediaFormat,
    data: Vec<u8>,
    // Alt text; the drawing XML calls this 'descr'
    desc: Option<String>,
    anchor: String,
}

const DEFAULT_ANCHOR: &str = "A1";

impl EmbeddedImage {
    /// Load and normalize the image file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (format, (width, height), data) = normalize(&data)?;
        Ok(Self::record(
            ImageSource::Path(path.to_path_buf()),
            format,
            width,
            height,
            data,
        ))
    }

    /// Normalize an encoded payload already held in memory.
    pub fn from_buffer(buffer: Vec<u8>) -> Result<Self> {
        let (format, (width, height), data) = normalize(&buffer)?;
        Ok(Self::record(
            ImageSource::Buffer(buffer),
            format,
            width,
            height,
            data,
        ))
    }

    /// Serialize an already-decoded image.
    ///
    /// With a declared raster format from the allow-list the pixels are
    /// re-encoded into that format. A declared metafile format, or no
    /// declared format at all, falls back to PNG: a metafile cannot be
    /// rebuilt from raster pixels.
    pub fn from_decoded(img: DynamicImage, declared: Option<MediaFormat>) -> Result<Self> {
        let format = match declared {
            Some(f) if !f.is_metafile() => f,
            _ => MediaFormat::Png,
        };
        let (width, height) = (img.width(), img.height());
        let data = encode::encode(&img, format)?;
        Ok(Self::record(
            ImageSource::Decoded(img),
            format,
            width,
            height,
            data,
        ))
    }

    /// Dispatch on an explicit source variant. Decoded sources carry no
    /// declared format and therefore serialize as PNG.
    pub fn from_source(source: ImageSource) -> Result<Self> {
        match source {
            ImageSource::Path(path) => Self::from_path(path),
            ImageSource::Buffer(buffer) => Self::from_buffer(buffer),
            ImageSource::Decoded(img) => Self::from_decoded(img, None),
        }
    }

    fn record(
        source: ImageSource,
        format: MediaFormat,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Self {
        EmbeddedImage {
            source,
            width,
            height,
            format,
            data,
            desc: None,
            anchor: DEFAULT_ANCHOR.to_string(),
        }
    }

    /// Attach alt text.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Anchor the image to a cell reference other than the default `A1`.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> MediaFormat {
        self.format
    }

    /// The normalized payload written to the package.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Member path for the given id, e.g. `/xl/media/image1.jpeg`. Ids are
    /// assigned by the owning [`MediaWriter`](crate::package::MediaWriter)
    /// at registration time.
    pub fn archive_path(&self, id: u32) -> String {
        format!("/xl/media/image{id}.{}", self.format.extension())
    }
}

impl PartialEq for EmbeddedImage {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Sniff, measure, and serialize an encoded payload.
fn normalize(data: &[u8]) -> Result<(MediaFormat, (u32, u32), Vec<u8>)> {
    match format::sniff(data)? {
        Detected::Preserve(media) if media.is_metafile() => {
            let dimensions = match media {
                MediaFormat::Emf => format::emf_dimensions(data)?,
                _ => format::wmf_dimensions(data)?,
            };
            Ok((media, dimensions, data.to_vec()))
        }
        Detected::Preserve(media) => {
            // Decode only to read the pixel size; the original bytes are kept.
            let img = decode(data)?;
            Ok((media, (img.width(), img.height()), data.to_vec()))
        }
        Detected::Convert(raster) => {
            log::debug!("converting {raster:?} payload to PNG");
            let img = decode(data)?;
            let png = encode::encode(&img, MediaFormat::Png)?;
            Ok((MediaFormat::Png, (img.width(), img.height()), png))
        }
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data).map_err(Error::Decode)
}
