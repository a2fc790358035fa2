//! Re-encoding decoded pixels into a storable format.

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, Frame, ImageEncoder};

use crate::error::{Error, Result};
use crate::format::MediaFormat;

// Re-encoding is a fallback path; favor fidelity over size.
const JPEG_QUALITY: u8 = 95;

/// Encode `img` into `format`. Metafile formats cannot be synthesized from
/// raster pixels; callers normalize those to PNG before reaching here.
pub(crate) fn encode(img: &DynamicImage, format: MediaFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        MediaFormat::Png => encode_png(img, &mut buffer)?,
        MediaFormat::Jpeg => encode_jpeg(img, &mut buffer)?,
        MediaFormat::Gif => encode_gif(img, &mut buffer)?,
        MediaFormat::Wmf | MediaFormat::Emf => {
            unreachable!("metafile formats are never re-encoded")
        }
    }
    log::trace!("re-encoded {}x{} image as {format}", img.width(), img.height());
    Ok(buffer)
}

fn encode_png(img: &DynamicImage, buffer: &mut Vec<u8>) -> Result<()> {
    let is_grayscale = img.color() == ColorType::L8 || img.color() == ColorType::La8;

    let encoder = PngEncoder::new_with_quality(
        buffer,
        CompressionType::Default,
        if is_grayscale {
            FilterType::NoFilter
        } else {
            FilterType::Adaptive
        },
    );

    encoder
        .write_image(
            img.as_bytes(),
            img.width(),
            img.height(),
            img.color().into(),
        )
        .map_err(|source| Error::Encode {
            format: MediaFormat::Png.tag(),
            source,
        })
}

fn encode_jpeg(img: &DynamicImage, buffer: &mut Vec<u8>) -> Result<()> {
    let mut encoder = JpegEncoder::new_with_quality(buffer, JPEG_QUALITY);

    // JPEG has no alpha channel
    let result = if img.color().has_alpha() {
        encoder.encode_image(&DynamicImage::ImageRgb8(img.to_rgb8()))
    } else {
        encoder.encode_image(img)
    };

    result.map_err(|source| Error::Encode {
        format: MediaFormat::Jpeg.tag(),
        source,
    })
}

fn encode_gif(img: &DynamicImage, buffer: &mut Vec<u8>) -> Result<()> {
    let mut encoder = GifEncoder::new(buffer);
    encoder
        .encode_frame(Frame::new(img.to_rgba8()))
        .map_err(|source| Error::Encode {
            format: MediaFormat::Gif.tag(),
            source,
        })
}
