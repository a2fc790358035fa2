//! Format tags and content sniffing for media payloads.

use std::fmt;

use crate::error::{Error, Result};

/// Encodings a media part may be stored as.
///
/// These five are the allow-list preserved byte-for-byte in the package;
/// every other recognized raster encoding is converted to PNG before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Gif,
    Jpeg,
    Png,
    Wmf,
    Emf,
}

impl MediaFormat {
    /// Upper-case format tag, e.g. `"JPEG"`.
    pub fn tag(self) -> &'static str {
        match self {
            MediaFormat::Gif => "GIF",
            MediaFormat::Jpeg => "JPEG",
            MediaFormat::Png => "PNG",
            MediaFormat::Wmf => "WMF",
            MediaFormat::Emf => "EMF",
        }
    }

    /// Lower-case extension used in member paths. JPEG deliberately maps to
    /// `jpeg` rather than `jpg`; member paths are derived from the tag.
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Gif => "gif",
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Png => "png",
            MediaFormat::Wmf => "wmf",
            MediaFormat::Emf => "emf",
        }
    }

    pub fn is_metafile(self) -> bool {
        matches!(self, MediaFormat::Wmf | MediaFormat::Emf)
    }

    fn from_raster(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Gif => Some(MediaFormat::Gif),
            image::ImageFormat::Jpeg => Some(MediaFormat::Jpeg),
            image::ImageFormat::Png => Some(MediaFormat::Png),
            _ => None,
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Outcome of sniffing an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Detected {
    /// Allow-listed encoding, stored verbatim.
    Preserve(MediaFormat),
    /// Recognized raster encoding outside the allow-list, converted to PNG.
    Convert(image::ImageFormat),
}

// Placeable WMF header magic, little-endian 0x9AC6CDD7.
const WMF_PLACEABLE_MAGIC: [u8; 4] = [0xD7, 0xCD, 0xC6, 0x9A];
// ENHMETAHEADER: record type 1, " EMF" signature at byte 40.
const EMF_RECORD_TYPE: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
const EMF_SIGNATURE: &[u8; 4] = b" EMF";

/// Identify the encoding of `data` from its leading bytes.
///
/// Metafiles are checked first; the raster guesser does not know them.
pub(crate) fn sniff(data: &[u8]) -> Result<Detected> {
    if is_emf(data) {
        return Ok(Detected::Preserve(MediaFormat::Emf));
    }
    if is_wmf(data) {
        return Ok(Detected::Preserve(MediaFormat::Wmf));
    }
    match image::guess_format(data) {
        Ok(format) => match MediaFormat::from_raster(format) {
            Some(media) => Ok(Detected::Preserve(media)),
            None => Ok(Detected::Convert(format)),
        },
        Err(_) => Err(Error::UnknownFormat),
    }
}

fn is_emf(data: &[u8]) -> bool {
    data.len() >= 44 && data[..4] == EMF_RECORD_TYPE && &data[40..44] == EMF_SIGNATURE
}

fn is_wmf(data: &[u8]) -> bool {
    data.len() >= 22 && data[..4] == WMF_PLACEABLE_MAGIC
}

/// Pixel dimensions of an EMF payload, taken from the `rclBounds` device
/// rectangle at byte offset 8.
pub(crate) fn emf_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    // Header fields are untrusted; widen before subtracting so a hostile
    // rectangle cannot overflow i32.
    let left = long(data, 8)? as i64;
    let top = long(data, 12)? as i64;
    let right = long(data, 16)? as i64;
    let bottom = long(data, 20)? as i64;

    let width = right - left;
    let height = bottom - top;
    if width <= 0 || height <= 0 || width > i32::MAX as i64 || height > i32::MAX as i64 {
        return Err(Error::Metafile("invalid EMF bounds"));
    }
    Ok((width as u32, height as u32))
}

/// Pixel dimensions of a placeable WMF at 72 dpi, from the header bounding
/// box (logical units) and its units-per-inch field.
pub(crate) fn wmf_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    let left = short(data, 6)? as i64;
    let top = short(data, 8)? as i64;
    let right = short(data, 10)? as i64;
    let bottom = short(data, 12)? as i64;
    let inch = word(data, 14)? as i64;

    if inch == 0 {
        return Err(Error::Metafile("zero WMF resolution"));
    }
    let width = (right - left) * 72 / inch;
    let height = (bottom - top) * 72 / inch;
    if width <= 0 || height <= 0 {
        return Err(Error::Metafile("empty WMF bounding box"));
    }
    Ok((width as u32, height as u32))
}

fn long(data: &[u8], offset: usize) -> Result<i32> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(Error::Metafile("truncated header"))?;
    Ok(i32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
}

fn short(data: &[u8], offset: usize) -> Result<i16> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(Error::Metafile("truncated header"))?;
    Ok(i16::from_le_bytes(bytes.try_into().expect("2-byte slice")))
}

fn word(data: &[u8], offset: usize) -> Result<u16> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(Error::Metafile("truncated header"))?;
    Ok(u16::from_le_bytes(bytes.try_into().expect("2-byte slice")))
}

/// Minimal EMF header with the given `rclBounds` rectangle.
#[cfg(test)]
pub(crate) fn emf_fixture(left: i32, top: i32, right: i32, bottom: i32) -> Vec<u8> {
    let mut data = vec![0u8; 88];
    data[..4].copy_from_slice(&EMF_RECORD_TYPE);
    data[4..8].copy_from_slice(&88u32.to_le_bytes());
    for (i, value) in [left, top, right, bottom].into_iter().enumerate() {
        let offset = 8 + i * 4;
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    data[40..44].copy_from_slice(EMF_SIGNATURE);
    data
}

/// Minimal placeable WMF header with the given bounding box.
#[cfg(test)]
pub(crate) fn wmf_fixture(left: i16, top: i16, right: i16, bottom: i16, inch: u16) -> Vec<u8> {
    let mut data = vec![0u8; 40];
    data[..4].copy_from_slice(&WMF_PLACEABLE_MAGIC);
    for (i, value) in [left, top, right, bottom].into_iter().enumerate() {
        let offset = 6 + i * 2;
        data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
    data[14..16].copy_from_slice(&inch.to_le_bytes());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_allowlisted_rasters() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\0";
        let jpeg = b"\xFF\xD8\xFF\xE0\0\0\0\0";
        let gif = b"GIF89a\0\0\0\0\0\0";

        assert_eq!(sniff(png).unwrap(), Detected::Preserve(MediaFormat::Png));
        assert_eq!(sniff(jpeg).unwrap(), Detected::Preserve(MediaFormat::Jpeg));
        assert_eq!(sniff(gif).unwrap(), Detected::Preserve(MediaFormat::Gif));
    }

    #[test]
    fn sniffs_metafiles() {
        assert_eq!(
            sniff(&emf_fixture(0, 0, 100, 50)).unwrap(),
            Detected::Preserve(MediaFormat::Emf)
        );
        assert_eq!(
            sniff(&wmf_fixture(0, 0, 72, 72, 72)).unwrap(),
            Detected::Preserve(MediaFormat::Wmf)
        );
    }

    #[test]
    fn bmp_is_convertible() {
        let bmp = b"BM\0\0\0\0\0\0\0\0\0\0\0\0";
        assert_eq!(
            sniff(bmp).unwrap(),
            Detected::Convert(image::ImageFormat::Bmp)
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert!(matches!(sniff(b"not an image"), Err(Error::UnknownFormat)));
        assert!(matches!(sniff(&[]), Err(Error::UnknownFormat)));
    }

    #[test]
    fn emf_bounds_give_dimensions() {
        let data = emf_fixture(10, 20, 410, 320);
        assert_eq!(emf_dimensions(&data).unwrap(), (400, 300));
    }

    #[test]
    fn emf_empty_bounds_rejected() {
        let data = emf_fixture(0, 0, 0, 0);
        assert!(matches!(emf_dimensions(&data), Err(Error::Metafile(_))));
    }

    #[test]
    fn emf_overflowing_bounds_rejected() {
        // A span wider than i32 must come back as an error, not wrap
        let data = emf_fixture(i32::MIN, 0, i32::MAX, 10);
        assert!(matches!(emf_dimensions(&data), Err(Error::Metafile(_))));

        let data = emf_fixture(0, i32::MIN, 10, i32::MAX);
        assert!(matches!(emf_dimensions(&data), Err(Error::Metafile(_))));
    }

    #[test]
    fn wmf_box_scales_to_72_dpi() {
        // 144 logical units per inch, box of 288x144 units -> 144x72 px
        let data = wmf_fixture(0, 0, 288, 144, 144);
        assert_eq!(wmf_dimensions(&data).unwrap(), (144, 72));
    }

    #[test]
    fn wmf_zero_resolution_rejected() {
        let data = wmf_fixture(0, 0, 100, 100, 0);
        assert!(matches!(wmf_dimensions(&data), Err(Error::Metafile(_))));
    }

    #[test]
    fn truncated_metafile_header_rejected() {
        assert!(matches!(emf_dimensions(&[0u8; 12]), Err(Error::Metafile(_))));
    }

    #[test]
    fn tags_and_extensions() {
        assert_eq!(MediaFormat::Jpeg.tag(), "JPEG");
        assert_eq!(MediaFormat::Jpeg.extension(), "jpeg");
        assert_eq!(MediaFormat::Emf.extension(), "emf");
        assert!(MediaFormat::Wmf.is_metafile());
        assert!(!MediaFormat::Png.is_metafile());
    }
}
