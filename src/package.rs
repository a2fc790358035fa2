//! Writing media parts into a zip-backed document package.

use std::io::{Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::media::EmbeddedImage;

/// Streams embedded images into a package, assigning each a member id at
/// registration time.
///
/// The id counter belongs to the writer instance, so two images added to the
/// same package can never collide on a member path.
pub struct MediaWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    next_id: u32,
}

impl<W: Write + Seek> MediaWriter<W> {
    pub fn new(writer: W) -> Self {
        MediaWriter {
            zip: ZipWriter::new(writer),
            next_id: 1,
        }
    }

    /// Store `image` under the next `/xl/media/image{id}.{ext}` path and
    /// return that path for the caller's relationship bookkeeping.
    pub fn add_image(&mut self, image: &EmbeddedImage) -> Result<String> {
        let path = image.archive_path(self.next_id);
        self.next_id += 1;

        // Member names carry no leading separator
        let name = path.trim_start_matches('/');
        // Image payloads are already compressed; store them as-is
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        self.zip
            .start_file(name, options)
            .map_err(|source| Error::Archive {
                name: name.to_string(),
                source,
            })?;
        self.zip
            .write_all(image.data())
            .map_err(|source| Error::Archive {
                name: name.to_string(),
                source: zip::result::ZipError::Io(source),
            })?;

        log::debug!("stored media part {name} ({} bytes)", image.data().len());
        Ok(path)
    }

    /// Members written so far.
    pub fn len(&self) -> usize {
        (self.next_id - 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 1
    }

    /// Access the underlying zip writer, e.g. to add the package's
    /// non-media members.
    pub fn zip_mut(&mut self) -> &mut ZipWriter<W> {
        &mut self.zip
    }

    /// Finalize the package and return the inner writer.
    pub fn finish(self) -> Result<W> {
        self.zip.finish().map_err(Error::Finish)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use image::{DynamicImage, RgbImage};
    use zip::ZipArchive;

    use super::*;

    fn png_image() -> EmbeddedImage {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        EmbeddedImage::from_buffer(buffer.into_inner()).unwrap()
    }

    #[test]
    fn members_are_numbered_from_one() {
        let mut writer = MediaWriter::new(Cursor::new(Vec::new()));
        assert!(writer.is_empty());

        let first = writer.add_image(&png_image()).unwrap();
        let second = writer.add_image(&png_image()).unwrap();

        assert_eq!(first, "/xl/media/image1.png");
        assert_eq!(second, "/xl/media/image2.png");
        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn written_members_round_trip() {
        let image = png_image();
        let mut writer = MediaWriter::new(Cursor::new(Vec::new()));
        writer.add_image(&image).unwrap();
        let cursor = writer.finish().unwrap();

        let mut archive = ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.len(), 1);

        // Member name has the leading separator stripped
        let mut member = archive.by_name("xl/media/image1.png").unwrap();
        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, image.data());
    }

    #[test]
    fn mixed_formats_keep_their_extensions() {
        let jpeg = {
            let mut buffer = Cursor::new(Vec::new());
            DynamicImage::ImageRgb8(RgbImage::new(2, 2))
                .write_to(&mut buffer, image::ImageFormat::Jpeg)
                .unwrap();
            EmbeddedImage::from_buffer(buffer.into_inner()).unwrap()
        };

        let mut writer = MediaWriter::new(Cursor::new(Vec::new()));
        writer.add_image(&png_image()).unwrap();
        let path = writer.add_image(&jpeg).unwrap();
        assert_eq!(path, "/xl/media/image2.jpeg");

        let cursor = writer.finish().unwrap();
        let archive = ZipArchive::new(cursor).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert!(names.contains(&"xl/media/image1.png"));
        assert!(names.contains(&"xl/media/image2.jpeg"));
    }
}
