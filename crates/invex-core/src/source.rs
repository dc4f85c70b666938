//! Invoice images on disk.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::Result;

/// A decoded invoice image, re-encoded as PNG for upload.
#[derive(Debug, Clone)]
pub struct InvoiceImage {
    name: String,
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl InvoiceImage {
    /// Decode an image file, detecting the format from its contents.
    /// Fails if the file is not a readable image.
    pub fn open(path: &Path) -> Result<Self> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_image(name, &image)
    }

    /// Wrap an already decoded image.
    pub fn from_image(name: impl Into<String>, image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();

        // PNG has no float sample formats.
        let converted;
        let encodable = match image {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                converted = DynamicImage::ImageRgba8(image.to_rgba8());
                &converted
            }
            other => other,
        };

        let mut png = Cursor::new(Vec::new());
        encodable.write_to(&mut png, ImageFormat::Png)?;

        let name = name.into();
        debug!(name = %name, width, height, bytes = png.get_ref().len(), "Loaded image");

        Ok(Self {
            name,
            width,
            height,
            png: png.into_inner(),
        })
    }

    /// File name the image was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }

    /// PNG-encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.png
    }
}

/// List the plain files directly inside `dir`, in directory-listing order.
///
/// Subdirectories are skipped; nothing is filtered by extension, so a
/// non-image file fails later when it is decoded.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvexError;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_list_images_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        fs::write(dir.path().join("archive").join("b.png"), b"x").unwrap();

        let mut names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names, ["a.png", "notes.txt"]);
    }

    #[test]
    fn test_list_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_images(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, InvexError::Io(_)));
    }

    #[test]
    fn test_open_encodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.jpg");
        RgbImage::from_pixel(8, 4, Rgb([255, 255, 255])).save(&path).unwrap();

        let image = InvoiceImage::open(&path).unwrap();
        assert_eq!(image.name(), "invoice.jpg");
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(&image.bytes()[..4], b"\x89PNG");
    }

    #[test]
    fn test_open_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("source.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&png).unwrap();

        for name in ["IMG_0001", "scan.jpg"] {
            let path = dir.path().join(name);
            fs::copy(&png, &path).unwrap();

            let image = InvoiceImage::open(&path).unwrap();
            assert_eq!(image.name(), name);
            assert_eq!(image.dimensions(), (4, 4));
        }
    }

    #[test]
    fn test_open_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "not an image").unwrap();

        assert!(InvoiceImage::open(&path).is_err());
    }
}
