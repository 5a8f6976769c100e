use std::{fs, io::ErrorKind, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const BRAND_TEXT: &str = "WALTER";

/// A decoded-and-verified brand picture, kept in its original encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandImage {
    data: Vec<u8>,
    mime: &'static str,
    width: u32,
    height: u32,
}

impl BrandImage {
    /// Checks that `data` decodes as an image. Anything else is treated as a missing asset.
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let format = image::guess_format(&data).ok()?;
        let mime = match format {
            image::ImageFormat::Png => "image/png",
            image::ImageFormat::Gif => "image/gif",
            _ => return None,
        };
        let decoded = image::load_from_memory_with_format(&data, format).ok()?;

        Some(Self {
            data,
            mime,
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

/// What goes under the digit groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Brand {
    Image(BrandImage),
    #[default]
    Text,
}

impl Brand {
    /// Loads the brand picture, falling back to text when the file is absent, empty or
    /// not an image.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("No brand image at {}, drawing text", path.display());
                return Brand::Text;
            }
            Err(err) => {
                log::warn!("Failed to read brand image {}: {err}", path.display());
                return Brand::Text;
            }
        };

        if data.is_empty() {
            log::warn!("Brand image {} is empty, drawing text", path.display());
            return Brand::Text;
        }

        match BrandImage::from_bytes(data) {
            Some(image) => {
                log::debug!(
                    "Loaded {}x{} brand image from {}",
                    image.width,
                    image.height,
                    path.display()
                );
                Brand::Image(image)
            }
            None => {
                log::warn!("Brand image {} could not be decoded, drawing text", path.display());
                Brand::Text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use image::{ImageFormat, Rgba, RgbaImage};
    use tempfile::NamedTempFile;

    use super::*;

    fn scratch_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn missing_file_falls_back_to_text() {
        let brand = Brand::load("/definitely/not/here/walter-text.png");
        assert_eq!(brand, Brand::Text);
    }

    #[test]
    fn empty_file_falls_back_to_text() {
        let file = scratch_file(&[]);
        assert_eq!(Brand::load(file.path()), Brand::Text);
    }

    #[test]
    fn garbage_falls_back_to_text() {
        let file = scratch_file(b"not an image at all");
        assert_eq!(Brand::load(file.path()), Brand::Text);
    }

    #[test]
    fn png_is_loaded_with_its_size() {
        let file = scratch_file(&png(40, 10));
        match Brand::load(file.path()) {
            Brand::Image(image) => {
                assert_eq!((image.width(), image.height()), (40, 10));
                assert!(image.data_url().starts_with("data:image/png;base64,iVBOR"));
            }
            Brand::Text => panic!("expected an image"),
        }
    }
}
