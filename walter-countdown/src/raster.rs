use std::{path::Path, sync::Arc};

use fontdb::{Database, Source};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use tiny_skia::{Pixmap, PremultipliedColorU8, Transform};

use crate::error::{Error, Result};

/// Only the bundled face. Works without a filesystem.
pub fn embedded_fonts() -> Database {
    let mut fontdb = Database::new();
    fontdb.load_font_source(Source::Binary(Arc::new(include_bytes!(
        "../assets/DejaVuSans-Bold.ttf"
    ))));
    fontdb.set_sans_serif_family("DejaVu Sans");
    fontdb
}

/// The bundled face, the system fonts and an optional extra directory.
pub fn load_fonts(extra_dir: Option<&Path>) -> Database {
    let mut fontdb = embedded_fonts();
    fontdb.load_system_fonts();
    if let Some(dir) = extra_dir {
        fontdb.load_fonts_dir(dir);
    }
    log::debug!("Loaded {} font faces", fontdb.len());
    fontdb
}

/// Renders an SVG document at `scale` times its own size.
pub fn rasterize(svg_data: &[u8], scale: f32, fontdb: &Database) -> Result<Pixmap> {
    log::debug!("Make SVG tree");

    let tree = usvg::Tree::from_data(svg_data, &usvg::Options::default(), fontdb)?;

    log::debug!("Render SVG");

    let size = tree.size().to_int_size();
    let width = (size.width() as f32 * scale).round() as u32;
    let height = (size.height() as f32 * scale).round() as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(Error::SurfaceAllocation { width, height })?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// Straight-alpha RGBA bytes, demultiplied in the pixmap's own buffer.
pub fn into_rgba(pixmap: Pixmap) -> Vec<u8> {
    let mut data = pixmap.take();
    for pixel in data.chunks_exact_mut(4) {
        if let Some(color) = PremultipliedColorU8::from_rgba(pixel[0], pixel[1], pixel[2], pixel[3])
        {
            let color = color.demultiply();
            pixel.copy_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
    }
    data
}

pub fn encode_png(pixmap: Pixmap) -> Result<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data).write_image(
        &into_rgba(pixmap),
        width,
        height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10"><rect x="0" y="0" width="20" height="10" fill="#4840BB"/></svg>"##;

    #[test]
    fn scale_multiplies_the_pixel_size() {
        let pixmap = rasterize(SQUARE.as_bytes(), 2.0, &Database::new()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (40, 20));
    }

    #[test]
    fn png_decodes_to_the_drawn_colour() {
        let pixmap = rasterize(SQUARE.as_bytes(), 1.0, &Database::new()).unwrap();
        let png = encode_png(pixmap).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (20, 10));
        assert_eq!(decoded.get_pixel(5, 5).0, [0x48, 0x40, 0xBB, 0xFF]);
    }

    #[test]
    fn translucent_pixels_are_demultiplied() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(200, 100, 0, 128));

        let rgba = into_rgba(pixmap);
        assert_eq!(rgba[3], 128);
        assert!((i32::from(rgba[0]) - 200).abs() <= 2);
        assert!((i32::from(rgba[1]) - 100).abs() <= 2);
    }

    #[test]
    fn bundled_face_is_always_there() {
        let fontdb = embedded_fonts();
        assert_eq!(fontdb.len(), 1);
        assert!(fontdb
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == "DejaVu Sans")));
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(matches!(
            rasterize(b"<svg", 1.0, &Database::new()),
            Err(Error::Svg(_))
        ));
    }
}
