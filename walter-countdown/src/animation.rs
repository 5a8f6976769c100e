use image::{
    codecs::gif::{GifEncoder, Repeat},
    Delay, Frame, RgbaImage,
};
use tiny_skia::Pixmap;

use crate::{
    error::{Error, Result},
    raster::into_rgba,
};

/// Time each in-between frame is shown.
pub const FRAME_DELAY_MS: u32 = 40;

/// How long the last frame stays up before the loop starts over.
pub const HOLD_DELAY_MS: u32 = 2_000;

/// Quantizer speed, 1 (best) to 30 (fastest).
const GIF_SPEED: i32 = 10;

/// Encodes the frames as a looping GIF.
///
/// Frames are pulled one at a time, so a lazily rendering iterator only ever has a single
/// full-size frame alive.
pub fn encode_gif<I>(frames: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<Pixmap>>,
    I::IntoIter: ExactSizeIterator,
{
    let frames = frames.into_iter();
    let count = frames.len();

    let mut gif_data = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut gif_data, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;

        for (index, pixmap) in frames.enumerate() {
            let pixmap = pixmap?;
            let (width, height) = (pixmap.width(), pixmap.height());
            let buffer = RgbaImage::from_raw(width, height, into_rgba(pixmap))
                .ok_or(Error::SurfaceAllocation { width, height })?;
            let delay = if index + 1 == count {
                HOLD_DELAY_MS
            } else {
                FRAME_DELAY_MS
            };
            encoder.encode_frame(Frame::from_parts(
                buffer,
                0,
                0,
                Delay::from_numer_denom_ms(delay, 1),
            ))?;
        }
    }

    log::debug!("Encoded {count} GIF frames into {} bytes", gif_data.len());
    Ok(gif_data)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{codecs::gif::GifDecoder, AnimationDecoder};
    use tiny_skia::Color;

    use super::*;

    fn solid(color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(8, 4).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn frames_round_trip_with_hold_on_the_last() {
        let frames = [
            solid(Color::WHITE),
            solid(Color::BLACK),
            solid(Color::WHITE),
        ];
        let gif = encode_gif(frames.into_iter().map(Ok)).unwrap();
        assert_eq!(&gif[..6], b"GIF89a");

        let decoded = GifDecoder::new(Cursor::new(gif))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].buffer().dimensions(), (8, 4));
        assert_eq!(decoded[0].delay().numer_denom_ms(), (FRAME_DELAY_MS, 1));
        assert_eq!(decoded[2].delay().numer_denom_ms(), (HOLD_DELAY_MS, 1));
    }

    #[test]
    fn a_failing_frame_stops_the_encoding() {
        let frames = [
            Ok(solid(Color::WHITE)),
            Err(Error::SurfaceAllocation {
                width: 0,
                height: 0,
            }),
        ];
        assert!(matches!(
            encode_gif(frames),
            Err(Error::SurfaceAllocation { .. })
        ));
    }
}
