use std::sync::Arc;

use chrono::{DateTime, Utc};
use fontdb::Database;

use crate::{
    animation::encode_gif,
    brand::Brand,
    error::Result,
    flip::{frame_progress, Flip, FLIP_FRAMES},
    html::HtmlSurface,
    layout::PanelLayout,
    raster::{encode_png, rasterize},
    remaining::{RemainingDuration, TargetMoment},
    render::FlipPanelRenderer,
    svg::SvgSurface,
};

/// The value changes every minute, so clients may reuse a response for that long.
pub const CACHE_CONTROL: &str = "public, max-age=60";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Svg,
    Html,
    Gif,
}

impl Format {
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Svg => "image/svg+xml",
            Format::Html => "text/html; charset=utf-8",
            Format::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Svg => "svg",
            Format::Html => "html",
            Format::Gif => "gif",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Format::Png),
            "svg" => Some(Format::Svg),
            "html" | "htm" => Some(Format::Html),
            "gif" => Some(Format::Gif),
            _ => None,
        }
    }
}

/// Canvas size requested by a client. The height is always half the width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    width: u32,
    scale: f32,
}

impl RenderOptions {
    pub const DEFAULT_WIDTH: u32 = 1200;
    pub const MIN_WIDTH: u32 = 600;
    pub const MAX_WIDTH: u32 = 2000;
    pub const DEFAULT_SCALE: f32 = 1.0;
    pub const MIN_SCALE: f32 = 1.0;
    pub const MAX_SCALE: f32 = 3.0;

    pub fn new(width: u32, scale: f32) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            Self::DEFAULT_SCALE
        };
        Self {
            width: width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH),
            scale,
        }
    }

    /// Reads raw query values; missing or unparsable ones take the defaults.
    pub fn from_query(width: Option<&str>, scale: Option<&str>) -> Self {
        let width = width
            .and_then(|w| w.trim().parse::<f32>().ok())
            .filter(|w| w.is_finite())
            .map(|w| w.clamp(Self::MIN_WIDTH as f32, Self::MAX_WIDTH as f32).round() as u32)
            .unwrap_or(Self::DEFAULT_WIDTH);
        let scale = scale
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|s| s.is_finite())
            .unwrap_or(Self::DEFAULT_SCALE);
        Self::new(width, scale)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.width / 2
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn layout(&self) -> PanelLayout {
        PanelLayout::new(self.width as f32, self.height() as f32)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_SCALE)
    }
}

/// A finished response body, independent of the hosting target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Payload {
    pub fn headers(&self) -> [(&'static str, &'static str); 2] {
        [
            ("Content-Type", self.content_type),
            ("Cache-Control", CACHE_CONTROL),
        ]
    }
}

/// Renders the countdown to a fixed target. Holds only read-only data, so one instance can
/// serve any number of concurrent requests; every render builds its own surface.
pub struct Countdown {
    target: TargetMoment,
    brand: Brand,
    fontdb: Arc<Database>,
}

impl Countdown {
    pub fn new(target: TargetMoment, brand: Brand, fontdb: Arc<Database>) -> Self {
        Self {
            target,
            brand,
            fontdb,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> RemainingDuration {
        self.target.remaining_at(now)
    }

    pub fn render_svg(
        &self,
        remaining: &RemainingDuration,
        options: &RenderOptions,
        flip: Option<&Flip>,
    ) -> Result<String> {
        let layout = options.layout();
        let mut surface = SvgSurface::new(layout.width, layout.height);
        FlipPanelRenderer::new(&layout, &self.brand).draw(
            &mut surface,
            &remaining.digit_groups(),
            flip,
        );
        surface.finish()
    }

    pub fn render_html(
        &self,
        remaining: &RemainingDuration,
        options: &RenderOptions,
    ) -> Result<String> {
        let layout = options.layout();
        let mut surface = HtmlSurface::new(layout.width, layout.height);
        FlipPanelRenderer::new(&layout, &self.brand).draw(
            &mut surface,
            &remaining.digit_groups(),
            None,
        );
        surface.finish()
    }

    fn render_gif(&self, remaining: &RemainingDuration, options: &RenderOptions) -> Result<Vec<u8>> {
        let frames = if Flip::at(remaining, 0.5).is_moving() {
            frame_progress(FLIP_FRAMES)
        } else {
            frame_progress(1)
        };

        encode_gif(frames.into_iter().map(|progress| {
            let flip = Flip::at(remaining, progress);
            let svg = self.render_svg(remaining, options, Some(&flip))?;
            rasterize(svg.as_bytes(), options.scale(), &self.fontdb)
        }))
    }

    pub fn render(
        &self,
        format: Format,
        options: &RenderOptions,
        now: DateTime<Utc>,
    ) -> Result<Payload> {
        let remaining = self.remaining(now);
        log::debug!(
            "Rendering {} at {}x{}@{} with {remaining} remaining",
            format.extension(),
            options.width(),
            options.height(),
            options.scale()
        );

        let body = match format {
            Format::Svg => self.render_svg(&remaining, options, None)?.into_bytes(),
            Format::Html => self.render_html(&remaining, options)?.into_bytes(),
            Format::Png => {
                let svg = self.render_svg(&remaining, options, None)?;
                encode_png(rasterize(svg.as_bytes(), options.scale(), &self.fontdb)?)?
            }
            Format::Gif => self.render_gif(&remaining, options)?,
        };

        Ok(Payload {
            content_type: format.content_type(),
            body,
        })
    }

    pub fn render_now(&self, format: Format, options: &RenderOptions) -> Result<Payload> {
        self.render(format, options, Utc::now())
    }
}
