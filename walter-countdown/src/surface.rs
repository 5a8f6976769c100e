//! Drawing primitives shared by every output format.
//!
//! The renderer only talks to [`Surface`]; the SVG and HTML adapters turn the calls into
//! markup, and the raster path goes through the SVG document.

use tiny_skia::Transform;

use crate::brand::BrandImage;

pub const FONT_FAMILY: &str = "Arial, Helvetica, 'DejaVu Sans', sans-serif";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn upper_half(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height / 2.0)
    }

    pub fn lower_half(&self) -> Rect {
        Rect::new(
            self.x,
            self.y + self.height / 2.0,
            self.width,
            self.height / 2.0,
        )
    }

    /// The largest rect with the given aspect ratio that fits inside, centered.
    pub fn fit(&self, width: f32, height: f32) -> Rect {
        let scale = (self.width / width).min(self.height / height);
        let (w, h) = (width * scale, height * scale);
        Rect::new(
            self.x + (self.width - w) / 2.0,
            self.y + (self.height - h) / 2.0,
            w,
            h,
        )
    }
}

/// sRGB colour with an opacity in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub opacity: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            opacity: 100,
        }
    }

    pub const fn with_opacity(self, opacity: u8) -> Self {
        Self { opacity, ..self }
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity.min(100)) / 100.0
    }

    /// CSS colour value, `#RRGGBB` when opaque.
    pub fn css(&self) -> String {
        if self.opacity >= 100 {
            self.hex()
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, num(self.alpha()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    Vertical { top: Color, bottom: Color },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub dx: f32,
    pub dy: f32,
    pub blur: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub fill: Fill,
    pub stroke: Option<Stroke>,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Color,
}

impl TextStyle {
    pub fn weight(&self) -> &'static str {
        if self.bold {
            "bold"
        } else {
            "normal"
        }
    }
}

/// An immediate-mode 2D canvas. Calls paint in order; later calls cover earlier ones.
pub trait Surface {
    /// Paints the whole canvas.
    fn fill(&mut self, color: Color);

    fn rounded_rect(&mut self, rect: Rect, radius: f32, style: &ShapeStyle);

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn circle(&mut self, center: Point, radius: f32, color: Color);

    /// Draws a single line of text centered horizontally and vertically on `center`.
    fn text(&mut self, text: &str, center: Point, style: &TextStyle);

    fn image(&mut self, rect: Rect, image: &BrandImage);

    /// Everything drawn until the matching [`Surface::pop_clip`] is transformed by
    /// `transform` and then clipped to `clip`, both in canvas coordinates.
    fn push_clip(&mut self, clip: Rect, transform: Transform);

    fn pop_clip(&mut self);
}

/// Formats a coordinate with at most two decimals.
pub(crate) fn num(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0 + 0.0;
    format!("{rounded}")
}

/// Formats a transform coefficient with at most four decimals.
pub(crate) fn coefficient(value: f32) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0 + 0.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_short() {
        assert_eq!(num(162.0), "162");
        assert_eq!(num(0.1 + 0.2), "0.3");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(12.345), "12.35");
    }

    #[test]
    fn colours_render_as_css() {
        assert_eq!(Color::rgb(0x48, 0x40, 0xBB).css(), "#4840BB");
        assert_eq!(Color::BLACK.with_opacity(30).css(), "rgba(0,0,0,0.3)");
    }

    #[test]
    fn halves_split_at_the_middle() {
        let rect = Rect::new(10.0, 20.0, 80.0, 120.0);
        assert_eq!(rect.upper_half(), Rect::new(10.0, 20.0, 80.0, 60.0));
        assert_eq!(rect.lower_half(), Rect::new(10.0, 80.0, 80.0, 60.0));
        assert_eq!(rect.center(), Point::new(50.0, 80.0));
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let area = Rect::new(0.0, 0.0, 400.0, 100.0);
        assert_eq!(area.fit(200.0, 100.0), Rect::new(100.0, 0.0, 200.0, 100.0));
    }
}
