use std::collections::HashMap;

use askama::Template;
use tiny_skia::Transform;

use crate::{
    brand::BrandImage,
    error::Result,
    surface::{
        coefficient, num, Color, Fill, Point, Rect, Shadow, ShapeStyle, Stroke, Surface,
        TextStyle, FONT_FAMILY,
    },
};

/// Distance from the vertical center of a line of text to its baseline, in ems.
pub(crate) const BASELINE_SHIFT: f32 = 0.35;

mod filters {
    pub fn num(value: &f32) -> ::askama::Result<String> {
        Ok(crate::surface::num(*value))
    }
}

/// A colour or gradient reference, as used by `fill`, `stroke` and `stop-color`.
struct Paint {
    value: String,
    opacity: f32,
}

impl Paint {
    fn solid(color: &Color) -> Self {
        Self {
            value: color.hex(),
            opacity: color.alpha(),
        }
    }

    fn gradient(id: &str) -> Self {
        Self {
            value: format!("url(#{id})"),
            opacity: 1.0,
        }
    }
}

struct StrokePaint {
    paint: Paint,
    width: f32,
}

impl From<&Stroke> for StrokePaint {
    fn from(stroke: &Stroke) -> Self {
        Self {
            paint: Paint::solid(&stroke.color),
            width: stroke.width,
        }
    }
}

struct GradientDef {
    id: String,
    top: Paint,
    bottom: Paint,
}

struct ShadowDef {
    id: String,
    dx: f32,
    dy: f32,
    blur: f32,
    flood: Paint,
}

struct ClipDef {
    id: String,
    rect: Rect,
}

enum Def {
    Gradient(GradientDef),
    Shadow(ShadowDef),
    Clip(ClipDef),
}

struct RectNode {
    rect: Rect,
    radius: f32,
    fill: Paint,
    stroke: Option<StrokePaint>,
    filter: Option<String>,
}

struct LineNode {
    from: Point,
    to: Point,
    stroke: StrokePaint,
}

struct CircleNode {
    center: Point,
    radius: f32,
    fill: Paint,
}

struct TextNode {
    x: f32,
    y: f32,
    size: f32,
    weight: &'static str,
    fill: Paint,
    content: String,
}

struct ImageNode {
    rect: Rect,
    href: String,
}

enum Node {
    Rect(RectNode),
    Line(LineNode),
    Circle(CircleNode),
    Text(TextNode),
    Image(ImageNode),
    /// Opens a `<g>` clipped to the clip path with this id.
    Clip(String),
    /// Opens a `<g>` with this `transform` value.
    Transform(String),
    End,
}

#[derive(Template)]
#[template(path = "countdown.svg")]
struct CountdownSvgTemplate {
    width: f32,
    height: f32,
    font_family: &'static str,
    defs: Vec<Def>,
    nodes: Vec<Node>,
}

/// Builds an SVG document. Gradients, filters and clip paths go into `<defs>` with ids
/// numbered in order of first use, so equal drawing calls give equal documents.
pub struct SvgSurface {
    width: f32,
    height: f32,
    defs: Vec<Def>,
    ids: HashMap<String, String>,
    nodes: Vec<Node>,
    groups: Vec<usize>,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            defs: vec![],
            ids: HashMap::new(),
            nodes: vec![],
            groups: vec![],
        }
    }

    pub fn finish(self) -> Result<String> {
        let svg = CountdownSvgTemplate {
            width: self.width,
            height: self.height,
            font_family: FONT_FAMILY,
            defs: self.defs,
            nodes: self.nodes,
        }
        .render()?;
        Ok(svg)
    }

    /// Returns the id of the def registered under `key`, adding it on first use.
    fn define(&mut self, prefix: &str, key: String, build: impl FnOnce(String) -> Def) -> String {
        if let Some(id) = self.ids.get(&key) {
            return id.clone();
        }
        let id = format!("{prefix}{}", self.defs.len() + 1);
        self.defs.push(build(id.clone()));
        self.ids.insert(key, id.clone());
        id
    }

    fn paint(&mut self, fill: &Fill) -> Paint {
        match fill {
            Fill::Solid(color) => Paint::solid(color),
            Fill::Vertical { top, bottom } => {
                let key = format!("gradient {} {}", top.css(), bottom.css());
                let id = self.define("grad", key, |id| {
                    Def::Gradient(GradientDef {
                        id,
                        top: Paint::solid(top),
                        bottom: Paint::solid(bottom),
                    })
                });
                Paint::gradient(&id)
            }
        }
    }

    fn shadow(&mut self, shadow: &Shadow) -> String {
        let key = format!(
            "shadow {} {} {} {}",
            num(shadow.dx),
            num(shadow.dy),
            num(shadow.blur),
            shadow.color.css()
        );
        self.define("shadow", key, |id| {
            Def::Shadow(ShadowDef {
                id,
                dx: shadow.dx,
                dy: shadow.dy,
                blur: shadow.blur,
                flood: Paint::solid(&shadow.color),
            })
        })
    }
}

fn matrix(t: &Transform) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        coefficient(t.sx),
        coefficient(t.ky),
        coefficient(t.kx),
        coefficient(t.sy),
        num(t.tx),
        num(t.ty)
    )
}

impl Surface for SvgSurface {
    fn fill(&mut self, color: Color) {
        self.nodes.push(Node::Rect(RectNode {
            rect: Rect::new(0.0, 0.0, self.width, self.height),
            radius: 0.0,
            fill: Paint::solid(&color),
            stroke: None,
            filter: None,
        }));
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f32, style: &ShapeStyle) {
        let fill = self.paint(&style.fill);
        let filter = style.shadow.as_ref().map(|shadow| self.shadow(shadow));
        self.nodes.push(Node::Rect(RectNode {
            rect,
            radius,
            fill,
            stroke: style.stroke.as_ref().map(StrokePaint::from),
            filter,
        }));
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.nodes.push(Node::Line(LineNode {
            from,
            to,
            stroke: stroke.into(),
        }));
    }

    fn circle(&mut self, center: Point, radius: f32, color: Color) {
        self.nodes.push(Node::Circle(CircleNode {
            center,
            radius,
            fill: Paint::solid(&color),
        }));
    }

    fn text(&mut self, text: &str, center: Point, style: &TextStyle) {
        self.nodes.push(Node::Text(TextNode {
            x: center.x,
            y: center.y + style.size * BASELINE_SHIFT,
            size: style.size,
            weight: style.weight(),
            fill: Paint::solid(&style.color),
            content: text.to_string(),
        }));
    }

    fn image(&mut self, rect: Rect, image: &BrandImage) {
        self.nodes.push(Node::Image(ImageNode {
            rect,
            href: image.data_url(),
        }));
    }

    fn push_clip(&mut self, clip: Rect, transform: Transform) {
        let key = format!(
            "clip {} {} {} {}",
            num(clip.x),
            num(clip.y),
            num(clip.width),
            num(clip.height)
        );
        let id = self.define("clip", key, |id| Def::Clip(ClipDef { id, rect: clip }));

        self.nodes.push(Node::Clip(id));
        let mut opened = 1;
        if !transform.is_identity() {
            self.nodes.push(Node::Transform(matrix(&transform)));
            opened += 1;
        }
        self.groups.push(opened);
    }

    fn pop_clip(&mut self) {
        let Some(opened) = self.groups.pop() else {
            log::warn!("pop_clip without a matching push_clip");
            return;
        };
        for _ in 0..opened {
            self.nodes.push(Node::End);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(fill: Fill) -> ShapeStyle {
        ShapeStyle {
            fill,
            stroke: None,
            shadow: None,
        }
    }

    #[test]
    fn empty_document_has_size() {
        let svg = SvgSurface::new(1200.0, 600.0).finish().unwrap();
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"width="1200" height="600" viewBox="0 0 1200 600""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn gradients_are_shared() {
        let fill = Fill::Vertical {
            top: Color::WHITE,
            bottom: Color::BLACK,
        };
        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.rounded_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0, &style(fill));
        surface.rounded_rect(Rect::new(20.0, 0.0, 10.0, 10.0), 2.0, &style(fill));
        let svg = surface.finish().unwrap();

        assert_eq!(svg.matches("<linearGradient").count(), 1);
        assert_eq!(svg.matches(r#"fill="url(#grad1)""#).count(), 2);
    }

    #[test]
    fn text_is_escaped_and_centered() {
        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.text(
            "A&B",
            Point::new(50.0, 40.0),
            &TextStyle {
                size: 20.0,
                bold: true,
                color: Color::WHITE,
            },
        );
        let svg = surface.finish().unwrap();

        assert!(svg.contains(">A&amp;B</text>"));
        assert!(!svg.contains("A&B"));
        assert!(svg.contains(r#"x="50" y="47" text-anchor="middle""#));
        assert!(svg.contains(r#"font-weight="bold""#));
    }

    #[test]
    fn clip_groups_nest_and_close() {
        let mut surface = SvgSurface::new(100.0, 100.0);
        let clip = Rect::new(0.0, 0.0, 50.0, 50.0);
        surface.push_clip(clip, Transform::identity());
        surface.circle(Point::new(10.0, 10.0), 2.0, Color::BLACK);
        surface.pop_clip();
        surface.push_clip(clip, Transform::from_scale(1.0, 0.5));
        surface.circle(Point::new(10.0, 10.0), 2.0, Color::BLACK);
        surface.pop_clip();
        let svg = surface.finish().unwrap();

        assert_eq!(svg.matches("<clipPath").count(), 1);
        assert_eq!(svg.matches("<g ").count(), 3);
        assert_eq!(svg.matches("</g>").count(), 3);
        assert!(svg.contains(r#"transform="matrix(1 0 0 0.5 0 0)""#));
    }

    #[test]
    fn stroke_and_shadow_are_optional_attributes() {
        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.rounded_rect(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            2.0,
            &ShapeStyle {
                fill: Fill::Solid(Color::WHITE),
                stroke: Some(Stroke {
                    color: Color::BLACK,
                    width: 1.5,
                }),
                shadow: None,
            },
        );
        surface.rounded_rect(
            Rect::new(20.0, 0.0, 10.0, 10.0),
            2.0,
            &style(Fill::Solid(Color::WHITE)),
        );
        let svg = surface.finish().unwrap();

        assert!(svg.contains(
            r##"fill="#FFFFFF" fill-opacity="1" stroke="#000000" stroke-opacity="1" stroke-width="1.5"/>"##
        ));
        assert!(svg.contains(r##"x="20" y="0" width="10" height="10" rx="2" fill="#FFFFFF" fill-opacity="1"/>"##));
        assert!(!svg.contains("filter="));
    }

    #[test]
    fn brand_image_is_linked_as_data_url() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(4, 1)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let image = BrandImage::from_bytes(png.into_inner()).unwrap();

        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.image(Rect::new(10.0, 20.0, 40.0, 10.0), &image);
        let svg = surface.finish().unwrap();

        assert!(svg.contains(&format!(r#"xlink:href="{}""#, image.data_url())));
    }

    #[test]
    fn translucent_shadow_uses_flood_opacity() {
        let mut surface = SvgSurface::new(100.0, 100.0);
        surface.rounded_rect(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            2.0,
            &ShapeStyle {
                fill: Fill::Solid(Color::WHITE),
                stroke: None,
                shadow: Some(Shadow {
                    dx: 2.0,
                    dy: 4.0,
                    blur: 4.0,
                    color: Color::BLACK.with_opacity(30),
                }),
            },
        );
        let svg = surface.finish().unwrap();

        assert!(svg.contains(r##"flood-color="#000000" flood-opacity="0.3""##));
        assert!(svg.contains(r#"filter="url(#shadow1)""#));
    }
}
