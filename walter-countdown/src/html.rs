use askama::Template;
use itertools::Itertools;
use tiny_skia::Transform;

use crate::{
    brand::{BrandImage, BRAND_TEXT},
    error::Result,
    surface::{
        coefficient, num, Color, Fill, Point, Rect, ShapeStyle, Stroke, Surface, TextStyle,
        FONT_FAMILY,
    },
};

mod filters {
    pub fn num(value: &f32) -> ::askama::Result<String> {
        Ok(crate::surface::num(*value))
    }
}

/// An absolutely positioned box; `style` is appended after its placement.
struct BlockNode {
    rect: Rect,
    style: String,
}

/// Text centered on `x`, with `y` at the top of its line box.
struct TextNode {
    x: f32,
    y: f32,
    size: f32,
    weight: &'static str,
    color: String,
    content: String,
}

struct ImageNode {
    rect: Rect,
    src: String,
}

struct ClipNode {
    rect: Rect,
    transform: Option<String>,
}

/// Rects in every node are relative to the innermost open clip.
enum Node {
    Block(BlockNode),
    Text(TextNode),
    Image(ImageNode),
    Clip(ClipNode),
    End,
}

#[derive(Template)]
#[template(path = "countdown.html")]
struct CountdownHtmlTemplate {
    width: f32,
    height: f32,
    font_family: &'static str,
    alt: &'static str,
    nodes: Vec<Node>,
}

/// Builds an HTML fragment of absolutely positioned boxes styled with inline CSS.
pub struct HtmlSurface {
    width: f32,
    height: f32,
    nodes: Vec<Node>,
    /// Canvas position of each open clip box; children are placed relative to the last.
    origins: Vec<Point>,
}

impl HtmlSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            nodes: vec![],
            origins: vec![],
        }
    }

    pub fn finish(self) -> Result<String> {
        let html = CountdownHtmlTemplate {
            width: self.width,
            height: self.height,
            font_family: FONT_FAMILY,
            alt: BRAND_TEXT,
            nodes: self.nodes,
        }
        .render()?;
        Ok(html)
    }

    fn origin(&self) -> Point {
        self.origins.last().copied().unwrap_or(Point::new(0.0, 0.0))
    }

    fn local(&self, rect: Rect) -> Rect {
        let origin = self.origin();
        Rect::new(rect.x - origin.x, rect.y - origin.y, rect.width, rect.height)
    }

    fn block(&mut self, rect: Rect, styles: &[String]) {
        let rect = self.local(rect);
        self.nodes.push(Node::Block(BlockNode {
            rect,
            style: styles.join(";"),
        }));
    }
}

fn background(fill: &Fill) -> String {
    match fill {
        Fill::Solid(color) => format!("background:{}", color.css()),
        Fill::Vertical { top, bottom } => format!(
            "background:linear-gradient(180deg,{},{})",
            top.css(),
            bottom.css()
        ),
    }
}

fn css_matrix(t: &Transform) -> String {
    let m = [t.sx, t.ky, t.kx, t.sy]
        .into_iter()
        .map(coefficient)
        .chain([num(t.tx), num(t.ty)])
        .join(",");
    format!("matrix({m})")
}

impl Surface for HtmlSurface {
    fn fill(&mut self, color: Color) {
        let canvas = Rect::new(0.0, 0.0, self.width, self.height);
        self.block(canvas, &[background(&Fill::Solid(color))]);
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f32, style: &ShapeStyle) {
        let mut styles = vec![
            background(&style.fill),
            format!("border-radius:{}px", num(radius)),
        ];
        if let Some(stroke) = &style.stroke {
            styles.push(format!(
                "border:{}px solid {};box-sizing:border-box",
                num(stroke.width),
                stroke.color.css()
            ));
        }
        if let Some(shadow) = &style.shadow {
            styles.push(format!(
                "box-shadow:{}px {}px {}px {}",
                num(shadow.dx),
                num(shadow.dy),
                num(shadow.blur * 2.0),
                shadow.color.css()
            ));
        }
        self.block(rect, &styles);
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let length = dx.hypot(dy);
        let rect = Rect::new(from.x, from.y - stroke.width / 2.0, length, stroke.width);

        let mut styles = vec![
            format!("background:{}", stroke.color.css()),
            format!("border-radius:{}px", num(stroke.width / 2.0)),
        ];
        if dy != 0.0 {
            styles.push("transform-origin:0 50%".to_string());
            styles.push(format!("transform:rotate({}rad)", num(dy.atan2(dx))));
        }
        self.block(rect, &styles);
    }

    fn circle(&mut self, center: Point, radius: f32, color: Color) {
        let rect = Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        self.block(
            rect,
            &[
                format!("background:{}", color.css()),
                "border-radius:50%".to_string(),
            ],
        );
    }

    fn text(&mut self, text: &str, center: Point, style: &TextStyle) {
        let origin = self.origin();
        self.nodes.push(Node::Text(TextNode {
            x: center.x - origin.x,
            y: center.y - style.size / 2.0 - origin.y,
            size: style.size,
            weight: style.weight(),
            color: style.color.css(),
            content: text.to_string(),
        }));
    }

    fn image(&mut self, rect: Rect, image: &BrandImage) {
        let rect = self.local(rect);
        self.nodes.push(Node::Image(ImageNode {
            rect,
            src: image.data_url(),
        }));
    }

    fn push_clip(&mut self, clip: Rect, transform: Transform) {
        let origin = Point::new(clip.x, clip.y);
        let local = transform
            .pre_translate(origin.x, origin.y)
            .post_translate(-origin.x, -origin.y);
        let rect = self.local(clip);
        self.nodes.push(Node::Clip(ClipNode {
            rect,
            transform: (!local.is_identity()).then(|| css_matrix(&local)),
        }));
        self.origins.push(origin);
    }

    fn pop_clip(&mut self) {
        if self.origins.pop().is_none() {
            log::warn!("pop_clip without a matching push_clip");
            return;
        }
        self.nodes.push(Node::End);
    }
}
