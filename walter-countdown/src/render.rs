use tiny_skia::Transform;

use crate::{
    brand::{Brand, BRAND_TEXT},
    flip::{flap_transform, DigitRef, Flip},
    layout::{palette, PanelLayout},
    remaining::DigitGroup,
    surface::{Color, Fill, Point, Rect, Shadow, ShapeStyle, Stroke, Surface, TextStyle},
};

/// Paints the flip-clock picture onto any [`Surface`].
///
/// The output depends only on the layout, the brand, the digit strings and the flip
/// frame, so the same inputs always produce the same sequence of drawing calls.
pub struct FlipPanelRenderer<'a> {
    layout: &'a PanelLayout,
    brand: &'a Brand,
}

impl<'a> FlipPanelRenderer<'a> {
    pub fn new(layout: &'a PanelLayout, brand: &'a Brand) -> Self {
        Self { layout, brand }
    }

    pub fn draw<S: Surface>(&self, surface: &mut S, groups: &[DigitGroup], flip: Option<&Flip>) {
        let layout = self.layout;

        surface.fill(palette::BACKGROUND);
        surface.rounded_rect(
            layout.band(),
            layout.band_radius,
            &ShapeStyle {
                fill: Fill::Vertical {
                    top: palette::BAND_TOP,
                    bottom: palette::BAND_BOTTOM,
                },
                stroke: None,
                shadow: Some(shadow(layout.band_shadow)),
            },
        );

        let label_style = TextStyle {
            size: layout.label_size,
            bold: true,
            color: palette::LABEL,
        };

        for (index, (group, geometry)) in groups.iter().zip(layout.place(groups)).enumerate() {
            let cards = group.digits.chars().zip(&geometry.panels);
            for (digit, (character, panel)) in cards.enumerate() {
                let progress = flip
                    .filter(|flip| flip.is_flipping(DigitRef { group: index, digit }))
                    .map(|flip| flip.progress);
                self.card(surface, *panel, character, progress);
            }
            surface.text(group.label(), geometry.label, &label_style);
        }

        self.brand(surface);
    }

    fn card<S: Surface>(
        &self,
        surface: &mut S,
        panel: Rect,
        character: char,
        progress: Option<f32>,
    ) {
        let layout = self.layout;
        let hinge = panel.center();
        let digit = character.to_string();
        let edge = Some(Stroke {
            color: palette::PANEL_EDGE,
            width: layout.edge_width,
        });
        let digit_style = TextStyle {
            size: layout.digit_size,
            bold: true,
            color: palette::DIGIT,
        };

        // the base carries the shadow and shows behind a turning flap
        surface.rounded_rect(
            panel,
            layout.panel_radius,
            &ShapeStyle {
                fill: Fill::Solid(palette::PANEL_BOTTOM),
                stroke: edge,
                shadow: Some(shadow(layout.card_shadow)),
            },
        );

        surface.push_clip(panel.lower_half(), Transform::identity());
        surface.rounded_rect(
            panel,
            layout.panel_radius,
            &ShapeStyle {
                fill: Fill::Vertical {
                    top: palette::PANEL_BOTTOM,
                    bottom: palette::PANEL_LOWER_BOTTOM,
                },
                stroke: edge,
                shadow: None,
            },
        );
        surface.text(&digit, hinge, &digit_style);
        surface.pop_clip();

        let flap = progress
            .map(|progress| flap_transform(progress, hinge.x, hinge.y))
            .unwrap_or_default();
        surface.push_clip(panel.upper_half(), flap);
        surface.rounded_rect(
            panel,
            layout.panel_radius,
            &ShapeStyle {
                fill: Fill::Vertical {
                    top: palette::PANEL_TOP,
                    bottom: palette::PANEL_BOTTOM,
                },
                stroke: edge,
                shadow: None,
            },
        );
        surface.text(&digit, hinge, &digit_style);
        surface.pop_clip();

        let hinge_stroke = Stroke {
            color: palette::HINGE,
            width: layout.hinge_width,
        };
        surface.line(
            Point::new(panel.x + layout.hinge_inset, hinge.y),
            Point::new(panel.right() - layout.hinge_inset, hinge.y),
            &hinge_stroke,
        );
        for x in [panel.x + layout.pin_offset, panel.right() - layout.pin_offset] {
            surface.circle(Point::new(x, hinge.y), layout.pin_radius, palette::HINGE);
        }
    }

    fn brand<S: Surface>(&self, surface: &mut S) {
        match self.brand {
            Brand::Image(image) => {
                let rect = self
                    .layout
                    .brand_box()
                    .fit(image.width() as f32, image.height() as f32);
                surface.image(rect, image);
            }
            Brand::Text => surface.text(
                BRAND_TEXT,
                self.layout.brand_center(),
                &TextStyle {
                    size: self.layout.brand_size,
                    bold: true,
                    color: palette::BRAND,
                },
            ),
        }
    }
}

fn shadow((dx, dy, blur): (f32, f32, f32)) -> Shadow {
    Shadow {
        dx,
        dy,
        blur,
        color: palette::SHADOW,
    }
}
