use itertools::Itertools;

use crate::{
    remaining::DigitGroup,
    surface::{Point, Rect},
};

/// Width of the canvas all geometry ratios are taken from.
pub const REFERENCE_WIDTH: f32 = 1200.0;

/// Share of the canvas height covered by the timer band.
const BAND_RATIO: f32 = 0.17;

pub mod palette {
    use crate::surface::Color;

    pub const BACKGROUND: Color = Color::rgb(0x48, 0x40, 0xBB);
    pub const BAND_TOP: Color = Color::rgb(0x52, 0x4A, 0xC6);
    pub const BAND_BOTTOM: Color = Color::rgb(0x48, 0x40, 0xBB);
    pub const PANEL_TOP: Color = Color::rgb(0xF8, 0xF8, 0xF0);
    pub const PANEL_BOTTOM: Color = Color::rgb(0xF0, 0xF0, 0xE8);
    pub const PANEL_LOWER_BOTTOM: Color = Color::rgb(0xE8, 0xE8, 0xE0);
    pub const PANEL_EDGE: Color = Color::rgb(0xC8, 0xC8, 0xC0);
    pub const DIGIT: Color = Color::rgb(0x48, 0x40, 0xBB);
    pub const HINGE: Color = Color::BLACK;
    pub const LABEL: Color = Color::WHITE;
    pub const BRAND: Color = Color::WHITE;
    pub const SHADOW: Color = Color::BLACK.with_opacity(30);
}

/// Geometry of the flip-clock picture. Everything scales with the canvas width, the
/// content block is centered vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub width: f32,
    pub height: f32,
    pub band_height: f32,
    pub band_radius: f32,
    pub panel_width: f32,
    pub panel_height: f32,
    pub panel_radius: f32,
    pub digit_gap: f32,
    pub group_gap: f32,
    pub hinge_inset: f32,
    pub hinge_width: f32,
    pub pin_offset: f32,
    pub pin_radius: f32,
    pub digit_size: f32,
    pub label_size: f32,
    pub label_gap: f32,
    pub brand_size: f32,
    pub brand_gap: f32,
    pub brand_box_width: f32,
    pub brand_box_height: f32,
    pub edge_width: f32,
    pub band_shadow: (f32, f32, f32),
    pub card_shadow: (f32, f32, f32),
}

impl PanelLayout {
    pub fn new(width: f32, height: f32) -> Self {
        let s = width / REFERENCE_WIDTH;

        Self {
            width,
            height,
            band_height: height * BAND_RATIO,
            band_radius: 20.0 * s,
            panel_width: 120.0 * s,
            panel_height: 180.0 * s,
            panel_radius: 18.0 * s,
            digit_gap: 12.0 * s,
            group_gap: 60.0 * s,
            hinge_inset: 12.0 * s,
            hinge_width: 4.5 * s,
            pin_offset: 24.0 * s,
            pin_radius: 6.0 * s,
            digit_size: 72.0 * s,
            label_size: 36.0 * s,
            label_gap: 24.0 * s,
            brand_size: 72.0 * s,
            brand_gap: 60.0 * s,
            brand_box_width: 400.0 * s,
            brand_box_height: 100.0 * s,
            edge_width: 1.5 * s,
            band_shadow: (4.0 * s, 6.0 * s, 8.0 * s),
            card_shadow: (2.0 * s, 4.0 * s, 4.0 * s),
        }
    }

    pub fn band(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.band_height)
    }

    fn content_height(&self) -> f32 {
        self.panel_height + self.label_gap + self.label_size + self.brand_gap + self.brand_size
    }

    pub fn panel_top(&self) -> f32 {
        (self.height - self.content_height()) / 2.0
    }

    pub fn label_center_y(&self) -> f32 {
        self.panel_top() + self.panel_height + self.label_gap + self.label_size / 2.0
    }

    pub fn brand_center(&self) -> Point {
        let y = self.label_center_y() + self.label_size / 2.0 + self.brand_gap
            + self.brand_size / 2.0;
        Point::new(self.width / 2.0, y)
    }

    /// Box the brand image is fitted into, centered where the brand text would be.
    pub fn brand_box(&self) -> Rect {
        let center = self.brand_center();
        Rect::new(
            center.x - self.brand_box_width / 2.0,
            center.y - self.brand_box_height / 2.0,
            self.brand_box_width,
            self.brand_box_height,
        )
    }

    fn group_width(&self, digits: usize) -> f32 {
        let n = digits as f32;
        n * self.panel_width + (n - 1.0).max(0.0) * self.digit_gap
    }

    /// Places one panel per digit character, groups left to right, centered on the canvas.
    pub fn place(&self, groups: &[DigitGroup]) -> Vec<GroupGeometry> {
        let widths = groups
            .iter()
            .map(|group| self.group_width(group.digits.chars().count()))
            .collect_vec();
        let total: f32 =
            widths.iter().sum::<f32>() + (groups.len() as f32 - 1.0).max(0.0) * self.group_gap;

        let top = self.panel_top();
        let mut x = (self.width - total) / 2.0;

        widths
            .into_iter()
            .zip(groups)
            .map(|(width, group)| {
                let panels = (0..group.digits.chars().count())
                    .map(|i| {
                        Rect::new(
                            x + i as f32 * (self.panel_width + self.digit_gap),
                            top,
                            self.panel_width,
                            self.panel_height,
                        )
                    })
                    .collect_vec();
                let label = Point::new(x + width / 2.0, self.label_center_y());
                x += width + self.group_gap;
                GroupGeometry { panels, label }
            })
            .collect_vec()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupGeometry {
    pub panels: Vec<Rect>,
    pub label: Point,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remaining::RemainingDuration;

    #[test]
    fn reference_canvas_geometry() {
        let layout = PanelLayout::new(1200.0, 600.0);
        let placed = layout.place(&RemainingDuration::ZERO.digit_groups());

        assert!((layout.band().height - 102.0).abs() < 0.001);
        assert_eq!(layout.panel_top(), 114.0);
        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].panels[0], Rect::new(162.0, 114.0, 120.0, 180.0));
        assert_eq!(placed[0].panels[1].x, 294.0);
        assert_eq!(placed[1].panels[0].x, 474.0);
        assert_eq!(placed[2].panels[1].right(), 1038.0);
        assert_eq!(placed[1].label, Point::new(600.0, 336.0));
        assert_eq!(layout.brand_center(), Point::new(600.0, 450.0));
    }

    #[test]
    fn geometry_scales_with_width() {
        let small = PanelLayout::new(600.0, 300.0);
        let large = PanelLayout::new(1200.0, 600.0);

        assert_eq!(small.panel_width * 2.0, large.panel_width);
        assert_eq!(small.digit_size * 2.0, large.digit_size);
        assert_eq!(small.band_height * 2.0, large.band_height);
    }

    #[test]
    fn groups_are_centered() {
        let layout = PanelLayout::new(2000.0, 1000.0);
        let placed = layout.place(&RemainingDuration::ZERO.digit_groups());

        let left = placed[0].panels[0].x;
        let right = placed[2].panels[1].right();
        assert!((left - (2000.0 - right)).abs() < 0.01);
    }

    #[test]
    fn three_digit_days_get_a_third_panel() {
        let layout = PanelLayout::new(1200.0, 600.0);
        let remaining = RemainingDuration {
            days: 123,
            hours: 4,
            minutes: 5,
        };
        let placed = layout.place(&remaining.digit_groups());

        assert_eq!(placed[0].panels.len(), 3);
        assert_eq!(placed[1].panels.len(), 2);
        let right = placed[2].panels[1].right();
        assert!((placed[0].panels[0].x - (1200.0 - right)).abs() < 0.01);
    }
}
