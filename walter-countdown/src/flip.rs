use std::f32::consts::PI;

use tiny_skia::Transform;

use crate::remaining::{DigitGroup, RemainingDuration};

/// Frames in one flap rotation.
pub const FLIP_FRAMES: usize = 12;

/// Horizontal skew of the flap at the steepest point of its rotation.
const MAX_SKEW: f32 = 0.12;

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Addresses one digit: group index (days, hours, minutes) and character index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitRef {
    pub group: usize,
    pub digit: usize,
}

/// One frame of the flap animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Flip {
    pub progress: f32,
    pub digits: Vec<DigitRef>,
}

impl Flip {
    /// The frame at `progress` for the digits that change when the next minute ticks over.
    pub fn at(remaining: &RemainingDuration, progress: f32) -> Self {
        let now = remaining.digit_groups();
        let next = remaining.next_minute().digit_groups();
        Self {
            progress,
            digits: changing_digits(&now, &next),
        }
    }

    pub fn is_flipping(&self, digit: DigitRef) -> bool {
        self.digits.contains(&digit)
    }

    /// Whether this frame differs from the static picture at all.
    pub fn is_moving(&self) -> bool {
        !flap_transform(self.progress, 0.0, 0.0).is_identity() && !self.digits.is_empty()
    }
}

fn changing_digits(now: &[DigitGroup], next: &[DigitGroup]) -> Vec<DigitRef> {
    now.iter()
        .zip(next)
        .enumerate()
        .flat_map(|(group, (a, b))| {
            let width = a.digits.len();
            // a shorter next value is left-padded, compare right aligned
            let b = format!("{:0>width$}", b.digits);
            a.digits
                .chars()
                .zip(b.chars())
                .enumerate()
                .filter(|(_, (x, y))| x != y)
                .map(move |(digit, _)| DigitRef { group, digit })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Transform applied to the upper half of a card while its flap turns over the hinge at
/// `(hinge_x, hinge_y)`. The flap folds toward the hinge and leans sideways, and is flat
/// again at both ends of the animation.
pub fn flap_transform(progress: f32, hinge_x: f32, hinge_y: f32) -> Transform {
    if progress <= 0.0 || progress >= 1.0 {
        return Transform::identity();
    }

    let angle = PI * ease_in_out_cubic(progress);
    let fold = angle.cos().abs();
    let skew = MAX_SKEW * angle.sin();

    Transform::from_translate(hinge_x, hinge_y)
        .pre_concat(Transform::from_skew(skew, 0.0))
        .pre_scale(1.0, fold)
        .pre_translate(-hinge_x, -hinge_y)
}

/// Progress values for the frames of one rotation, from 0 to 1 inclusive.
pub fn frame_progress(frames: usize) -> Vec<f32> {
    match frames {
        0 => vec![],
        1 => vec![0.0],
        n => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < 1e-6);
        assert!((ease_in_out_cubic(0.75) - 0.9375).abs() < 1e-6);
    }

    #[test]
    fn easing_is_monotonic() {
        let values: Vec<_> = frame_progress(50).into_iter().map(ease_in_out_cubic).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn flap_is_flat_at_both_ends() {
        assert!(flap_transform(0.0, 50.0, 80.0).is_identity());
        assert!(flap_transform(1.0, 50.0, 80.0).is_identity());
        assert!(!flap_transform(0.3, 50.0, 80.0).is_identity());
    }

    #[test]
    fn flap_keeps_the_hinge_fixed() {
        let t = flap_transform(0.4, 50.0, 80.0);
        let mut points = [tiny_skia::Point::from_xy(50.0, 80.0)];
        t.map_points(&mut points);
        assert!((points[0].x - 50.0).abs() < 1e-4);
        assert!((points[0].y - 80.0).abs() < 1e-4);
    }

    #[test]
    fn flap_is_edge_on_halfway() {
        let t = flap_transform(0.5, 0.0, 100.0);
        let mut points = [tiny_skia::Point::from_xy(0.0, 0.0)];
        t.map_points(&mut points);
        assert!((points[0].y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn frames_cover_the_whole_rotation() {
        let frames = frame_progress(FLIP_FRAMES);
        assert_eq!(frames.len(), FLIP_FRAMES);
        assert_eq!(frames[0], 0.0);
        assert_eq!(frames[FLIP_FRAMES - 1], 1.0);
    }

    #[test]
    fn only_changing_digits_flip() {
        let remaining = RemainingDuration {
            days: 1,
            hours: 12,
            minutes: 5,
        };
        assert_eq!(
            Flip::at(&remaining, 0.5).digits,
            [DigitRef { group: 2, digit: 1 }]
        );

        let remaining = RemainingDuration {
            days: 1,
            hours: 10,
            minutes: 0,
        };
        assert_eq!(
            Flip::at(&remaining, 0.5).digits,
            [
                DigitRef { group: 1, digit: 0 },
                DigitRef { group: 1, digit: 1 },
                DigitRef { group: 2, digit: 0 },
                DigitRef { group: 2, digit: 1 },
            ]
        );
    }

    #[test]
    fn nothing_flips_once_the_countdown_is_over() {
        let flip = Flip::at(&RemainingDuration::ZERO, 0.5);
        assert!(flip.digits.is_empty());
        assert!(!flip.is_moving());
    }
}
