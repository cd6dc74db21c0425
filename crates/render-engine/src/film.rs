//! Preview film look and the "developing" animation.
//!
//! None of this touches exported prints; the compositor draws the photo
//! untoned.

use std::time::Duration;

use image::{Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

use crate::compositor::PHOTO_PLACEHOLDER;

const CONTRAST: f32 = 1.1;
const SATURATION: f32 = 1.1;
const SEPIA: f32 = 0.1;

/// Blur at the start of developing, as a fraction of the image width.
const DEVELOP_BLUR: f32 = 12.0 / 288.0;

/// How long a fresh preview stays fully dark.
pub const DEVELOP_HOLD: Duration = Duration::from_millis(2_500);
/// Length of the fade from dark to developed.
pub const DEVELOP_TRANSITION: Duration = Duration::from_millis(3_000);

/// Maps time since a preview appeared to developing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevelopingClock {
    hold: Duration,
    transition: Duration,
}

impl DevelopingClock {
    pub fn new(hold: Duration, transition: Duration) -> Self {
        Self { hold, transition }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if elapsed <= self.hold {
            return 0.0;
        }
        if self.transition.is_zero() {
            return 1.0;
        }
        ((elapsed - self.hold).as_secs_f32() / self.transition.as_secs_f32()).min(1.0)
    }

    pub fn total(&self) -> Duration {
        self.hold + self.transition
    }
}

impl Default for DevelopingClock {
    fn default() -> Self {
        Self::new(DEVELOP_HOLD, DEVELOP_TRANSITION)
    }
}

/// `cubic-bezier(0.4, 0, 0.2, 1)`.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let (x1, y1, x2, y2) = (0.4f32, 0.0f32, 0.2f32, 1.0f32);
    let bezier = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    };

    // Solve x(s) = t by bisection; x is monotonic for these control points.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if bezier(x1, x2, mid) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier(y1, y2, (lo + hi) / 2.0)
}

/// Contrast, then saturation, then a touch of sepia.
pub fn film_tone(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = channels(px);

        let contrast = |c: f32| (c - 0.5) * CONTRAST + 0.5;
        let (r, g, b) = (contrast(r), contrast(g), contrast(b));

        let s = SATURATION;
        let (r, g, b) = (
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        );
        let (r, g, b) = (r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0));

        let k = 1.0 - SEPIA;
        let sepia = [
            (0.393 + 0.607 * k) * r + (0.769 - 0.769 * k) * g + (0.189 - 0.189 * k) * b,
            (0.349 - 0.349 * k) * r + (0.686 + 0.314 * k) * g + (0.168 - 0.168 * k) * b,
            (0.272 - 0.272 * k) * r + (0.534 - 0.534 * k) * g + (0.131 + 0.869 * k) * b,
        ];
        set_channels(px, sepia);
    }
    out
}

/// One frame of the developing animation at linear `progress`.
///
/// At 0 the photo is hidden under an opaque `#1a1a1a` sheet; underneath it
/// is blurred and gray. By 1 it is the plain toned photo.
pub fn develop_frame(image: &RgbaImage, progress: f32) -> RgbaImage {
    let eased = ease_in_out(progress);
    let remaining = 1.0 - eased;

    let toned = film_tone(image);
    let sigma = DEVELOP_BLUR * image.width() as f32 * remaining;
    let mut frame = if sigma >= 0.5 {
        gaussian_blur_f32(&toned, sigma)
    } else {
        toned
    };

    let sheet = channels(&PHOTO_PLACEHOLDER);
    for px in frame.pixels_mut() {
        let [r, g, b] = channels(px);
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let gray = |c: f32| c + (luma - c) * remaining;
        let covered = [
            gray(r) * eased + sheet[0] * remaining,
            gray(g) * eased + sheet[1] * remaining,
            gray(b) * eased + sheet[2] * remaining,
        ];
        set_channels(px, covered);
    }
    frame
}

fn channels(px: &Rgba<u8>) -> [f32; 3] {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
    ]
}

fn set_channels(px: &mut Rgba<u8>, rgb: [f32; 3]) {
    for (slot, value) in px.0.iter_mut().zip(rgb) {
        *slot = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(color: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(32, 32, Rgba([color[0], color[1], color[2], 255]))
    }

    #[test]
    fn clock_holds_then_fades() {
        let clock = DevelopingClock::default();
        assert_eq!(clock.progress(Duration::ZERO), 0.0);
        assert_eq!(clock.progress(Duration::from_millis(2_500)), 0.0);
        assert!((clock.progress(Duration::from_millis(4_000)) - 0.5).abs() < 1e-6);
        assert_eq!(clock.progress(Duration::from_secs(60)), 1.0);
        assert!(clock.progress(Duration::from_millis(5_499)) < 1.0);
        assert_eq!(clock.progress(clock.total()), 1.0);
    }

    #[test]
    fn easing_is_monotonic_with_fixed_ends() {
        assert!(ease_in_out(0.0).abs() < 1e-4);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-4);
        let mut last = 0.0;
        for i in 1..=20 {
            let v = ease_in_out(i as f32 / 20.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn tone_warms_and_stretches() {
        let toned = film_tone(&patch([128, 128, 128]));
        let px = toned.get_pixel(0, 0);
        // Sepia pushes red above blue on neutral gray.
        assert!(px[0] > px[2]);

        let dark = film_tone(&patch([40, 40, 40])).get_pixel(0, 0)[1];
        assert!(dark < 40);
    }

    #[test]
    fn tone_keeps_alpha() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([100, 150, 200, 77]));
        assert_eq!(film_tone(&img).get_pixel(1, 1)[3], 77);
    }

    #[test]
    fn undeveloped_frame_is_the_dark_sheet() {
        let frame = develop_frame(&patch([250, 20, 20]), 0.0);
        let px = frame.get_pixel(16, 16);
        assert_eq!(&px.0[..3], &PHOTO_PLACEHOLDER.0[..3]);
    }

    #[test]
    fn developed_frame_is_the_toned_photo() {
        let src = patch([250, 20, 20]);
        let frame = develop_frame(&src, 1.0);
        let toned = film_tone(&src);
        let (a, b) = (frame.get_pixel(16, 16), toned.get_pixel(16, 16));
        for c in 0..3 {
            assert!((a[c] as i32 - b[c] as i32).abs() <= 1);
        }
    }

    #[test]
    fn midway_frame_is_muted() {
        let frame = develop_frame(&patch([250, 20, 20]), 0.6);
        let px = frame.get_pixel(16, 16);
        assert!(px[0] > PHOTO_PLACEHOLDER[0]);
        assert!(px[0] < 240);
    }
}
