//! Raw scalar to display intensity.

use crate::sampler::Sample;

/// Linear calibration from stored values to physical units (e.g. HU).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub slope: f32,
    pub intercept: f32,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

impl Rescale {
    #[inline]
    pub fn apply(&self, raw: f32) -> f32 {
        raw.mul_add(self.slope, self.intercept)
    }
}

/// Window centre and width in physical units. The width never drops below 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    center: f32,
    width: f32,
}

impl Window {
    pub const MIN_WIDTH: f32 = 1.0;

    pub fn new(center: f32, width: f32) -> Self {
        Self {
            center,
            width: Self::clamp_width(width),
        }
    }

    fn clamp_width(width: f32) -> f32 {
        if width.is_nan() {
            Self::MIN_WIDTH
        } else {
            width.max(Self::MIN_WIDTH)
        }
    }

    pub fn center(&self) -> f32 {
        self.center
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn set_center(&mut self, center: f32) {
        self.center = center;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = Self::clamp_width(width);
    }

    pub fn lower(&self) -> f32 {
        self.center - self.width / 2.0
    }

    /// Map a physical value into `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        ((value - self.lower()) / self.width).clamp(0.0, 1.0)
    }
}

/// Display intensity of a sample.
///
/// Samples outside the volume are solid black and skip windowing entirely.
#[inline]
pub fn to_display(sample: Sample, rescale: Rescale, window: Window) -> f32 {
    match sample {
        Sample::Outside => 0.0,
        Sample::Value(raw) => window.normalize(rescale.apply(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn applies_rescale_then_window() {
        let rescale = Rescale {
            slope: 2.0,
            intercept: -1024.0,
        };
        let window = Window::new(40.0, 400.0);
        // hu = 600 * 2 - 1024 = 176, lower = -160
        let value = to_display(Sample::Value(600.0), rescale, window);
        assert_relative_eq!(value, (176.0 + 160.0) / 400.0);
    }

    #[test]
    fn clamps_outside_window() {
        let window = Window::new(0.0, 100.0);
        assert_eq!(to_display(Sample::Value(-500.0), Rescale::default(), window), 0.0);
        assert_eq!(to_display(Sample::Value(500.0), Rescale::default(), window), 1.0);
    }

    #[test]
    fn outside_sample_is_black_regardless_of_window() {
        // An inverted window would map very low values to white if it were
        // applied; the outside sentinel must not go through it.
        let window = Window::new(-1.0e6, 1.0);
        assert_eq!(to_display(Sample::Outside, Rescale::default(), window), 0.0);
    }

    #[test]
    fn width_below_one_is_clamped() {
        let mut window = Window::new(10.0, 0.25);
        assert_eq!(window.width(), 1.0);
        window.set_width(-40.0);
        assert_eq!(window.width(), 1.0);
        window.set_width(30.0);
        assert_eq!(window.width(), 30.0);
    }

    #[test]
    fn monotonic_inside_full_range_window() {
        let (lo, hi) = (-1000.0_f32, 3000.0_f32);
        let window = Window::new((lo + hi) / 2.0, hi - lo);
        let mut previous = -1.0;
        for step in 1..400 {
            let hu = lo + (hi - lo) * step as f32 / 400.0;
            let value = to_display(Sample::Value(hu), Rescale::default(), window);
            assert!((0.0..=1.0).contains(&value));
            assert!(value >= previous);
            previous = value;
        }
    }
}
