use std::time::Duration;

use crate::enums::Processor;

/// Tunables for the three linked views.
///
/// Sizes without a unit are in plane world units, where the larger side of
/// an unrotated plane is at most 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Upper bound on draws per second for each view.
    pub fps: u32,
    /// How long resize signals must stop before throttling resumes.
    pub resize_quiet_period: Duration,
    /// Pointer travel, in pixels, per slice in scroll mode.
    pub scroll_threshold: f32,
    /// Width of the invisible hit band around crosshair lines, in pixels.
    pub line_hit_width_px: f32,
    /// Side of the square hit area at the crosshair centre.
    pub center_hit_size: f32,
    pub rotation_handle_radius: f32,
    /// Distance of rotation handles from the edge of the view.
    pub rotation_handle_inset: f32,
    pub slab_handle_size: f32,
    /// Distance of slab handles from the crosshair centre along the line.
    pub slab_handle_offset: f32,
    /// Fraction of the smaller plane extent kept clear around the crosshair
    /// centre.
    pub crosshair_gap: f32,
    pub processor: Processor,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            resize_quiet_period: Duration::from_millis(100),
            scroll_threshold: 3.0,
            line_hit_width_px: 10.0,
            center_hit_size: 0.1,
            rotation_handle_radius: 0.015,
            rotation_handle_inset: 0.02,
            slab_handle_size: 0.018,
            slab_handle_offset: 0.2,
            crosshair_gap: 0.05,
            processor: Processor::default(),
        }
    }
}

impl ViewerConfig {
    /// Minimum time between two throttled draws.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}
