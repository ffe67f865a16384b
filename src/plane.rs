//! Cutting-plane geometry.
//!
//! A [`Plane`] lives in normalized volume space, where `[0, 1]` spans each
//! axis of the volume. Its extent vectors are kept in physical proportions
//! (every axis scaled by the largest physical extent of the volume) so that
//! rotations are rigid and the on-screen aspect ratio is true to the
//! scanner geometry.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::enums::Orientation;
use crate::view_state::ViewState;
use crate::volume::VolumeGrid;

/// Threshold under which an extent or an aspect change counts as zero.
pub const PLANE_EPSILON: f32 = 1e-6;

/// `point_at` divides the extent offsets by `proportions`, which maps the
/// physical-proportion extents back onto per-axis normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Plane centre in normalized volume coordinates.
    pub origin: Vec3,
    /// Horizontal extent, in physical proportions, rotated.
    pub x_axis: Vec3,
    /// Vertical extent, in physical proportions, rotated and flipped so that
    /// screen-up walks towards lower row/slice indices.
    pub y_axis: Vec3,
    /// Unit slab integration direction.
    pub normal: Vec3,
    /// Physical proportion of each volume axis (largest axis is 1).
    pub proportions: Vec3,
}

impl Plane {
    /// Normalized volume coordinate of plane position `(u, v)`, where
    /// `(u, v)` ranges over `[-0.5, 0.5]²` and `v` grows upwards on screen.
    #[inline]
    pub fn point_at(&self, u: f32, v: f32) -> Vec3 {
        self.origin + (self.x_axis * u + self.y_axis * v) / self.proportions
    }

    /// Displacement in normalized volume coordinates for one voxel along
    /// the normal.
    #[inline]
    pub fn normal_step(&self, dims: (usize, usize, usize)) -> Vec3 {
        let (width, height, depth) = dims;
        self.normal / Vec3::new(width as f32, height as f32, depth as f32)
    }

    /// Most [`normal_step`](Self::normal_step)s that can separate two points
    /// inside the volume: the voxel diagonal, rounded up.
    pub fn max_slab_steps(dims: (usize, usize, usize)) -> usize {
        let (width, height, depth) = dims;
        Vec3::new(width as f32, height as f32, depth as f32)
            .length()
            .ceil() as usize
    }

    /// On-screen size of the plane, in the same units as [`Framing`].
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.x_axis.length(), self.y_axis.length())
    }

    /// Width over height, or `None` if the vertical extent has collapsed.
    pub fn aspect(&self) -> Option<f32> {
        let extent = self.extent();
        (extent.y > PLANE_EPSILON).then(|| extent.x / extent.y)
    }
}

/// Physical size of the volume along x, y, z divided by the largest one.
pub fn physical_proportions(volume: &VolumeGrid) -> Vec3 {
    let (width, height, depth) = volume.physical_extent();
    let max_dim = width.max(height).max(depth);
    Vec3::new(width, height, depth) / max_dim
}

/// Compute the cutting plane for `orientation` from the current state.
pub fn solve_plane(orientation: Orientation, state: &ViewState, volume: &VolumeGrid) -> Plane {
    let (width, height, depth) = volume.dims();
    let proportions = physical_proportions(volume);
    let slice_centre =
        |position: usize, count: usize| (position as f32 + 0.5) / count as f32;

    let (origin, x_axis, y_axis) = match orientation {
        Orientation::Axial => (
            Vec3::new(0.5, 0.5, slice_centre(state.position(orientation), depth)),
            Vec3::new(proportions.x, 0.0, 0.0),
            Vec3::new(0.0, proportions.y, 0.0),
        ),
        Orientation::Coronal => (
            Vec3::new(0.5, slice_centre(state.position(orientation), height), 0.5),
            Vec3::new(proportions.x, 0.0, 0.0),
            Vec3::new(0.0, 0.0, proportions.z),
        ),
        Orientation::Sagittal => (
            Vec3::new(slice_centre(state.position(orientation), width), 0.5, 0.5),
            Vec3::new(0.0, proportions.y, 0.0),
            Vec3::new(0.0, 0.0, proportions.z),
        ),
    };

    let rotation = state.rotation(orientation);
    Plane {
        origin,
        x_axis: rotation * x_axis,
        y_axis: -(rotation * y_axis),
        normal: (rotation * orientation.normal_axis()).normalize(),
        proportions,
    }
}

/// Outcome of solving a view's plane for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SolvedPlane {
    pub plane: Plane,
    /// The aspect ratio moved since the last frame and the consumer must
    /// recompute its framing.
    pub reframe: bool,
}

/// Per-view solver that remembers the last aspect ratio it produced.
#[derive(Debug, Default, Clone)]
pub struct PlaneSolver {
    last_aspect: Option<f32>,
}

impl PlaneSolver {
    pub fn solve(
        &mut self,
        orientation: Orientation,
        state: &ViewState,
        volume: &VolumeGrid,
    ) -> SolvedPlane {
        let plane = solve_plane(orientation, state, volume);
        let reframe = match plane.aspect() {
            Some(aspect) => {
                let changed = self
                    .last_aspect
                    .is_none_or(|last| (aspect - last).abs() > PLANE_EPSILON);
                if changed {
                    debug!(
                        orientation = orientation.name(),
                        aspect, "plane aspect changed"
                    );
                    self.last_aspect = Some(aspect);
                }
                changed
            }
            None => false,
        };
        SolvedPlane { plane, reframe }
    }

    /// Forget the remembered aspect, e.g. after a new volume was loaded.
    pub fn reset(&mut self) {
        self.last_aspect = None;
    }
}

/// Orthographic camera extents that show a plane without cropping.
///
/// The plane quad is centred at the origin of this space and spans
/// `±extent / 2`. Whichever viewport dimension is relatively larger gets
/// black bars (pillarbox for wide viewports, letterbox for tall ones).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            left: -0.5,
            right: 0.5,
            top: 0.5,
            bottom: -0.5,
        }
    }
}

impl Framing {
    /// Fit `content` (width, height) into a `viewport` of pixels. Returns
    /// `None` if either has a zero-length side.
    pub fn fit(content: Vec2, viewport: (u32, u32)) -> Option<Self> {
        let (viewport_width, viewport_height) = viewport;
        if viewport_width == 0
            || viewport_height == 0
            || content.x <= PLANE_EPSILON
            || content.y <= PLANE_EPSILON
        {
            return None;
        }
        let viewport_aspect = viewport_width as f32 / viewport_height as f32;
        let content_aspect = content.x / content.y;

        let (width, height) = if viewport_aspect > content_aspect {
            (content.y * viewport_aspect, content.y)
        } else {
            (content.x, content.x / viewport_aspect)
        };
        Some(Self {
            left: -width / 2.0,
            right: width / 2.0,
            top: height / 2.0,
            bottom: -height / 2.0,
        })
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Map normalized device coordinates (`[-1, 1]`, y up) to world units.
    pub fn ndc_to_world(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.left + (ndc.x + 1.0) / 2.0 * self.width(),
            self.bottom + (ndc.y + 1.0) / 2.0 * self.height(),
        )
    }

    /// World position of the centre of pixel `(column, row)`, row 0 on top.
    pub fn pixel_to_world(&self, column: usize, row: usize, viewport: (u32, u32)) -> Vec2 {
        let (viewport_width, viewport_height) = viewport;
        Vec2::new(
            self.left + (column as f32 + 0.5) / viewport_width as f32 * self.width(),
            self.top - (row as f32 + 0.5) / viewport_height as f32 * self.height(),
        )
    }

    /// World units covered by one horizontal pixel.
    pub fn world_per_pixel(&self, viewport_width: u32) -> f32 {
        self.width() / viewport_width.max(1) as f32
    }
}
