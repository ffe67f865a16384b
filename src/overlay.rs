//! Crosshair overlay geometry for one view.
//!
//! The crosshair marks where the two other cutting planes cross this one.
//! Only geometry lives here. Drawing the lines and handles is up to the
//! display surface.

use glam::{Vec2, Vec3};

use crate::config::ViewerConfig;
use crate::enums::{HandleAxis, Orientation};
use crate::interaction::{DragGeometry, HitRegion, HitShape, HitTarget};
use crate::plane::{Framing, Plane};
use crate::view_state::ViewState;

/// A line to draw on top of the slice, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLine {
    pub from: Vec2,
    pub to: Vec2,
    /// Orientation whose plane this line marks; picks the line colour.
    pub marks: Orientation,
    /// Slab boundaries are drawn dashed.
    pub dashed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosshair {
    orientation: Orientation,
    /// Crosshair centre in world units.
    pub center: Vec2,
    /// Half slab width of the vertical line (x) and the horizontal line (y).
    pub slab_offset: Vec2,
    /// On-screen size of the plane.
    pub extent: Vec2,
}

fn fraction(position: usize, count: usize) -> f32 {
    if count > 1 {
        position as f32 / (count - 1) as f32
    } else {
        0.5
    }
}

impl Crosshair {
    pub fn new(orientation: Orientation, state: &ViewState, plane: &Plane) -> Self {
        let dims = state.dims();
        let horizontal = orientation.horizontal_target();
        let vertical = orientation.vertical_target();
        let proportion = |target: Orientation| plane.proportions.dot(target.normal_axis());

        let h_count = horizontal.slice_count(dims);
        let v_count = vertical.slice_count(dims);
        let h_extent = proportion(horizontal);
        let v_extent = proportion(vertical);

        let center = Vec2::new(
            (fraction(state.position(vertical), v_count) - 0.5) * v_extent,
            (0.5 - fraction(state.position(horizontal), h_count)) * h_extent,
        );
        let slab_offset = Vec2::new(
            state.thickness(vertical) / 2.0 / v_count as f32 * v_extent,
            state.thickness(horizontal) / 2.0 / h_count as f32 * h_extent,
        );
        Self {
            orientation,
            center,
            slab_offset,
            extent: plane.extent(),
        }
    }

    pub fn drag_geometry(&self) -> DragGeometry {
        DragGeometry {
            center: self.center,
            extent: self.extent,
        }
    }

    pub fn has_slab(&self) -> bool {
        self.slab_offset.cmpgt(Vec2::ZERO).any()
    }

    fn gap(&self, config: &ViewerConfig) -> f32 {
        config.crosshair_gap * self.extent.min_element()
    }

    /// Interactive regions in priority order: rotation handles, slab
    /// handles, centre, then the crosshair lines.
    pub fn hit_regions(
        &self,
        framing: &Framing,
        viewport: (u32, u32),
        config: &ViewerConfig,
    ) -> Vec<HitRegion> {
        let Vec2 { x, y } = self.center;
        let inset = config.rotation_handle_inset;
        let radius = config.rotation_handle_radius;
        let handle_half = Vec2::splat(config.slab_handle_size / 2.0);
        let along = config.slab_handle_offset;
        let offset = self.slab_offset;
        let half_width = config.line_hit_width_px / 2.0 * framing.world_per_pixel(viewport.0);
        let gap = self.gap(config);

        let circle = |center: Vec2, axis| HitRegion {
            shape: HitShape::Circle { center, radius },
            target: HitTarget::RotationHandle(axis),
        };
        let slab = |center: Vec2, axis| HitRegion {
            shape: HitShape::Rect {
                center,
                half_size: handle_half,
            },
            target: HitTarget::SlabHandle(axis),
        };
        let segment = |from: Vec2, to: Vec2, axis| HitRegion {
            shape: HitShape::Segment {
                from,
                to,
                half_width,
            },
            target: HitTarget::CrosshairLine(axis),
        };

        let mut regions = vec![
            circle(Vec2::new(framing.left + inset, y), HandleAxis::Horizontal),
            circle(Vec2::new(framing.right - inset, y), HandleAxis::Horizontal),
            circle(Vec2::new(x, framing.top - inset), HandleAxis::Vertical),
            circle(Vec2::new(x, framing.bottom + inset), HandleAxis::Vertical),
        ];
        for (dx, dy) in [(-along, offset.y), (along, offset.y), (-along, -offset.y), (along, -offset.y)] {
            regions.push(slab(Vec2::new(x + dx, y + dy), HandleAxis::Horizontal));
        }
        for (dx, dy) in [(-offset.x, along), (offset.x, along), (-offset.x, -along), (offset.x, -along)] {
            regions.push(slab(Vec2::new(x + dx, y + dy), HandleAxis::Vertical));
        }
        regions.push(HitRegion {
            shape: HitShape::Rect {
                center: self.center,
                half_size: Vec2::splat(config.center_hit_size / 2.0),
            },
            target: HitTarget::Center,
        });
        regions.extend([
            segment(Vec2::new(framing.left, y), Vec2::new(x - gap, y), HandleAxis::Horizontal),
            segment(Vec2::new(x + gap, y), Vec2::new(framing.right, y), HandleAxis::Horizontal),
            segment(Vec2::new(x, framing.bottom), Vec2::new(x, y - gap), HandleAxis::Vertical),
            segment(Vec2::new(x, y + gap), Vec2::new(x, framing.top), HandleAxis::Vertical),
        ]);
        regions
    }

    /// Crosshair and slab-boundary lines to draw.
    pub fn lines(&self, framing: &Framing, config: &ViewerConfig) -> Vec<OverlayLine> {
        let Vec2 { x, y } = self.center;
        let gap = self.gap(config);
        let horizontal = self.orientation.horizontal_target();
        let vertical = self.orientation.vertical_target();
        let line = |from: Vec2, to: Vec2, marks, dashed| OverlayLine {
            from,
            to,
            marks,
            dashed,
        };

        let mut lines = vec![
            line(Vec2::new(framing.left, y), Vec2::new(x - gap, y), horizontal, false),
            line(Vec2::new(x + gap, y), Vec2::new(framing.right, y), horizontal, false),
            line(Vec2::new(x, framing.bottom), Vec2::new(x, y - gap), vertical, false),
            line(Vec2::new(x, y + gap), Vec2::new(x, framing.top), vertical, false),
        ];
        if self.has_slab() {
            for dy in [self.slab_offset.y, -self.slab_offset.y] {
                lines.push(line(
                    Vec2::new(framing.left, y + dy),
                    Vec2::new(framing.right, y + dy),
                    horizontal,
                    true,
                ));
            }
            for dx in [-self.slab_offset.x, self.slab_offset.x] {
                lines.push(line(
                    Vec2::new(x + dx, framing.bottom),
                    Vec2::new(x + dx, framing.top),
                    vertical,
                    true,
                ));
            }
        }
        lines
    }
}

/// Colour used for lines that mark `orientation`'s plane.
pub fn marker_color(orientation: Orientation) -> Vec3 {
    match orientation {
        Orientation::Axial => Vec3::new(0.0, 1.0, 1.0),
        Orientation::Coronal => Vec3::new(1.0, 0.0, 1.0),
        Orientation::Sagittal => Vec3::new(1.0, 174.0 / 255.0, 0.0),
    }
}
