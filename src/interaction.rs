//! Pointer interaction: classify what was hit, turn drags into state deltas.
//!
//! Hit testing works on plane world coordinates (the space of
//! [`Framing`](crate::plane::Framing)) against a short list of
//! [`HitRegion`]s. Drags become [`StateDelta`]s, and those are the only way
//! pointer input mutates a [`ViewState`].

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use tracing::trace;

use crate::enums::{HandleAxis, Orientation};
use crate::plane::PLANE_EPSILON;
use crate::rotation::apply_rotation;
use crate::view_state::ViewState;

/// Interactive part of a view's crosshair overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    CrosshairLine(HandleAxis),
    Center,
    SlabHandle(HandleAxis),
    RotationHandle(HandleAxis),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    RowResize,
    ColResize,
    Grab,
    AllScroll,
}

/// What the overlay should show while the pointer hovers a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoverFeedback {
    pub cursor: CursorHint,
    /// Slab handles of this line become visible.
    pub slab_handles: Option<HandleAxis>,
    pub rotation_handles: bool,
}

impl HitTarget {
    pub fn hover_feedback(self) -> HoverFeedback {
        match self {
            HitTarget::Center => HoverFeedback {
                cursor: CursorHint::AllScroll,
                ..HoverFeedback::default()
            },
            HitTarget::CrosshairLine(axis) => HoverFeedback {
                cursor: resize_cursor(axis),
                slab_handles: Some(axis),
                rotation_handles: true,
            },
            HitTarget::SlabHandle(axis) => HoverFeedback {
                cursor: resize_cursor(axis),
                slab_handles: Some(axis),
                rotation_handles: false,
            },
            HitTarget::RotationHandle(axis) => HoverFeedback {
                cursor: CursorHint::Grab,
                slab_handles: Some(axis),
                rotation_handles: true,
            },
        }
    }
}

fn resize_cursor(axis: HandleAxis) -> CursorHint {
    match axis {
        HandleAxis::Horizontal => CursorHint::RowResize,
        HandleAxis::Vertical => CursorHint::ColResize,
    }
}

/// Geometry of one interactive region, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitShape {
    Segment { from: Vec2, to: Vec2, half_width: f32 },
    Circle { center: Vec2, radius: f32 },
    Rect { center: Vec2, half_size: Vec2 },
}

impl HitShape {
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            HitShape::Segment {
                from,
                to,
                half_width,
            } => {
                let along = to - from;
                let length_squared = along.length_squared();
                let t = if length_squared > 0.0 {
                    ((point - from).dot(along) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                point.distance(from + along * t) <= half_width
            }
            HitShape::Circle { center, radius } => point.distance(center) <= radius,
            HitShape::Rect { center, half_size } => {
                let offset = (point - center).abs();
                offset.x <= half_size.x && offset.y <= half_size.y
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub shape: HitShape,
    pub target: HitTarget,
}

/// First region containing `point`. Regions are expected in priority order.
pub fn hit_test(regions: &[HitRegion], point: Vec2) -> Option<HitTarget> {
    regions
        .iter()
        .find(|region| region.shape.contains(point))
        .map(|region| region.target)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Position,
    Thickness,
    Rotation(HandleAxis),
}

/// A piece of shared state a drag edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetEdit {
    /// Whose position/thickness changes. For rotations, the dragging view.
    pub target: Orientation,
    pub kind: DeltaKind,
}

/// Edits driven by the horizontal line (vertical pointer motion) and by the
/// vertical line (horizontal pointer motion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub horizontal: Option<TargetEdit>,
    pub vertical: Option<TargetEdit>,
}

impl Resolution {
    pub fn edits(&self) -> impl Iterator<Item = (HandleAxis, TargetEdit)> {
        [
            self.horizontal.map(|edit| (HandleAxis::Horizontal, edit)),
            self.vertical.map(|edit| (HandleAxis::Vertical, edit)),
        ]
        .into_iter()
        .flatten()
    }
}

fn line_target(orientation: Orientation, axis: HandleAxis) -> Orientation {
    match axis {
        HandleAxis::Horizontal => orientation.horizontal_target(),
        HandleAxis::Vertical => orientation.vertical_target(),
    }
}

fn single(axis: HandleAxis, edit: TargetEdit) -> Resolution {
    match axis {
        HandleAxis::Horizontal => Resolution {
            horizontal: Some(edit),
            vertical: None,
        },
        HandleAxis::Vertical => Resolution {
            horizontal: None,
            vertical: Some(edit),
        },
    }
}

/// Map a hit target in a view of `orientation` to the state it edits.
pub fn resolve_hit(orientation: Orientation, target: HitTarget) -> Resolution {
    let position = |axis| TargetEdit {
        target: line_target(orientation, axis),
        kind: DeltaKind::Position,
    };
    match target {
        HitTarget::CrosshairLine(axis) => single(axis, position(axis)),
        HitTarget::Center => Resolution {
            horizontal: Some(position(HandleAxis::Horizontal)),
            vertical: Some(position(HandleAxis::Vertical)),
        },
        HitTarget::SlabHandle(axis) => single(
            axis,
            TargetEdit {
                target: line_target(orientation, axis),
                kind: DeltaKind::Thickness,
            },
        ),
        HitTarget::RotationHandle(axis) => single(
            axis,
            TargetEdit {
                target: orientation,
                kind: DeltaKind::Rotation(axis),
            },
        ),
    }
}

/// A semantic change to the shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateDelta {
    pub target: Orientation,
    pub kind: DeltaKind,
    /// Slices for positions, voxels for thicknesses, radians for rotations.
    pub amount: f32,
}

/// Apply a delta, clamping positions and thicknesses into range.
pub fn apply_delta(state: &mut ViewState, delta: StateDelta) {
    match delta.kind {
        DeltaKind::Position => state.offset_position(delta.target, delta.amount),
        DeltaKind::Thickness => state.offset_thickness(delta.target, delta.amount),
        DeltaKind::Rotation(axis) => apply_rotation(state, delta.target, axis, delta.amount),
    }
}

/// Where the crosshair sits and how large the plane is, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGeometry {
    pub center: Vec2,
    pub extent: Vec2,
}

/// Wrap an angle difference into `(-π, π]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

fn angle_about(point: Vec2, center: Vec2) -> f32 {
    let offset = point - center;
    offset.y.atan2(offset.x)
}

/// State of one pointer drag on an interactive target.
///
/// Positions are recomputed from the drag start on every move, so rounding
/// to whole slices never accumulates.
#[derive(Debug, Clone)]
pub struct DragSession {
    orientation: Orientation,
    target: HitTarget,
    resolution: Resolution,
    start_world: Vec2,
    start_state: ViewState,
    last_angle: f32,
}

impl DragSession {
    pub fn begin(
        orientation: Orientation,
        target: HitTarget,
        start_world: Vec2,
        geometry: DragGeometry,
        state: &ViewState,
    ) -> Self {
        trace!(orientation = orientation.name(), ?target, "drag started");
        Self {
            orientation,
            target,
            resolution: resolve_hit(orientation, target),
            start_world,
            start_state: state.clone(),
            last_angle: angle_about(start_world, geometry.center),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn target(&self) -> HitTarget {
        self.target
    }

    /// Deltas that take `state` to where the pointer at `world` puts it.
    /// Edits whose plane extent has collapsed are skipped.
    pub fn update(
        &mut self,
        world: Vec2,
        geometry: DragGeometry,
        state: &ViewState,
    ) -> Vec<StateDelta> {
        let dims = state.dims();
        let resolution = self.resolution;
        let mut deltas = Vec::with_capacity(2);

        for (axis, edit) in resolution.edits() {
            // The horizontal line moves with vertical motion and vice versa.
            // Screen y is flipped relative to index order.
            let (displacement, extent, from_center) = match axis {
                HandleAxis::Horizontal => (
                    -(world.y - self.start_world.y),
                    geometry.extent.y,
                    (world.y - geometry.center.y).abs(),
                ),
                HandleAxis::Vertical => (
                    world.x - self.start_world.x,
                    geometry.extent.x,
                    (world.x - geometry.center.x).abs(),
                ),
            };
            let span = edit.target.slice_count(dims).saturating_sub(1) as f32;

            let amount = match edit.kind {
                DeltaKind::Position => {
                    if extent <= PLANE_EPSILON {
                        continue;
                    }
                    let start = self.start_state.position(edit.target) as f32;
                    let wanted = start + displacement / extent * span;
                    wanted - state.position(edit.target) as f32
                }
                DeltaKind::Thickness => {
                    if extent <= PLANE_EPSILON {
                        continue;
                    }
                    let wanted = from_center / extent * span * 2.0;
                    wanted - state.thickness(edit.target)
                }
                DeltaKind::Rotation(_) => {
                    let angle = angle_about(world, geometry.center);
                    let delta = wrap_angle(angle - self.last_angle);
                    self.last_angle = angle;
                    delta
                }
            };
            deltas.push(StateDelta {
                target: edit.target,
                kind: edit.kind,
                amount,
            });
        }
        deltas
    }
}

/// What a primary-button drag does when it does not start on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerTool {
    #[default]
    WindowLevel,
    Scroll,
}

/// Horizontal motion moves the window centre, vertical motion the width.
pub fn apply_window_level(state: &mut ViewState, delta_px: Vec2) {
    state.set_window_center(state.window_center() + delta_px.x);
    state.set_window_width(state.window_width() + delta_px.y);
}

/// Turns vertical pointer travel into whole-slice steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAccumulator {
    threshold: f32,
    accumulated: f32,
}

impl ScrollAccumulator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(f32::EPSILON),
            accumulated: 0.0,
        }
    }

    /// Feed a vertical pointer delta in pixels. Returns how many slices the
    /// view's own position moves (dragging down moves to higher indices).
    pub fn feed(&mut self, delta_y: f32) -> i32 {
        self.accumulated -= delta_y;
        if self.accumulated.abs() < self.threshold {
            return 0;
        }
        let steps = (self.accumulated / self.threshold).trunc();
        self.accumulated %= self.threshold;
        -(steps as i32)
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}
