//! Cross-view rotation coupling.
//!
//! Rotating the crosshair in one view turns the two other cutting planes
//! about the dragging view's normal. One of them takes `+Δ`, the other `−Δ`,
//! so the three planes stay mutually orthogonal. The dragging view's own
//! rotation is never touched.

use glam::{Quat, Vec3};
use tracing::trace;

use crate::enums::{HandleAxis, Orientation};
use crate::view_state::ViewState;

/// One row of the coupling table: which quaternion turns, about which axis,
/// in which direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoupledRotation {
    pub target: Orientation,
    pub axis: Vec3,
    pub sign: f32,
}

/// The coupling table. Every handle of a view rotates about that view's
/// normal, so horizontal and vertical handles share a row.
pub fn coupling(source: Orientation, _handle: HandleAxis) -> [CoupledRotation; 2] {
    let axis = source.normal_axis();
    let (plus, minus) = match source {
        Orientation::Axial => (Orientation::Coronal, Orientation::Sagittal),
        Orientation::Coronal => (Orientation::Axial, Orientation::Sagittal),
        Orientation::Sagittal => (Orientation::Axial, Orientation::Coronal),
    };
    [
        CoupledRotation {
            target: plus,
            axis,
            sign: 1.0,
        },
        CoupledRotation {
            target: minus,
            axis,
            sign: -1.0,
        },
    ]
}

/// Premultiply `q` by a rotation of `angle` radians about `axis`.
#[inline]
pub fn rotate(q: Quat, axis: Vec3, angle: f32) -> Quat {
    Quat::from_axis_angle(axis.normalize(), angle) * q
}

/// Apply a rotation-handle drag from `source` to the shared state.
pub fn apply_rotation(state: &mut ViewState, source: Orientation, handle: HandleAxis, delta: f32) {
    if delta == 0.0 || !delta.is_finite() {
        return;
    }
    for coupled in coupling(source, handle) {
        let current = state.rotation(coupled.target);
        state.set_rotation(
            coupled.target,
            rotate(current, coupled.axis, coupled.sign * delta),
        );
    }
    trace!(
        source = source.name(),
        ?handle,
        delta,
        "coupled rotation applied"
    );
}
