use glam::Quat;

use crate::enums::{Orientation, SlabMode};
use crate::plane::Plane;
use crate::volume::VolumeGrid;
use crate::window::Window;

/// Per-orientation slice state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// Slice index along the axis this orientation holds fixed.
    pub position: usize,
    /// Slab thickness in voxels. Below 1 means a single sample.
    pub thickness: f32,
    /// Rotation applied to this orientation's cutting plane.
    pub rotation: Quat,
}

impl AxisState {
    fn centered(count: usize) -> Self {
        Self {
            position: count / 2,
            thickness: 0.0,
            rotation: Quat::IDENTITY,
        }
    }
}

/// The single model shared by all three views.
///
/// Built once per loaded volume and replaced wholesale when another volume
/// is loaded. Every setter clamps into the valid range of the volume it was
/// built for, so readers never see an out-of-range slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    window: Window,
    axial: AxisState,
    coronal: AxisState,
    sagittal: AxisState,
    slab_mode: SlabMode,
    dims: (usize, usize, usize),
}

impl ViewState {
    /// Fresh state for a volume: centred slices, the volume's own window,
    /// no slabs and no rotation.
    pub fn for_volume(volume: &VolumeGrid) -> Self {
        let dims = volume.dims();
        let metadata = volume.metadata();
        Self {
            window: Window::new(metadata.window_center, metadata.window_width),
            axial: AxisState::centered(Orientation::Axial.slice_count(dims)),
            coronal: AxisState::centered(Orientation::Coronal.slice_count(dims)),
            sagittal: AxisState::centered(Orientation::Sagittal.slice_count(dims)),
            slab_mode: SlabMode::default(),
            dims,
        }
    }

    /// Volume dimensions `(width, height, depth)` this state clamps against.
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn window_center(&self) -> f32 {
        self.window.center()
    }

    pub fn window_width(&self) -> f32 {
        self.window.width()
    }

    pub fn set_window_center(&mut self, center: f32) {
        self.window.set_center(center);
    }

    /// Widths below 1 are clamped to 1.
    pub fn set_window_width(&mut self, width: f32) {
        self.window.set_width(width);
    }

    pub fn slab_mode(&self) -> SlabMode {
        self.slab_mode
    }

    pub fn set_slab_mode(&mut self, mode: SlabMode) {
        self.slab_mode = mode;
    }

    pub fn axis(&self, orientation: Orientation) -> &AxisState {
        match orientation {
            Orientation::Axial => &self.axial,
            Orientation::Coronal => &self.coronal,
            Orientation::Sagittal => &self.sagittal,
        }
    }

    fn axis_mut(&mut self, orientation: Orientation) -> &mut AxisState {
        match orientation {
            Orientation::Axial => &mut self.axial,
            Orientation::Coronal => &mut self.coronal,
            Orientation::Sagittal => &mut self.sagittal,
        }
    }

    pub fn position(&self, orientation: Orientation) -> usize {
        self.axis(orientation).position
    }

    pub fn thickness(&self, orientation: Orientation) -> f32 {
        self.axis(orientation).thickness
    }

    pub fn rotation(&self, orientation: Orientation) -> Quat {
        self.axis(orientation).rotation
    }

    /// Largest valid slice index for `orientation`.
    pub fn max_position(&self, orientation: Orientation) -> usize {
        orientation.slice_count(self.dims).saturating_sub(1)
    }

    /// Round to the nearest slice and clamp to `[0, count - 1]`.
    pub fn set_position(&mut self, orientation: Orientation, position: f32) {
        let max = self.max_position(orientation);
        let clamped = if position.is_nan() {
            0.0
        } else {
            position.round().clamp(0.0, max as f32)
        };
        self.axis_mut(orientation).position = clamped as usize;
    }

    /// Shift a position by a (possibly fractional) number of slices.
    pub fn offset_position(&mut self, orientation: Orientation, delta: f32) {
        let current = self.position(orientation) as f32;
        self.set_position(orientation, current + delta);
    }

    /// Thickest slab that still adds samples: the voxel diagonal either
    /// side of the plane.
    pub fn max_thickness(&self) -> f32 {
        (2 * Plane::max_slab_steps(self.dims) + 1) as f32
    }

    /// Clamped to `[0, max_thickness]`. NaN resets to a single slice.
    pub fn set_thickness(&mut self, orientation: Orientation, thickness: f32) {
        let thickness = if thickness.is_nan() {
            0.0
        } else {
            thickness.clamp(0.0, self.max_thickness())
        };
        self.axis_mut(orientation).thickness = thickness;
    }

    pub fn offset_thickness(&mut self, orientation: Orientation, delta: f32) {
        let current = self.thickness(orientation);
        self.set_thickness(orientation, current + delta);
    }

    /// Replace a rotation. The quaternion is renormalized so accumulated
    /// drift does not skew the plane.
    pub fn set_rotation(&mut self, orientation: Orientation, rotation: Quat) {
        self.axis_mut(orientation).rotation = rotation.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeMetadata;

    fn state(width: usize, height: usize, depth: usize) -> ViewState {
        let metadata = VolumeMetadata {
            window_center: 40.0,
            window_width: 400.0,
            ..VolumeMetadata::default()
        };
        let grid = VolumeGrid::new(vec![0.0; width * height * depth], (width, height, depth), metadata)
            .unwrap();
        ViewState::for_volume(&grid)
    }

    #[test]
    fn starts_centred_with_volume_window() {
        let state = state(10, 7, 5);
        assert_eq!(state.position(Orientation::Axial), 2);
        assert_eq!(state.position(Orientation::Coronal), 3);
        assert_eq!(state.position(Orientation::Sagittal), 5);
        assert_eq!(state.window_center(), 40.0);
        assert_eq!(state.window_width(), 400.0);
        assert_eq!(state.slab_mode(), SlabMode::MaxIP);
        for orientation in Orientation::ALL {
            assert_eq!(state.thickness(orientation), 0.0);
            assert_eq!(state.rotation(orientation), Quat::IDENTITY);
        }
    }

    #[test]
    fn positions_clamp_to_each_axis() {
        let mut state = state(10, 7, 5);
        state.set_position(Orientation::Axial, 5.0);
        assert_eq!(state.position(Orientation::Axial), 4);
        state.set_position(Orientation::Coronal, -1.0);
        assert_eq!(state.position(Orientation::Coronal), 0);
        state.set_position(Orientation::Sagittal, 10.0);
        assert_eq!(state.position(Orientation::Sagittal), 9);
        state.offset_position(Orientation::Sagittal, -2.4);
        assert_eq!(state.position(Orientation::Sagittal), 7);
    }

    #[test]
    fn thickness_never_negative() {
        let mut state = state(4, 4, 4);
        state.set_thickness(Orientation::Coronal, 3.0);
        state.offset_thickness(Orientation::Coronal, -10.0);
        assert_eq!(state.thickness(Orientation::Coronal), 0.0);
    }

    #[test]
    fn thickness_is_capped_at_the_voxel_diagonal() {
        let mut state = state(4, 4, 2);
        // sqrt(16 + 16 + 4) = 6 steps either side.
        assert_eq!(state.max_thickness(), 13.0);
        state.set_thickness(Orientation::Axial, f32::INFINITY);
        assert_eq!(state.thickness(Orientation::Axial), 13.0);
        state.set_thickness(Orientation::Axial, 1e7);
        assert_eq!(state.thickness(Orientation::Axial), 13.0);
        state.set_thickness(Orientation::Axial, f32::NAN);
        assert_eq!(state.thickness(Orientation::Axial), 0.0);
        state.set_thickness(Orientation::Axial, 5.0);
        assert_eq!(state.thickness(Orientation::Axial), 5.0);
    }

    #[test]
    fn window_width_floor_is_one() {
        let mut state = state(4, 4, 4);
        state.set_window_width(0.5);
        assert_eq!(state.window_width(), 1.0);
    }
}
