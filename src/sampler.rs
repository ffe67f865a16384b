//! Scalar sampling along a cutting plane, with optional slab projection.

use glam::Vec3;

use crate::enums::SlabMode;
use crate::interpolator::Interpolator;
use crate::plane::Plane;
use crate::volume::VolumeGrid;

/// Result of sampling the volume at one plane position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// The sample fell outside the volume. Rendered as solid black.
    Outside,
    /// Raw stored value, before rescale and windowing.
    Value(f32),
}

impl Sample {
    pub fn value(self) -> Option<f32> {
        match self {
            Sample::Outside => None,
            Sample::Value(value) => Some(value),
        }
    }
}

#[inline]
fn inside_unit_cube(point: Vec3) -> bool {
    point.cmpge(Vec3::ZERO).all() && point.cmple(Vec3::ONE).all()
}

/// Running max/min/sum over the samples of one slab.
#[derive(Debug, Clone, Copy)]
struct SlabAccumulator {
    max: f32,
    min: f32,
    sum: f32,
    count: u32,
}

impl SlabAccumulator {
    fn new() -> Self {
        Self {
            max: f32::NEG_INFINITY,
            min: f32::INFINITY,
            sum: 0.0,
            count: 0,
        }
    }

    fn push(&mut self, value: f32) {
        self.max = self.max.max(value);
        self.min = self.min.min(value);
        self.sum += value;
        self.count += 1;
    }

    fn finish(self, mode: SlabMode) -> Sample {
        if self.count == 0 {
            return Sample::Outside;
        }
        let value = match mode {
            SlabMode::MaxIP => self.max,
            SlabMode::MinIP => self.min,
            SlabMode::AvgIP => self.sum / self.count as f32,
        };
        Sample::Value(value)
    }
}

/// Sample `grid` at plane position `(u, v)` in `[-0.5, 0.5]²`.
///
/// A `slab_thickness` below 1 voxel takes a single trilinear sample.
/// Otherwise `2 * floor(thickness / 2) + 1` samples are taken one voxel
/// apart along the plane normal, samples outside the volume are skipped and
/// the rest are reduced with `slab_mode`. Steps further out than the voxel
/// diagonal can never land inside the volume and are not taken.
pub fn sample(
    plane: &Plane,
    grid: &VolumeGrid,
    slab_thickness: f32,
    slab_mode: SlabMode,
    u: f32,
    v: f32,
) -> Sample {
    let centre = plane.point_at(u, v);

    if slab_thickness.is_nan() || slab_thickness < 1.0 {
        if !inside_unit_cube(centre) {
            return Sample::Outside;
        }
        return Sample::Value(Interpolator::trilinear_interpolate(grid.data(), centre));
    }

    let reach = Plane::max_slab_steps(grid.dims()) as i64;
    let half = ((slab_thickness.floor() as i64) / 2).min(reach);
    let step = plane.normal_step(grid.dims());
    let mut slab = SlabAccumulator::new();
    for i in -half..=half {
        let point = centre + step * i as f32;
        if inside_unit_cube(point) {
            slab.push(Interpolator::trilinear_interpolate(grid.data(), point));
        }
    }
    slab.finish(slab_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Orientation;
    use crate::plane::solve_plane;
    use crate::view_state::ViewState;
    use crate::volume::{Spacing, VolumeMetadata};
    use approx::assert_relative_eq;

    fn column(values: &[f32]) -> VolumeGrid {
        VolumeGrid::new(values.to_vec(), (1, 1, values.len()), VolumeMetadata::default()).unwrap()
    }

    fn axial_plane(grid: &VolumeGrid, position: usize) -> Plane {
        let mut state = ViewState::for_volume(grid);
        state.set_position(Orientation::Axial, position as f32);
        solve_plane(Orientation::Axial, &state, grid)
    }

    #[test]
    fn slab_projection_modes() {
        let grid = column(&[1.0, 5.0, 3.0, 9.0, 2.0]);
        let plane = axial_plane(&grid, 2);

        let max = sample(&plane, &grid, 5.0, SlabMode::MaxIP, 0.0, 0.0);
        let min = sample(&plane, &grid, 5.0, SlabMode::MinIP, 0.0, 0.0);
        let avg = sample(&plane, &grid, 5.0, SlabMode::AvgIP, 0.0, 0.0);
        assert_relative_eq!(max.value().unwrap(), 9.0, epsilon = 1e-4);
        assert_relative_eq!(min.value().unwrap(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(avg.value().unwrap(), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn slab_skips_samples_past_the_edge() {
        let grid = column(&[1.0, 5.0, 3.0, 9.0, 2.0]);
        let plane = axial_plane(&grid, 0);
        // Offsets -2 and -1 land below z = 0 and are dropped.
        let avg = sample(&plane, &grid, 5.0, SlabMode::AvgIP, 0.0, 0.0);
        assert_relative_eq!(avg.value().unwrap(), 3.0, epsilon = 1e-4);
        let min = sample(&plane, &grid, 5.0, SlabMode::MinIP, 0.0, 0.0);
        assert_relative_eq!(min.value().unwrap(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn huge_slab_matches_full_depth_slab() {
        let grid = column(&[1.0, 5.0, 3.0, 9.0, 2.0]);
        let plane = axial_plane(&grid, 2);
        for mode in [SlabMode::MaxIP, SlabMode::MinIP, SlabMode::AvgIP] {
            let full = sample(&plane, &grid, 5.0, mode, 0.0, 0.0);
            for thickness in [1e7, f32::MAX, f32::INFINITY] {
                assert_eq!(sample(&plane, &grid, thickness, mode, 0.0, 0.0), full);
            }
        }
    }

    #[test]
    fn thickness_below_one_is_single_sample() {
        let grid = column(&[1.0, 5.0, 3.0, 9.0, 2.0]);
        let plane = axial_plane(&grid, 3);
        for thickness in [0.0, 0.4, 0.999] {
            let value = sample(&plane, &grid, thickness, SlabMode::MaxIP, 0.0, 0.0);
            assert_relative_eq!(value.value().unwrap(), 9.0, epsilon = 1e-4);
        }
        // Thickness 1 and 1.9 still give a single sample per side: t = 0.
        let value = sample(&plane, &grid, 1.9, SlabMode::MinIP, 0.0, 0.0);
        assert_relative_eq!(value.value().unwrap(), 9.0, epsilon = 1e-4);
    }

    #[test]
    fn outside_the_volume_is_the_sentinel() {
        let metadata = VolumeMetadata {
            spacing: Spacing {
                row: 1.0,
                column: 1.0,
                slice: 1.0,
            },
            ..VolumeMetadata::default()
        };
        let grid = VolumeGrid::new(vec![7.0; 8], (2, 2, 2), metadata).unwrap();
        let mut state = ViewState::for_volume(&grid);
        state.set_rotation(
            Orientation::Axial,
            glam::Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
        );
        let plane = solve_plane(Orientation::Axial, &state, &grid);
        // Rotated 45°, the plane corners stick out of the unit cube.
        assert_eq!(
            sample(&plane, &grid, 0.0, SlabMode::MaxIP, 0.5, 0.5),
            Sample::Outside
        );
        assert_eq!(
            sample(&plane, &grid, 3.0, SlabMode::MaxIP, 0.5, 0.5),
            Sample::Outside
        );
        assert_eq!(
            sample(&plane, &grid, 0.0, SlabMode::MaxIP, 0.0, 0.0),
            Sample::Value(7.0)
        );
    }

    #[test]
    fn unrotated_planes_reproduce_voxels() {
        let (width, height, depth) = (4, 3, 5);
        let data: Vec<f32> = (0..width * height * depth).map(|i| (i * 7 % 23) as f32).collect();
        let metadata = VolumeMetadata {
            spacing: Spacing {
                row: 0.8,
                column: 0.6,
                slice: 2.5,
            },
            slice_thickness: 2.0,
            ..VolumeMetadata::default()
        };
        let grid = VolumeGrid::new(data, (width, height, depth), metadata).unwrap();
        let mut state = ViewState::for_volume(&grid);
        let centre = |index: usize, count: usize| (index as f32 + 0.5) / count as f32 - 0.5;

        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    let expected = grid.voxel(x, y, z).unwrap();
                    state.set_position(Orientation::Axial, z as f32);
                    state.set_position(Orientation::Coronal, y as f32);
                    state.set_position(Orientation::Sagittal, x as f32);

                    let checks = [
                        (Orientation::Axial, centre(x, width), -centre(y, height)),
                        (Orientation::Coronal, centre(x, width), -centre(z, depth)),
                        (Orientation::Sagittal, centre(y, height), -centre(z, depth)),
                    ];
                    for (orientation, u, v) in checks {
                        let plane = solve_plane(orientation, &state, &grid);
                        let value = sample(&plane, &grid, 0.0, SlabMode::MaxIP, u, v);
                        assert_relative_eq!(value.value().unwrap(), expected, epsilon = 1e-3);
                    }
                }
            }
        }
    }
}
