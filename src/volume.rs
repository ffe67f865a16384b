use ndarray::Array3;
use thiserror::Error;

use crate::window::Rescale;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("Volume dimensions must be non-zero, got {width}x{height}x{depth}")]
    ZeroDimension {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("Voxel data has {actual} values, expected {expected}")]
    DataLengthMismatch { expected: usize, actual: usize },

    #[error("{name} must be a positive finite number, got {value}")]
    InvalidSpacing { name: &'static str, value: f32 },
}

/// Physical distance between neighbouring voxels in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub row: f32,
    pub column: f32,
    pub slice: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            row: 1.0,
            column: 1.0,
            slice: 1.0,
        }
    }
}

/// Everything about a volume except its voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMetadata {
    pub spacing: Spacing,
    pub slice_thickness: f32,
    pub rescale_slope: f32,
    pub rescale_intercept: f32,
    /// Window of the first slice, used to seed the view state.
    pub window_center: f32,
    pub window_width: f32,
}

impl Default for VolumeMetadata {
    fn default() -> Self {
        Self {
            spacing: Spacing::default(),
            slice_thickness: 1.0,
            rescale_slope: 1.0,
            rescale_intercept: 0.0,
            window_center: 0.0,
            window_width: 1.0,
        }
    }
}

/// Dense scalar volume. Immutable once built.
///
/// Voxels are stored as `(depth, height, width)` in standard layout, so the
/// flat index of `(x, y, z)` is `x + y * width + z * width * height`.
#[derive(Debug, Clone)]
pub struct VolumeGrid {
    data: Array3<f32>,
    metadata: VolumeMetadata,
}

impl VolumeGrid {
    /// Build a grid from a flat voxel buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if any dimension is zero, the buffer length does not
    /// match `width * height * depth` or a spacing value is not positive.
    pub fn new(
        data: Vec<f32>,
        (width, height, depth): (usize, usize, usize),
        metadata: VolumeMetadata,
    ) -> Result<Self, VolumeError> {
        Self::check_dimensions(width, height, depth)?;
        let expected = width * height * depth;
        let actual = data.len();
        let data = Array3::from_shape_vec((depth, height, width), data)
            .map_err(|_| VolumeError::DataLengthMismatch { expected, actual })?;
        Self::from_array(data, metadata)
    }

    /// Build a grid from a `(depth, height, width)` array.
    pub fn from_array(data: Array3<f32>, metadata: VolumeMetadata) -> Result<Self, VolumeError> {
        let (depth, height, width) = data.dim();
        Self::check_dimensions(width, height, depth)?;
        Self::check_spacing(&metadata)?;
        // Re-layout anything that is not row-major so flat indexing holds.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, metadata })
    }

    fn check_dimensions(width: usize, height: usize, depth: usize) -> Result<(), VolumeError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(VolumeError::ZeroDimension {
                width,
                height,
                depth,
            });
        }
        Ok(())
    }

    fn check_spacing(metadata: &VolumeMetadata) -> Result<(), VolumeError> {
        let values = [
            ("row spacing", metadata.spacing.row),
            ("column spacing", metadata.spacing.column),
            ("slice spacing", metadata.spacing.slice),
            ("slice thickness", metadata.slice_thickness),
        ];
        for (name, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(VolumeError::InvalidSpacing { name, value });
            }
        }
        Ok(())
    }

    /// Get the dimensions of the volume (width, height, depth)
    pub fn dims(&self) -> (usize, usize, usize) {
        let (depth, height, width) = self.data.dim();
        (width, height, depth)
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn metadata(&self) -> &VolumeMetadata {
        &self.metadata
    }

    /// Raw stored value of voxel `(x, y, z)`.
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.data.get([z, y, x]).copied()
    }

    /// Same voxels with a different seed window.
    pub(crate) fn with_window(mut self, center: f32, width: f32) -> Self {
        self.metadata.window_center = center;
        self.metadata.window_width = width;
        self
    }

    /// Smallest and largest stored value.
    pub fn value_range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Physical extent along x, y and z in millimetres.
    ///
    /// Depth counts the gaps between slice centres plus one slice thickness.
    pub fn physical_extent(&self) -> (f32, f32, f32) {
        let (width, height, depth) = self.dims();
        let spacing = self.metadata.spacing;
        (
            width as f32 * spacing.column,
            height as f32 * spacing.row,
            self.metadata.slice_spacing_extent(depth),
        )
    }
}

impl VolumeMetadata {
    pub fn rescale(&self) -> Rescale {
        Rescale {
            slope: self.rescale_slope,
            intercept: self.rescale_intercept,
        }
    }

    fn slice_spacing_extent(&self, depth: usize) -> f32 {
        self.spacing.slice * (depth as f32 - 1.0) + self.slice_thickness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize, depth: usize) -> Vec<f32> {
        (0..width * height * depth).map(|i| i as f32).collect()
    }

    #[test]
    fn flat_index_matches_xyz_layout() {
        let grid = VolumeGrid::new(ramp(3, 4, 5), (3, 4, 5), VolumeMetadata::default())
            .expect("valid grid");
        assert_eq!(grid.dims(), (3, 4, 5));
        for z in 0..5 {
            for y in 0..4 {
                for x in 0..3 {
                    let expected = (x + y * 3 + z * 3 * 4) as f32;
                    assert_eq!(grid.voxel(x, y, z), Some(expected));
                }
            }
        }
        assert_eq!(grid.voxel(3, 0, 0), None);
    }

    #[test]
    fn window_can_be_reseeded_from_value_range() {
        let grid = VolumeGrid::new(vec![-4.0, 2.0, 6.0, 0.0], (2, 2, 1), VolumeMetadata::default())
            .expect("valid grid");
        assert_eq!(grid.value_range(), (-4.0, 6.0));
        let grid = grid.with_window(1.0, 10.0);
        assert_eq!(grid.metadata().window_center, 1.0);
        assert_eq!(grid.metadata().window_width, 10.0);
        assert_eq!(grid.voxel(1, 0, 0), Some(2.0));
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = VolumeGrid::new(Vec::new(), (0, 4, 5), VolumeMetadata::default()).unwrap_err();
        assert!(matches!(err, VolumeError::ZeroDimension { width: 0, .. }));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = VolumeGrid::new(vec![0.0; 10], (2, 2, 2), VolumeMetadata::default()).unwrap_err();
        assert_eq!(
            err,
            VolumeError::DataLengthMismatch {
                expected: 8,
                actual: 10
            }
        );
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let metadata = VolumeMetadata {
            spacing: Spacing {
                row: 0.0,
                ..Spacing::default()
            },
            ..VolumeMetadata::default()
        };
        let err = VolumeGrid::new(vec![0.0; 8], (2, 2, 2), metadata).unwrap_err();
        assert!(matches!(
            err,
            VolumeError::InvalidSpacing {
                name: "row spacing",
                ..
            }
        ));
    }

    #[test]
    fn physical_extent_uses_slice_spacing_and_thickness() {
        let metadata = VolumeMetadata {
            spacing: Spacing {
                row: 0.5,
                column: 0.25,
                slice: 2.0,
            },
            slice_thickness: 3.0,
            ..VolumeMetadata::default()
        };
        let grid = VolumeGrid::new(vec![0.0; 4 * 8 * 5], (4, 8, 5), metadata).unwrap();
        assert_eq!(grid.physical_extent(), (1.0, 4.0, 2.0 * 4.0 + 3.0));
    }
}
