use glam::Vec3;
use ndarray::Array3;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Convert a normalized texture coordinate into a clamped voxel-index
    /// coordinate. Voxel `i` of `n` has its centre at `(i + 0.5) / n`.
    #[inline]
    fn to_index_space(coord: f32, count: usize) -> f32 {
        let src = coord * count as f32 - 0.5;
        src.max(0.0).min((count - 1) as f32)
    }

    /// Sample `data` (shaped `(depth, height, width)`) at a normalized
    /// `(x, y, z)` coordinate. Coordinates past the outer voxel centres clamp
    /// to the edge voxels.
    #[inline]
    pub(crate) fn trilinear_interpolate(data: &Array3<f32>, coord: Vec3) -> f32 {
        let (depth, height, width) = data.dim();

        let x = Self::to_index_space(coord.x, width);
        let y = Self::to_index_space(coord.y, height);
        let z = Self::to_index_space(coord.z, depth);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let z0 = z.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let z1 = (z0 + 1).min(depth - 1);

        let dx = x - x0 as f32;
        let dy = y - y0 as f32;
        let dz = z - z0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;
        let one_minus_dz = 1.0 - dz;

        let lerp_row = |zi: usize, yi: usize| {
            data[[zi, yi, x0]].mul_add(one_minus_dx, data[[zi, yi, x1]] * dx)
        };

        let v0 = lerp_row(z0, y0).mul_add(one_minus_dy, lerp_row(z0, y1) * dy);
        let v1 = lerp_row(z1, y0).mul_add(one_minus_dy, lerp_row(z1, y1) * dy);

        v0.mul_add(one_minus_dz, v1 * dz)
    }
}
