use ndarray::ArrayView3;

/// Slack allowed past the outermost voxel before a point counts as outside.
const BOUNDS_TOLERANCE: f64 = 1e-6;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Clamps a continuous index onto `[0, len - 1]`, or `None` when it lies
    /// further outside than the bounds tolerance.
    #[inline]
    fn clamp_to_axis(coord: f64, len: usize) -> Option<f64> {
        let max = (len - 1) as f64;
        if !coord.is_finite() || coord < -BOUNDS_TOLERANCE || coord > max + BOUNDS_TOLERANCE {
            return None;
        }
        Some(coord.clamp(0.0, max))
    }

    /// `point` is `(i, j, k)`; the grid is stored `[k, j, i]`.
    #[inline]
    fn grid_coords(grid: &ArrayView3<f32>, point: [f64; 3]) -> Option<[f64; 3]> {
        let (depth, height, width) = grid.dim();
        if depth == 0 || height == 0 || width == 0 {
            return None;
        }
        Some([
            Self::clamp_to_axis(point[0], width)?,
            Self::clamp_to_axis(point[1], height)?,
            Self::clamp_to_axis(point[2], depth)?,
        ])
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(grid: &ArrayView3<f32>, point: [f64; 3]) -> Option<f64> {
        let [x, y, z] = Self::grid_coords(grid, point)?;
        let (depth, height, width) = grid.dim();

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let z0 = z.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let z1 = (z0 + 1).min(depth - 1);

        let dx = x - x0 as f64;
        let dy = y - y0 as f64;
        let dz = z - z0 as f64;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;
        let one_minus_dz = 1.0 - dz;

        let v = |k: usize, j: usize, i: usize| f64::from(grid[[k, j, i]]);

        let c00 = v(z0, y0, x0).mul_add(one_minus_dx, v(z0, y0, x1) * dx);
        let c01 = v(z0, y1, x0).mul_add(one_minus_dx, v(z0, y1, x1) * dx);
        let c10 = v(z1, y0, x0).mul_add(one_minus_dx, v(z1, y0, x1) * dx);
        let c11 = v(z1, y1, x0).mul_add(one_minus_dx, v(z1, y1, x1) * dx);

        let c0 = c00.mul_add(one_minus_dy, c01 * dy);
        let c1 = c10.mul_add(one_minus_dy, c11 * dy);

        Some(c0.mul_add(one_minus_dz, c1 * dz))
    }

    #[inline]
    pub(crate) fn nearest(grid: &ArrayView3<f32>, point: [f64; 3]) -> Option<f64> {
        let [x, y, z] = Self::grid_coords(grid, point)?;
        let value = grid[[z.round() as usize, y.round() as usize, x.round() as usize]];
        Some(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn ramp() -> Array3<f32> {
        // value = i + 10 j + 100 k
        Array3::from_shape_fn((3, 3, 3), |(k, j, i)| (i + 10 * j + 100 * k) as f32)
    }

    #[test]
    fn grid_nodes_return_exact_voxel_values() {
        let grid = ramp();
        let view = grid.view();
        assert_eq!(Interpolator::trilinear_interpolate(&view, [2.0, 1.0, 0.0]), Some(12.0));
        assert_eq!(Interpolator::trilinear_interpolate(&view, [0.0, 2.0, 2.0]), Some(220.0));
    }

    #[test]
    fn trilinear_is_exact_on_linear_fields() {
        let grid = ramp();
        let value = Interpolator::trilinear_interpolate(&grid.view(), [0.5, 1.25, 1.75])
            .expect("inside the grid");
        assert!((value - (0.5 + 12.5 + 175.0)).abs() < 1e-9);
    }

    #[test]
    fn upper_boundary_is_inside() {
        let grid = ramp();
        assert_eq!(Interpolator::trilinear_interpolate(&grid.view(), [2.0, 2.0, 2.0]), Some(222.0));
    }

    #[test]
    fn outside_points_have_no_value() {
        let grid = ramp();
        let view = grid.view();
        assert!(Interpolator::trilinear_interpolate(&view, [-0.5, 0.0, 0.0]).is_none());
        assert!(Interpolator::trilinear_interpolate(&view, [0.0, 2.01, 0.0]).is_none());
        assert!(Interpolator::nearest(&view, [0.0, 0.0, f64::NAN]).is_none());
    }

    #[test]
    fn nearest_rounds_to_closest_voxel() {
        let grid = ramp();
        assert_eq!(Interpolator::nearest(&grid.view(), [0.4, 1.6, 0.5]), Some(120.0));
    }

    #[test]
    fn single_voxel_grid_is_sampled_at_its_node() {
        let grid = Array3::from_elem((1, 1, 1), 7.0f32);
        assert_eq!(Interpolator::trilinear_interpolate(&grid.view(), [0.0, 0.0, 0.0]), Some(7.0));
    }
}
