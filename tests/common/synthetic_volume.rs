use ndarray::Array3;
use volume_line_profile::{Affine4, Volume};

/// Every voxel holds `value`.
#[allow(dead_code)]
pub fn constant_volume(dim: (usize, usize, usize), value: f32) -> Volume {
    Volume::new(Array3::from_elem(dim, value), Affine4::identity())
}

/// Voxel `(i, j, k)` holds `i + 10 j + 100 k`, a field trilinear sampling
/// reproduces exactly.
#[allow(dead_code)]
pub fn ramp_volume(dim: (usize, usize, usize), index_to_physical: Affine4) -> Volume {
    let data = Array3::from_shape_fn(dim, |(k, j, i)| (i + 10 * j + 100 * k) as f32);
    Volume::new(data, index_to_physical)
}

#[allow(dead_code)]
pub fn ramp_value(point: [f64; 3]) -> f64 {
    point[0] + 10.0 * point[1] + 100.0 * point[2]
}

#[allow(dead_code)]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
