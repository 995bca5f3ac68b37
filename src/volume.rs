use crate::enums::Interpolation;
use crate::interpolator::Interpolator;
use crate::transform::{Affine4, ParentTransform};

use ndarray::{Array3, Array4, ArrayView3, Axis};

/// Dense scalar grid with its placement in physical space.
///
/// The grid is stored `(depth, height, width)`, so the index-space point
/// `(i, j, k)` addresses element `[k, j, i]`. Grid and index-to-physical
/// matrix are fixed at construction; only the parent transform can be
/// replaced afterwards.
#[derive(Clone, Debug, Default)]
pub struct Volume {
    data: Array3<f32>,
    index_to_physical: Affine4,
    parent_transform: Option<ParentTransform>,
}

impl Volume {
    pub fn new(data: Array3<f32>, index_to_physical: Affine4) -> Self {
        Self {
            data,
            index_to_physical,
            parent_transform: None,
        }
    }

    /// Axis-aligned grid with the given `(x, y, z)` voxel spacing and origin.
    pub fn with_spacing(data: Array3<f32>, spacing: (f64, f64, f64), origin: [f64; 3]) -> Self {
        let matrix =
            Affine4::translation(origin) * Affine4::scaling([spacing.0, spacing.1, spacing.2]);
        Self::new(data, matrix)
    }

    /// Keeps only the first component of a `(depth, height, width, components)`
    /// grid.
    pub fn from_components(data: Array4<f32>, index_to_physical: Affine4) -> Self {
        let first = data.index_axis_move(Axis(3), 0);
        Self::new(first, index_to_physical)
    }

    pub fn with_parent_transform(mut self, parent: ParentTransform) -> Self {
        self.parent_transform = Some(parent);
        self
    }

    pub fn set_parent_transform(&mut self, parent: Option<ParentTransform>) {
        self.parent_transform = parent;
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a view of the underlying data
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    pub fn index_to_physical(&self) -> &Affine4 {
        &self.index_to_physical
    }

    pub fn parent_transform(&self) -> Option<&ParentTransform> {
        self.parent_transform.as_ref()
    }

    /// Samples the grid at a continuous index-space position. `None` means
    /// the position lies outside the grid.
    pub fn sample_index(&self, point: [f64; 3], interpolation: Interpolation) -> Option<f64> {
        let view = self.data.view();
        match interpolation {
            Interpolation::Trilinear => Interpolator::trilinear_interpolate(&view, point),
            Interpolation::Nearest => Interpolator::nearest(&view, point),
        }
    }
}
