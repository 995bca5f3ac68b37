//! Homogeneous 4x4 transforms and parent-frame resolution.
//!
//! Positions live in three frames: the local frame of whatever defines them,
//! the shared physical (world) frame, and the volume's voxel index frame.
//! Only affine transforms are composed here; a non-linear parent transform is
//! reported to the caller and skipped.

use std::ops::Mul;

/// Pivots smaller than this are treated as zero when inverting.
const SINGULAR_EPS: f64 = 1e-12;

/// Row-major 4x4 homogeneous matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine4 {
    rows: [[f64; 4]; 4],
}

impl Default for Affine4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine4 {
    pub const fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    pub fn translation(offset: [f64; 3]) -> Self {
        let mut m = Self::identity();
        for (axis, value) in offset.into_iter().enumerate() {
            m.rows[axis][3] = value;
        }
        m
    }

    pub fn scaling(factors: [f64; 3]) -> Self {
        let mut m = Self::identity();
        for (axis, value) in factors.into_iter().enumerate() {
            m.rows[axis][axis] = value;
        }
        m
    }

    /// Builds the index-to-physical matrix of a grid from its origin, voxel
    /// spacing and the unit direction of each index axis.
    pub fn from_origin_spacing_directions(
        origin: [f64; 3],
        spacing: [f64; 3],
        directions: [[f64; 3]; 3],
    ) -> Self {
        let mut m = Self::identity();
        for row in 0..3 {
            for col in 0..3 {
                m.rows[row][col] = directions[col][row] * spacing[col];
            }
            m.rows[row][3] = origin[row];
        }
        m
    }

    pub fn rows(&self) -> &[[f64; 4]; 4] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Applies the matrix to `[x, y, z, 1]` and drops the homogeneous
    /// coordinate, dividing by it when it is not 1.
    pub fn transform_point(&self, point: [f64; 3]) -> [f64; 3] {
        let p = [point[0], point[1], point[2], 1.0];
        let mut out = [0.0; 4];
        for (row, value) in self.rows.iter().zip(out.iter_mut()) {
            *value = row.iter().zip(p.iter()).map(|(a, b)| a * b).sum();
        }
        let w = out[3];
        if w != 0.0 && w != 1.0 {
            [out[0] / w, out[1] / w, out[2] / w]
        } else {
            [out[0], out[1], out[2]]
        }
    }

    /// Gauss-Jordan elimination with partial pivoting. Returns `None` for a
    /// singular matrix.
    pub fn try_inverse(&self) -> Option<Self> {
        let mut a = self.rows;
        let mut inv = Self::identity().rows;

        for col in 0..4 {
            let pivot = (col..4).max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
            let pivot_value = a[pivot][col];
            if !pivot_value.is_finite() || pivot_value.abs() < SINGULAR_EPS {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = 1.0 / pivot_value;
            for k in 0..4 {
                a[col][k] *= scale;
                inv[col][k] *= scale;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }

        Some(Self { rows: inv })
    }
}

impl Mul for Affine4 {
    type Output = Affine4;

    fn mul(self, rhs: Affine4) -> Affine4 {
        let mut out = [[0.0; 4]; 4];
        for (i, out_row) in out.iter_mut().enumerate() {
            for (j, value) in out_row.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Affine4 { rows: out }
    }
}

/// Transform attached to a node's parent frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ParentTransform {
    /// Affine local-to-parent matrix.
    Linear(Affine4),
    /// A deformable (grid, b-spline, ...) transform. Never composed.
    NonLinear { description: String },
}

impl ParentTransform {
    pub fn is_linear(&self) -> bool {
        matches!(self, ParentTransform::Linear(_))
    }
}

/// Outcome of looking up the matrix of an optional parent transform.
#[derive(Debug, PartialEq)]
pub(crate) enum ParentMatrix {
    Identity,
    Linear(Affine4),
    /// A non-linear transform was present and has been skipped.
    Ignored,
}

impl ParentMatrix {
    pub(crate) fn resolve(parent: Option<&ParentTransform>) -> Self {
        match parent {
            None => ParentMatrix::Identity,
            Some(ParentTransform::Linear(m)) => ParentMatrix::Linear(*m),
            Some(ParentTransform::NonLinear { .. }) => ParentMatrix::Ignored,
        }
    }

    pub(crate) fn is_ignored(&self) -> bool {
        matches!(self, ParentMatrix::Ignored)
    }

    pub(crate) fn matrix(&self) -> Affine4 {
        match self {
            ParentMatrix::Linear(m) => *m,
            ParentMatrix::Identity | ParentMatrix::Ignored => Affine4::identity(),
        }
    }
}
