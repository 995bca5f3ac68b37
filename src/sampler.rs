//! Line sampling: endpoint resolution, index-space subdivision, probing and
//! table output.

use crate::enums::Interpolation;
use crate::line::LineDefinition;
use crate::table::{DISTANCE_COLUMN, INTENSITY_COLUMN, Table};
use crate::transform::{Affine4, ParentMatrix, ParentTransform};
use crate::volume::Volume;

use log::{debug, warn};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_RESOLUTION: usize = 100;
pub const MIN_RESOLUTION: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("The {0} transform is not invertible")]
    DegenerateTransform(&'static str),

    #[error("Volume has no voxels (dimensions {0:?})")]
    EmptyVolume((usize, usize, usize)),
}

/// Which input carried an ignored transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformSubject {
    Line,
    Volume,
}

impl fmt::Display for TransformSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformSubject::Line => f.write_str("line"),
            TransformSubject::Volume => f.write_str("volume"),
        }
    }
}

/// Non-fatal conditions met during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileWarning {
    /// A non-linear parent transform was skipped.
    UnsupportedTransform { subject: TransformSubject },
}

impl fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileWarning::UnsupportedTransform { subject } => write!(
                f,
                "cannot handle non-linear transforms, ignoring transform of the input {subject}"
            ),
        }
    }
}

/// Parallel distance/intensity sequences of one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSeries {
    pub distances: Vec<f64>,
    pub intensities: Vec<f64>,
    /// Sample positions in the volume's index frame.
    pub index_points: Vec<[f64; 3]>,
    /// Physical length of the segment.
    pub length: f64,
}

impl SampleSeries {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileReport {
    pub series: SampleSeries,
    pub warnings: Vec<ProfileWarning>,
}

/// Endpoints in the physical frame and the physical-to-index matrix.
#[derive(Debug)]
struct ResolvedFrames {
    start: [f64; 3],
    end: [f64; 3],
    index_from_physical: Affine4,
}

#[derive(Clone, Copy, Debug)]
pub struct LineSampler {
    resolution: usize,
    interpolation: Interpolation,
    fill_value: f64,
}

impl Default for LineSampler {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl LineSampler {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            interpolation: Interpolation::default(),
            fill_value: 0.0,
        }
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Intensity reported for samples outside the grid.
    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Samples the volume along the line and replaces the `Distance` and
    /// `Intensity` columns of `table`.
    ///
    /// # Errors
    ///
    /// Fails before touching `table` when the resolution is below 2, an
    /// endpoint is not finite, the volume is empty or a transform cannot be
    /// inverted.
    pub fn compute_profile(
        &self,
        volume: &Volume,
        line: &LineDefinition,
        table: &mut Table,
    ) -> Result<ProfileReport, ProfileError> {
        let report = self.sample(volume, line)?;
        write_series(table, &report.series);
        Ok(report)
    }

    /// Same as [`compute_profile`](Self::compute_profile) without a table.
    pub fn sample(
        &self,
        volume: &Volume,
        line: &LineDefinition,
    ) -> Result<ProfileReport, ProfileError> {
        self.validate(volume, line)?;

        let mut warnings = Vec::new();
        let frames = resolve_frames(volume, line, &mut warnings)?;
        let series = self.sample_resolved(volume, &frames);

        Ok(ProfileReport { series, warnings })
    }

    fn validate(&self, volume: &Volume, line: &LineDefinition) -> Result<(), ProfileError> {
        if self.resolution < MIN_RESOLUTION {
            return Err(ProfileError::InvalidParameter(format!(
                "line resolution must be at least {MIN_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if !line.is_finite() {
            return Err(ProfileError::InvalidParameter(format!(
                "line endpoints must be finite, got {:?} and {:?}",
                line.start(),
                line.end()
            )));
        }
        if volume.is_empty() {
            return Err(ProfileError::EmptyVolume(volume.dim()));
        }
        Ok(())
    }

    fn sample_resolved(&self, volume: &Volume, frames: &ResolvedFrames) -> SampleSeries {
        let length = distance(frames.start, frames.end);
        let start = frames.index_from_physical.transform_point(frames.start);
        let end = frames.index_from_physical.transform_point(frames.end);
        debug!(
            "sampling {} points from {start:?} to {end:?} (index frame), length {length:.3}",
            self.resolution
        );

        let intervals = (self.resolution - 1) as f64;
        let step = length / intervals;

        let last = self.resolution - 1;
        let index_points: Vec<[f64; 3]> = (0..self.resolution)
            .map(|i| {
                if i == last {
                    return end;
                }
                let i = i as f64;
                [
                    start[0] + (end[0] - start[0]) * i / intervals,
                    start[1] + (end[1] - start[1]) * i / intervals,
                    start[2] + (end[2] - start[2]) * i / intervals,
                ]
            })
            .collect();

        let distances = (0..self.resolution).map(|i| i as f64 * step).collect();

        let mut outside = 0usize;
        let intensities = index_points
            .iter()
            .map(|&p| {
                volume
                    .sample_index(p, self.interpolation)
                    .unwrap_or_else(|| {
                        outside += 1;
                        self.fill_value
                    })
            })
            .collect();
        if outside > 0 {
            debug!("{outside} of {} samples fell outside the volume", self.resolution);
        }

        SampleSeries {
            distances,
            intensities,
            index_points,
            length,
        }
    }
}

/// Runs a [`LineSampler`] with the given resolution and default settings.
pub fn compute_profile(
    volume: &Volume,
    line: &LineDefinition,
    resolution: usize,
    table: &mut Table,
) -> Result<ProfileReport, ProfileError> {
    LineSampler::new(resolution).compute_profile(volume, line, table)
}

fn resolve_frames(
    volume: &Volume,
    line: &LineDefinition,
    warnings: &mut Vec<ProfileWarning>,
) -> Result<ResolvedFrames, ProfileError> {
    let line_to_physical = parent_matrix(line.parent_transform(), TransformSubject::Line, warnings);
    let start = line_to_physical.transform_point(line.start());
    let end = line_to_physical.transform_point(line.end());

    let parent_to_physical =
        parent_matrix(volume.parent_transform(), TransformSubject::Volume, warnings);
    let parent_from_physical = parent_to_physical
        .try_inverse()
        .ok_or(ProfileError::DegenerateTransform("volume parent"))?;
    let index_from_parent = volume
        .index_to_physical()
        .try_inverse()
        .ok_or(ProfileError::DegenerateTransform("volume index-to-physical"))?;

    Ok(ResolvedFrames {
        start,
        end,
        index_from_physical: index_from_parent * parent_from_physical,
    })
}

fn parent_matrix(
    parent: Option<&ParentTransform>,
    subject: TransformSubject,
    warnings: &mut Vec<ProfileWarning>,
) -> Affine4 {
    let resolved = ParentMatrix::resolve(parent);
    if resolved.is_ignored() {
        let warning = ProfileWarning::UnsupportedTransform { subject };
        warn!("{warning}");
        warnings.push(warning);
    }
    resolved.matrix()
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}

fn write_series(table: &mut Table, series: &SampleSeries) {
    let distance_column = table.column_index_or_insert(DISTANCE_COLUMN);
    let intensity_column = table.column_index_or_insert(INTENSITY_COLUMN);
    table.set_number_of_rows(series.len());
    table.write_column(distance_column, &series.distances);
    table.write_column(intensity_column, &series.intensities);
}
