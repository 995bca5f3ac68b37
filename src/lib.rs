//! # Volume line profile
//!
//! This crate samples a 3-D scalar volume along a straight line segment and
//! writes the result as a distance/intensity table.
//!
//! The two endpoints of the line and the volume may each sit below a parent
//! transform. Endpoints are resolved into the shared physical frame, mapped
//! into the volume's voxel index frame, and the segment is subdivided there
//! into the requested number of samples. Every sample is probed with
//! trilinear interpolation; samples outside the grid get a fill value
//! (zero by default) instead of failing the run. Distances are reported in
//! physical units.
//!
//! Only affine parent transforms are composed. A non-linear parent transform
//! is skipped and reported as a [`ProfileWarning`]; the run still completes.
//!
//! The profile can be bound to a [`PlotSeries`] for display, and volumes can
//! be read from a DICOM series with [`VolumeLoader`].
//!
//! # Examples
//!
//! ## Sampling a synthetic volume
//!
//! ```
//! # use volume_line_profile::{Affine4, LineDefinition, LineSampler, Table, Volume};
//! # use ndarray::Array3;
//! let volume = Volume::new(Array3::from_elem((4, 4, 4), 5.0), Affine4::identity());
//! let line = LineDefinition::new([0.0, 0.0, 0.0], [3.0, 0.0, 0.0]);
//! let mut table = Table::new("profile");
//!
//! LineSampler::new(4)
//!     .compute_profile(&volume, &line, &mut table)
//!     .expect("valid inputs");
//!
//! assert_eq!(table.column_values("Distance"), Some(&[0.0, 1.0, 2.0, 3.0][..]));
//! assert_eq!(table.column_values("Intensity"), Some(&[5.0; 4][..]));
//! ```
//!
//! ## Profiling a DICOM series
//!
//! ```no_run
//! # use volume_line_profile::{LineDefinition, LineProfileLogic, PlotSeries, SortBy, Table, VolumeLoader};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::ImagePositionPatient)
//!     .expect("should have loaded files from directory");
//! let line = LineDefinition::new([-20.0, 10.0, 35.0], [40.0, 10.0, 35.0]);
//! let mut table = Table::new("profile");
//! let mut series = PlotSeries::new("profile");
//!
//! let mut logic = LineProfileLogic::default();
//! logic
//!     .run(&volume, &line, &mut table, 200, Some(&mut series))
//!     .expect("should have sampled the volume");
//! ```

pub mod chart;
pub mod enums;
mod interpolator;
pub mod line;
pub mod logic;
pub mod sampler;
pub mod table;
pub mod transform;
pub mod volume;
pub mod volume_loader;

pub use crate::chart::{PlotChart, PlotSeries, bind_chart, render_series};
pub use crate::enums::{Interpolation, MarkerStyle, PlotType, SortBy};
pub use crate::line::LineDefinition;
pub use crate::logic::LineProfileLogic;
pub use crate::sampler::{
    LineSampler, ProfileError, ProfileReport, ProfileWarning, SampleSeries, TransformSubject,
    compute_profile,
};
pub use crate::table::{Column, DISTANCE_COLUMN, INTENSITY_COLUMN, Table};
pub use crate::transform::{Affine4, ParentTransform};
pub use crate::volume::Volume;
pub use crate::volume_loader::{VolumeLoader, VolumeLoaderError};
