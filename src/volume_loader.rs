use crate::{enums::SortBy, transform::Affine4, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::PixelDecoder,
};
use dicom_dictionary_std::tags;
use log::{debug, info};
use ndarray::{Array2, Array3, s};
use std::{fs, path::Path};
use thiserror::Error;

/// Row and column direction of an axial series, used when a file carries no
/// Image Orientation (Patient).
const AXIAL_ORIENTATION: [f64; 6] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Invalid image orientation {0:?}")]
    InvalidOrientation([f64; 6]),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

/// One decoded slice with the attributes used for ordering and placement.
struct DecodedSlice {
    order: Option<f32>,
    position: Option<[f64; 3]>,
    image: Array2<f32>,
}

/// Placement shared by every slice of a series.
struct SeriesGeometry {
    orientation: [f64; 6],
    pixel_spacing: [f64; 2],
    slice_thickness: Option<f64>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found, dimensions are inconsistent or
    /// the series carries no pixel spacing
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut slices: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_slice(dicom_object, &sort_by))
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_slices(&mut slices, sort_by);
        Self::validate_dimensions(&slices)?;

        let geometry =
            Self::get_geometry(dicom_objects).ok_or(VolumeLoaderError::MissingSpacing)?;
        let index_to_physical = Self::index_to_physical(&slices, &geometry)?;
        let volume_array = Self::build_volume_array(&slices);

        info!(
            "loaded {} slices into a {:?} volume",
            slices.len(),
            volume_array.dim()
        );
        Ok(Volume::new(volume_array, index_to_physical))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    fn extract_slice(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<DecodedSlice> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image = Self::decode_image(dicom_object)?;
        let position = Self::get_position(dicom_object);
        Some(DecodedSlice {
            order,
            position,
            image,
        })
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    fn get_position(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<[f64; 3]> {
        let pos = dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float64()
            .ok()?;
        match pos.as_slice() {
            [x, y, z, ..] => Some([*x, *y, *z]),
            _ => None,
        }
    }

    /// First frame, first sample, with the modality rescale applied.
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        pixel_data
            .to_ndarray::<f32>()
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_slices(slices: &mut [DecodedSlice], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            slices.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            slices.reverse();
        }
    }

    fn validate_dimensions(slices: &[DecodedSlice]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].image.dim();
        if slices.iter().any(|slice| slice.image.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(slices: &[DecodedSlice]) -> Array3<f32> {
        let (height, width) = slices[0].image.dim();
        let depth = slices.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&slice.image);
        }

        volume
    }

    fn get_geometry(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
    ) -> Option<SeriesGeometry> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float64()
                .ok()?;
            let pixel_spacing = match pixel_spacing.as_slice() {
                [row, col, ..] => [*row, *col],
                _ => return None,
            };

            let orientation = dicom_object
                .element(tags::IMAGE_ORIENTATION_PATIENT)
                .ok()
                .and_then(|e| e.to_multi_float64().ok())
                .and_then(|v| <[f64; 6]>::try_from(v.as_slice()).ok())
                .unwrap_or(AXIAL_ORIENTATION);

            let slice_thickness = dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()
                .and_then(|e| e.to_float64().ok());

            Some(SeriesGeometry {
                orientation,
                pixel_spacing,
                slice_thickness,
            })
        })
    }

    /// Column index `i` runs along the row direction cosine with the column
    /// spacing, row index `j` along the column direction cosine with the row
    /// spacing, slice index `k` from the first to the last slice position.
    fn index_to_physical(
        slices: &[DecodedSlice],
        geometry: &SeriesGeometry,
    ) -> Result<Affine4, VolumeLoaderError> {
        let o = geometry.orientation;
        let invalid = || VolumeLoaderError::InvalidOrientation(o);
        let row_dir = normalize([o[0], o[1], o[2]]).ok_or_else(invalid)?;
        let col_dir = normalize([o[3], o[4], o[5]]).ok_or_else(invalid)?;
        let normal = normalize(cross(row_dir, col_dir)).ok_or_else(invalid)?;

        let origin = slices[0].position.unwrap_or([0.0; 3]);
        let (slice_dir, slice_spacing) = match Self::slice_step(slices) {
            Some(step) => step,
            None => {
                let thickness = geometry
                    .slice_thickness
                    .filter(|t| *t > 0.0)
                    .ok_or(VolumeLoaderError::MissingSpacing)?;
                (normal, thickness)
            }
        };
        debug!(
            "series origin {origin:?}, spacing ({}, {}, {slice_spacing})",
            geometry.pixel_spacing[1], geometry.pixel_spacing[0]
        );

        Ok(Affine4::from_origin_spacing_directions(
            origin,
            [
                geometry.pixel_spacing[1],
                geometry.pixel_spacing[0],
                slice_spacing,
            ],
            [row_dir, col_dir, slice_dir],
        ))
    }

    /// Average step between consecutive slice positions, as unit direction
    /// and length.
    fn slice_step(slices: &[DecodedSlice]) -> Option<([f64; 3], f64)> {
        if slices.len() < 2 {
            return None;
        }
        let first = slices.first()?.position?;
        let last = slices.last()?.position?;
        let steps = (slices.len() - 1) as f64;
        let step = [
            (last[0] - first[0]) / steps,
            (last[1] - first[1]) / steps,
            (last[2] - first[2]) / steps,
        ];
        let length = norm(step);
        let direction = normalize(step)?;
        Some((direction, length))
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn normalize(v: [f64; 3]) -> Option<[f64; 3]> {
    let n = norm(v);
    if n > 1e-9 && n.is_finite() {
        Some([v[0] / n, v[1] / n, v[2] / n])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice_at(position: Option<[f64; 3]>) -> DecodedSlice {
        DecodedSlice {
            order: position.map(|p| p[2] as f32),
            position,
            image: Array2::zeros((2, 3)),
        }
    }

    fn axial(thickness: Option<f64>) -> SeriesGeometry {
        SeriesGeometry {
            orientation: AXIAL_ORIENTATION,
            pixel_spacing: [0.5, 0.25],
            slice_thickness: thickness,
        }
    }

    #[test]
    fn slice_positions_define_the_third_axis() {
        let slices = [
            slice_at(Some([10.0, 20.0, 30.0])),
            slice_at(Some([10.0, 20.0, 28.0])),
            slice_at(Some([10.0, 20.0, 26.0])),
        ];
        let m = VolumeLoader::index_to_physical(&slices, &axial(Some(5.0))).expect("geometry");
        assert_eq!(m.transform_point([0.0, 0.0, 0.0]), [10.0, 20.0, 30.0]);
        assert_eq!(m.transform_point([4.0, 2.0, 2.0]), [11.0, 21.0, 26.0]);
    }

    #[test]
    fn single_slice_uses_thickness_along_normal() {
        let slices = [slice_at(None)];
        let m = VolumeLoader::index_to_physical(&slices, &axial(Some(3.0))).expect("geometry");
        assert_eq!(m.transform_point([0.0, 0.0, 1.0]), [0.0, 0.0, 3.0]);
    }

    #[test]
    fn single_slice_without_thickness_is_missing_spacing() {
        let slices = [slice_at(None)];
        let err = VolumeLoader::index_to_physical(&slices, &axial(None)).unwrap_err();
        assert!(matches!(err, VolumeLoaderError::MissingSpacing));
    }

    #[test]
    fn parallel_direction_cosines_are_rejected() {
        let slices = [slice_at(None)];
        let geometry = SeriesGeometry {
            orientation: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            pixel_spacing: [1.0, 1.0],
            slice_thickness: Some(1.0),
        };
        let err = VolumeLoader::index_to_physical(&slices, &geometry).unwrap_err();
        assert!(matches!(err, VolumeLoaderError::InvalidOrientation(_)));
    }

    #[test]
    fn image_position_sort_puts_highest_slice_first() {
        let mut slices = vec![
            slice_at(Some([0.0, 0.0, 1.0])),
            slice_at(Some([0.0, 0.0, 3.0])),
            slice_at(Some([0.0, 0.0, 2.0])),
        ];
        VolumeLoader::sort_slices(&mut slices, SortBy::ImagePositionPatient);
        let z: Vec<_> = slices.iter().map(|s| s.position.map(|p| p[2])).collect();
        assert_eq!(z, vec![Some(3.0), Some(2.0), Some(1.0)]);
    }
}
