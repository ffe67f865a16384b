use crate::{
    enums::SortBy,
    volume::{Spacing, VolumeError, VolumeGrid, VolumeMetadata},
};

use dicom::{
    core::Tag,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Invalid volume: {0}")]
    Volume(#[from] VolumeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

/// Attributes of one slice that seed the volume metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SliceAttributes {
    /// Window center and width, only when both are present.
    window: Option<(f32, f32)>,
    rescale_slope: Option<f32>,
    rescale_intercept: Option<f32>,
    slice_thickness: Option<f32>,
    spacing_between_slices: Option<f32>,
}

/// One decoded slice with the keys it is ordered by.
#[derive(Clone)]
struct Slice {
    order: Option<f32>,
    /// Z component of Image Position (Patient).
    position: Option<f32>,
    attributes: SliceAttributes,
    pixels: Array2<f32>,
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
    /// Stored values are kept as they are. Rescale slope and intercept and
    /// the window of the first slice after sorting end up in the volume
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<VolumeGrid, VolumeLoaderError> {
        let mut slices: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(|dicom_object| Self::extract_slice(dicom_object, sort_by))
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        if slices.len() < dicom_objects.len() {
            warn!(
                skipped = dicom_objects.len() - slices.len(),
                "some DICOM objects had no decodable image"
            );
        }

        Self::sort_slices(&mut slices, sort_by);
        Self::validate_dimensions(&slices)?;

        let (row, column) = Self::pixel_spacing(dicom_objects).ok_or(VolumeLoaderError::MissingSpacing)?;
        let data = Self::build_volume_array(&slices);
        let metadata = Self::metadata(&slices, row, column);
        let mut volume = VolumeGrid::from_array(data, metadata)?;
        if slices[0].attributes.window.is_none() {
            let rescale = metadata.rescale();
            let (low, high) = volume.value_range();
            let (low, high) = (rescale.apply(low), rescale.apply(high));
            debug!(low, high, "no window in dataset, using value range");
            volume = volume.with_window((low + high) / 2.0, (high - low).abs());
        }
        let (width, height, depth) = volume.dims();
        info!(width, height, depth, spacing = ?metadata.spacing, "volume assembled");
        Ok(volume)
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
        sort_by: SortBy,
    ) -> Result<VolumeGrid, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> = paths
            .par_iter()
            .map(|path| open_file(path.as_ref()))
            .collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<VolumeGrid, VolumeLoaderError> {
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
        debug!(files = paths.len(), "reading DICOM directory");

        Self::load_from_file_paths(&paths, sort_by)
    }

    fn extract_slice(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<Slice> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let pixels = Self::decode_image(dicom_object)?;
        Some(Slice {
            order,
            position: Self::position_z(dicom_object),
            attributes: Self::attributes(dicom_object),
            pixels,
        })
    }

    fn attributes(dicom_object: &FileDicomObject<InMemDicomObject>) -> SliceAttributes {
        let window = Self::float(dicom_object, tags::WINDOW_CENTER)
            .zip(Self::float(dicom_object, tags::WINDOW_WIDTH));
        SliceAttributes {
            window,
            rescale_slope: Self::float(dicom_object, tags::RESCALE_SLOPE),
            rescale_intercept: Self::float(dicom_object, tags::RESCALE_INTERCEPT),
            slice_thickness: Self::float(dicom_object, tags::SLICE_THICKNESS),
            spacing_between_slices: Self::float(dicom_object, tags::SPACING_BETWEEN_SLICES),
        }
    }

    /// Metadata seeded from the first of the sorted slices. A missing window
    /// is left at the default for the caller to fill in.
    fn metadata(slices: &[Slice], row: f32, column: f32) -> VolumeMetadata {
        let first = slices[0].attributes;
        let slice_spacing = Self::slice_spacing(slices)
            .or(first.spacing_between_slices)
            .or(first.slice_thickness)
            .unwrap_or(1.0);
        let defaults = VolumeMetadata::default();
        let (window_center, window_width) = first
            .window
            .unwrap_or((defaults.window_center, defaults.window_width));
        VolumeMetadata {
            spacing: Spacing {
                row,
                column,
                slice: slice_spacing,
            },
            slice_thickness: first.slice_thickness.unwrap_or(slice_spacing),
            rescale_slope: first.rescale_slope.unwrap_or(1.0),
            rescale_intercept: first.rescale_intercept.unwrap_or(0.0),
            window_center,
            window_width,
        }
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => Some(Some(Self::position_z(dicom_object)?)),
            SortBy::TablePosition => Some(Self::float(dicom_object, tags::TABLE_POSITION)),
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

    fn position_z(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<f32> {
        dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?
            .get(2)
            .copied()
    }

    /// First value of a numeric attribute.
    fn float(dicom_object: &FileDicomObject<InMemDicomObject>, tag: Tag) -> Option<f32> {
        dicom_object
            .element(tag)
            .ok()?
            .to_multi_float32()
            .ok()?
            .first()
            .copied()
            .filter(|value| value.is_finite())
    }

    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    /// Highest position first, matching head-to-feet axial stacks.
    fn sort_slices(slices: &mut [Slice], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            slices.sort_by(|a, b| a.order.partial_cmp(&b.order).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            slices.reverse();
        }
    }

    fn validate_dimensions(slices: &[Slice]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].pixels.dim();
        if slices.iter().any(|slice| slice.pixels.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(slices: &[Slice]) -> Array3<f32> {
        let (height, width) = slices[0].pixels.dim();
        let depth = slices.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&slice.pixels);
        }

        volume
    }

    /// Mean distance between neighbouring slice positions, if every slice
    /// has one.
    fn slice_spacing(slices: &[Slice]) -> Option<f32> {
        if slices.len() < 2 {
            return None;
        }
        let positions: Option<Vec<f32>> = slices.iter().map(|slice| slice.position).collect();
        let positions = positions?;
        let total: f32 = positions
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).abs())
            .sum();
        let spacing = total / (positions.len() - 1) as f32;
        (spacing > 0.0 && spacing.is_finite()).then_some(spacing)
    }

    fn pixel_spacing(dicom_objects: &[FileDicomObject<InMemDicomObject>]) -> Option<(f32, f32)> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;

            Some((*pixel_spacing.first()?, *pixel_spacing.get(1)?))
        })
    }
}
