//! # DICOM-MPR library
//!
//! Oblique multiplanar reconstruction (MPR) of a scalar volume, shown as
//! three linked views: axial, coronal and sagittal.
//!
//! All three views read one shared [`ViewState`]: a slice position, slab
//! thickness and rotation per orientation, a window and a slab projection
//! mode. Every pixel of a view is produced by sampling the volume along an
//! arbitrarily oriented cutting plane with trilinear interpolation. Slabs are
//! projected with a maximum, minimum or average intensity projection.
//!
//! Each view carries a crosshair that marks where the other two planes cut
//! it. Dragging the crosshair moves those planes, dragging its slab handles
//! thickens them and dragging its rotation handles turns them, so an edit in
//! one view shows up in the other two on their next frame.
//!
//! Volumes are loaded from a folder of ".dcm" files with [`VolumeLoader`] or
//! built directly from voxel data with [`VolumeGrid::new`]. DICOM files are
//! assumed to have the following attributes:
//!   - Axial data set
//!   - No multiframe (always the first frame is used)
//!   - Images from the same series (Series Instance UID) and acquisition
//!     (Acquisition Number)
//!
//! Outside the crosshair the primary button runs a [`PointerTool`]: window
//! and level by pointer motion, or scrolling through slices. Scrolling moves
//! the view the drag started in and only whole steps of accumulated travel
//! count, truncated toward zero, so a partial step carries over in either
//! direction.
//!
//! Drawing is driven by the host. Views ask a [`FrameRequester`] for a frame
//! callback whenever the state changes and draw at most `fps` times a
//! second when it fires. Frames land on a [`DisplaySurface`].
//!
//! # Roadmap
//!
//!  - GPU processor for sampling using WGPU and compute shaders
//!  - Cubic interpolation
//!  - Per-slice rescale for series that vary it
//!
//! # Examples
//!
//! ## Rendering the three views of a DICOM series
//!
//! ```no_run
//! # use dicom_mpr::{FrameQueue, ImageSurface, MprViewer, Orientation, SortBy, ViewerConfig, VolumeLoader};
//! # use web_time::Instant;
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::ImagePositionPatient)
//!     .expect("should have loaded files from directory");
//!
//! let mut viewer = MprViewer::new(ViewerConfig::default());
//! let mut surface = ImageSurface::new();
//! let mut frames = FrameQueue::new();
//! viewer.load_volume(volume, &mut frames);
//!
//! let now = Instant::now();
//! for orientation in Orientation::ALL {
//!     viewer.resize(orientation, 512, 512, now, &mut surface, &mut frames);
//! }
//! for orientation in frames.take() {
//!     viewer.frame(orientation, now, &mut surface, &mut frames);
//! }
//! surface
//!     .image(Orientation::Coronal)
//!     .expect("should have drawn the coronal view")
//!     .save("coronal.png")
//!     .expect("should have written the image");
//! ```
//!
//! ## Sampling a plane without any views
//!
//! ```
//! # use dicom_mpr::{Orientation, SlabMode, ViewState, VolumeGrid, VolumeMetadata, plane::solve_plane, sampler::sample};
//! let grid = VolumeGrid::new(vec![1.0, 5.0, 3.0, 9.0, 2.0], (1, 1, 5), VolumeMetadata::default())
//!     .expect("should be a valid grid");
//! let mut state = ViewState::for_volume(&grid);
//! state.set_thickness(Orientation::Axial, 5.0);
//!
//! let plane = solve_plane(Orientation::Axial, &state, &grid);
//! let projected = sample(&plane, &grid, 5.0, SlabMode::MaxIP, 0.0, 0.0);
//! assert!((projected.value().unwrap() - 9.0).abs() < 1e-4);
//! ```

pub mod config;
pub mod enums;
pub mod interaction;
mod interpolator;
pub mod overlay;
pub mod plane;
pub mod rotation;
pub mod sampler;
pub mod scheduler;
pub mod view;
pub mod view_state;
pub mod viewer;
pub mod volume;
pub mod volume_loader;
pub mod window;

pub use config::ViewerConfig;
pub use enums::{HandleAxis, Orientation, Processor, SlabMode, SortBy};
pub use interaction::PointerTool;
pub use scheduler::{FrameQueue, FrameRequester};
pub use view::{DisplayBuffer, DisplaySurface, ImageSurface, View};
pub use view_state::ViewState;
pub use viewer::MprViewer;
pub use volume::{Spacing, VolumeError, VolumeGrid, VolumeMetadata};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
