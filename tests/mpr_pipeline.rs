use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use dicom_mpr::interaction::HitTarget;
use dicom_mpr::plane::solve_plane;
use dicom_mpr::{
    FrameQueue, HandleAxis, ImageSurface, MprViewer, Orientation, ViewerConfig, VolumeGrid,
    VolumeMetadata,
};
use glam::{Quat, Vec2};
use web_time::Instant;

const SIZE: usize = 9;
const VIEWPORT: u32 = 100;

/// Every voxel holds ten times its column index.
fn column_ramp() -> VolumeGrid {
    let data = (0..SIZE * SIZE * SIZE)
        .map(|i| (i % SIZE) as f32 * 10.0)
        .collect();
    let metadata = VolumeMetadata {
        window_center: 40.0,
        window_width: 80.0,
        ..VolumeMetadata::default()
    };
    VolumeGrid::new(data, (SIZE, SIZE, SIZE), metadata).unwrap()
}

struct Harness {
    viewer: MprViewer,
    surface: ImageSurface,
    frames: FrameQueue,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        let mut harness = Self {
            viewer: MprViewer::new(ViewerConfig::default()),
            surface: ImageSurface::new(),
            frames: FrameQueue::new(),
            now: Instant::now(),
        };
        harness.viewer.load_volume(column_ramp(), &mut harness.frames);
        for orientation in Orientation::ALL {
            harness.viewer.resize(
                orientation,
                VIEWPORT,
                VIEWPORT,
                harness.now,
                &mut harness.surface,
                &mut harness.frames,
            );
        }
        harness.pump();
        harness
    }

    /// Advance past throttling and resize quiet time, then fire every
    /// pending callback once.
    fn pump(&mut self) {
        self.now += Duration::from_millis(200);
        for orientation in self.frames.take() {
            self.viewer
                .frame(orientation, self.now, &mut self.surface, &mut self.frames);
        }
    }

    fn drag(&mut self, orientation: Orientation, from: Vec2, to: Vec2) -> Option<HitTarget> {
        let target = self.viewer.pointer_down(orientation, from);
        self.viewer
            .pointer_move(orientation, to, Vec2::ZERO, &mut self.frames);
        self.viewer.pointer_up();
        target
    }

    fn center_gray(&self, orientation: Orientation) -> u8 {
        let image = self.surface.image(orientation).unwrap();
        image.get_pixel(VIEWPORT / 2, VIEWPORT / 2).0[0]
    }
}

#[test]
fn loading_centres_every_slice() {
    let harness = Harness::new();
    let state = harness.viewer.state().unwrap();
    for orientation in Orientation::ALL {
        assert_eq!(state.position(orientation), SIZE / 2);
        assert_eq!(state.thickness(orientation), 0.0);
        assert_eq!(state.rotation(orientation), Quat::IDENTITY);
    }
    assert_eq!(harness.surface.presented(), 3);
}

#[test]
fn moving_a_line_redraws_the_other_view() {
    let mut harness = Harness::new();
    // Column 4 of the ramp is exactly the window centre.
    assert_eq!(harness.center_gray(Orientation::Sagittal), 128);

    let target = harness.drag(
        Orientation::Axial,
        Vec2::new(0.0, -0.6),
        Vec2::new(0.5, -0.6),
    );
    assert_eq!(target, Some(HitTarget::CrosshairLine(HandleAxis::Vertical)));
    assert_eq!(harness.viewer.state().unwrap().position(Orientation::Sagittal), 6);

    harness.pump();
    assert_eq!(harness.center_gray(Orientation::Sagittal), 191);
}

#[test]
fn centre_drag_moves_both_lines() {
    let mut harness = Harness::new();
    let target = harness.drag(Orientation::Axial, Vec2::ZERO, Vec2::new(0.5, 0.5));
    assert_eq!(target, Some(HitTarget::Center));
    let state = harness.viewer.state().unwrap();
    assert_eq!(state.position(Orientation::Sagittal), 6);
    assert_eq!(state.position(Orientation::Coronal), 2);
    assert_eq!(state.position(Orientation::Axial), 4);
}

#[test]
fn slab_handle_sets_thickness_of_its_line() {
    let mut harness = Harness::new();
    let target = harness.drag(
        Orientation::Axial,
        Vec2::new(0.4, 0.0),
        Vec2::new(0.4, 0.25),
    );
    assert_eq!(target, Some(HitTarget::SlabHandle(HandleAxis::Horizontal)));
    let state = harness.viewer.state().unwrap();
    approx::assert_relative_eq!(state.thickness(Orientation::Coronal), 2.0, epsilon = 1e-4);
    assert_eq!(state.thickness(Orientation::Sagittal), 0.0);
}

#[test]
fn rotation_handle_turns_the_other_planes() {
    let mut harness = Harness::new();
    let target = harness.drag(
        Orientation::Axial,
        Vec2::new(0.96, 0.0),
        Vec2::new(0.0, 0.96),
    );
    assert_eq!(target, Some(HitTarget::RotationHandle(HandleAxis::Horizontal)));

    let state = harness.viewer.state().unwrap();
    assert_eq!(state.rotation(Orientation::Axial), Quat::IDENTITY);
    assert!(
        state
            .rotation(Orientation::Coronal)
            .abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2), 1e-5)
    );
    assert!(
        state
            .rotation(Orientation::Sagittal)
            .abs_diff_eq(Quat::from_rotation_z(-FRAC_PI_2), 1e-5)
    );

    let grid = harness.viewer.volume().unwrap();
    let normals: Vec<_> = Orientation::ALL
        .iter()
        .map(|&orientation| solve_plane(orientation, state, grid).normal)
        .collect();
    for i in 0..3 {
        for j in i + 1..3 {
            assert!(normals[i].dot(normals[j]).abs() < 1e-5);
        }
    }
}

#[test]
fn reloading_resets_shared_state() {
    let mut harness = Harness::new();
    harness.drag(Orientation::Axial, Vec2::ZERO, Vec2::new(0.5, 0.5));
    let data = vec![0.0; 4 * 6 * 2];
    let grid = VolumeGrid::new(data, (4, 6, 2), VolumeMetadata::default()).unwrap();
    harness.viewer.load_volume(grid, &mut harness.frames);

    let state = harness.viewer.state().unwrap();
    assert_eq!(state.dims(), (4, 6, 2));
    assert_eq!(state.position(Orientation::Sagittal), 2);
    assert_eq!(state.position(Orientation::Coronal), 3);
    assert_eq!(state.position(Orientation::Axial), 1);
    harness.pump();
    assert_eq!(harness.surface.presented(), 6);
}
