//! One orientation's view: plane, framing, scheduling and pixels.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, trace};
use web_time::Instant;

use crate::config::ViewerConfig;
use crate::enums::{Orientation, Processor};
use crate::interaction::{DragGeometry, HitTarget, HoverFeedback, hit_test};
use crate::overlay::{Crosshair, OverlayLine, marker_color};
use crate::plane::{Framing, PLANE_EPSILON, Plane, PlaneSolver};
use crate::sampler::sample;
use crate::scheduler::{FrameAction, FrameRequester, FrameScheduler};
use crate::view_state::ViewState;
use crate::volume::VolumeGrid;
use crate::window::to_display;

/// One drawn frame of display intensities in `[0, 1]`, indexed
/// `[row, column]` with row 0 on top.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBuffer {
    pixels: Array2<f32>,
}

impl DisplayBuffer {
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn get(&self, column: usize, row: usize) -> Option<f32> {
        self.pixels.get([row, column]).copied()
    }

    pub fn pixels(&self) -> &Array2<f32> {
        &self.pixels
    }

    pub fn to_image(&self) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let pixel_data: Vec<u8> = self
            .pixels
            .iter()
            .map(|&value| (value.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        ImageBuffer::from_raw(self.width() as u32, self.height() as u32, pixel_data)
    }
}

/// A crosshair line mapped to pixel coordinates of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelLine {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Vec3,
    pub dashed: bool,
}

/// Where a view's frames end up, e.g. a canvas or an image file.
pub trait DisplaySurface {
    fn set_size(&mut self, orientation: Orientation, width: u32, height: u32);
    fn present(&mut self, orientation: Orientation, frame: &DisplayBuffer, overlay: &[PixelLine]);
}

/// Surface that keeps the last presented frame of each view as an RGB
/// image with the crosshair burnt in.
#[derive(Debug, Default)]
pub struct ImageSurface {
    frames: [Option<RgbImage>; 3],
    presented: usize,
}

impl ImageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self, orientation: Orientation) -> Option<&RgbImage> {
        self.frames[orientation.index()].as_ref()
    }

    /// Number of frames presented so far, across all views.
    pub fn presented(&self) -> usize {
        self.presented
    }

    fn draw_line(image: &mut RgbImage, line: &PixelLine) {
        let color = Rgb([
            (line.color.x * 255.0) as u8,
            (line.color.y * 255.0) as u8,
            (line.color.z * 255.0) as u8,
        ]);
        let along = line.to - line.from;
        let steps = along.abs().max_element().ceil().max(1.0) as usize;
        for step in 0..=steps {
            // 4 px on, 4 px off
            if line.dashed && (step / 4) % 2 == 1 {
                continue;
            }
            let point = line.from + along * (step as f32 / steps as f32);
            if point.x < 0.0 || point.y < 0.0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < image.width() && y < image.height() {
                image.put_pixel(x, y, color);
            }
        }
    }
}

impl DisplaySurface for ImageSurface {
    fn set_size(&mut self, orientation: Orientation, width: u32, height: u32) {
        trace!(orientation = orientation.name(), width, height, "surface resized");
        self.frames[orientation.index()] = None;
    }

    fn present(&mut self, orientation: Orientation, frame: &DisplayBuffer, overlay: &[PixelLine]) {
        let Some(gray) = frame.to_image() else {
            return;
        };
        let mut image = DynamicImage::ImageLuma8(gray).to_rgb8();
        for line in overlay {
            Self::draw_line(&mut image, line);
        }
        self.frames[orientation.index()] = Some(image);
        self.presented += 1;
    }
}

/// Current plane, framing and crosshair of a view, for one state.
#[derive(Debug, Clone, Copy)]
struct Layout {
    plane: Plane,
    crosshair: Crosshair,
}

pub struct View {
    orientation: Orientation,
    config: ViewerConfig,
    volume: Option<Arc<VolumeGrid>>,
    solver: PlaneSolver,
    framing: Framing,
    viewport: (u32, u32),
    scheduler: FrameScheduler,
    layout: Option<Layout>,
    hover: Option<HitTarget>,
}

impl View {
    pub fn new(orientation: Orientation, config: &ViewerConfig) -> Self {
        Self {
            orientation,
            config: config.clone(),
            volume: None,
            solver: PlaneSolver::default(),
            framing: Framing::default(),
            viewport: (0, 0),
            scheduler: FrameScheduler::new(orientation, config),
            layout: None,
            hover: None,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn hovered(&self) -> Option<HitTarget> {
        self.hover
    }

    pub fn set_volume(&mut self, volume: Arc<VolumeGrid>) {
        self.volume = Some(volume);
        self.solver.reset();
        self.layout = None;
        self.hover = None;
    }

    /// Solve the plane for `state`, refit the framing if its aspect moved
    /// and recompute the crosshair.
    pub fn render(&mut self, state: &ViewState) -> Option<Plane> {
        let volume = self.volume.as_ref()?;
        let solved = self.solver.solve(self.orientation, state, volume);
        let crosshair = Crosshair::new(self.orientation, state, &solved.plane);
        self.layout = Some(Layout {
            plane: solved.plane,
            crosshair,
        });
        if solved.reframe {
            self.reframe();
        }
        Some(solved.plane)
    }

    fn reframe(&mut self) {
        if let Some(layout) = self.layout {
            self.framing = Framing::fit(layout.plane.extent(), self.viewport).unwrap_or_default();
            debug!(
                orientation = self.orientation.name(),
                framing = ?self.framing,
                "framing updated"
            );
        }
    }

    pub fn invalidate(&mut self, frames: &mut dyn FrameRequester) {
        self.scheduler.invalidate(frames);
    }

    /// New viewport size in pixels. Draws stay unthrottled until resize
    /// signals have been quiet for the configured period.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        now: Instant,
        surface: &mut dyn DisplaySurface,
        frames: &mut dyn FrameRequester,
    ) {
        self.viewport = (width, height);
        surface.set_size(self.orientation, width, height);
        self.reframe();
        self.scheduler.resize_signal(now);
        self.scheduler.invalidate(frames);
    }

    /// Handle this view's frame callback. Returns whether a frame was
    /// presented.
    pub fn frame(
        &mut self,
        now: Instant,
        state: Option<&ViewState>,
        surface: &mut dyn DisplaySurface,
        frames: &mut dyn FrameRequester,
    ) -> bool {
        let mut presented = false;
        if self.scheduler.begin_frame(now) == FrameAction::Draw {
            if let Some(buffer) = state.and_then(|state| self.draw(state)) {
                let overlay = self.pixel_lines();
                surface.present(self.orientation, &buffer, &overlay);
                presented = true;
            }
        }
        self.scheduler.finish_frame(now, frames);
        presented
    }

    /// Sample the whole viewport for `state`. `None` without a volume or
    /// with an empty viewport.
    pub fn draw(&mut self, state: &ViewState) -> Option<DisplayBuffer> {
        let plane = self.render(state)?;
        let volume = self.volume.as_deref()?;
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return None;
        }
        let (width, height) = (width as usize, height as usize);
        let extent = plane.extent();
        let framing = self.framing;
        let viewport = self.viewport;
        let rescale = volume.metadata().rescale();
        let window = state.window();
        let thickness = state.thickness(self.orientation);
        let slab_mode = state.slab_mode();

        let pixel = |column: usize, row: usize| -> f32 {
            if extent.x <= PLANE_EPSILON || extent.y <= PLANE_EPSILON {
                return 0.0;
            }
            let world = framing.pixel_to_world(column, row, viewport);
            let u = world.x / extent.x;
            let v = world.y / extent.y;
            if u.abs() > 0.5 || v.abs() > 0.5 {
                return 0.0;
            }
            to_display(sample(&plane, volume, thickness, slab_mode, u, v), rescale, window)
        };
        let pixel = &pixel;
        let row_pixels = |row: usize| (0..width).map(move |column| pixel(column, row));

        let pixel_data: Vec<f32> = match self.config.processor {
            Processor::CPU => (0..height).flat_map(row_pixels).collect(),
            Processor::CPUParallel => (0..height)
                .into_par_iter()
                .flat_map_iter(row_pixels)
                .collect(),
        };
        let pixels = Array2::from_shape_vec((height, width), pixel_data).ok()?;
        Some(DisplayBuffer { pixels })
    }

    fn pixel_lines(&self) -> Vec<PixelLine> {
        let Some(layout) = self.layout else {
            return Vec::new();
        };
        let (width, height) = self.viewport;
        let framing = self.framing;
        let to_pixel = |world: Vec2| {
            Vec2::new(
                (world.x - framing.left) / framing.width() * width as f32,
                (framing.top - world.y) / framing.height() * height as f32,
            )
        };
        layout
            .crosshair
            .lines(&framing, &self.config)
            .into_iter()
            .map(|line: OverlayLine| PixelLine {
                from: to_pixel(line.from),
                to: to_pixel(line.to),
                color: marker_color(line.marks),
                dashed: line.dashed,
            })
            .collect()
    }

    /// World position under a pointer at normalized device coordinates.
    pub fn world_at(&self, ndc: Vec2) -> Vec2 {
        self.framing.ndc_to_world(ndc)
    }

    pub fn drag_geometry(&mut self, state: &ViewState) -> Option<DragGeometry> {
        self.render(state)?;
        self.layout.map(|layout| layout.crosshair.drag_geometry())
    }

    /// Overlay target under the pointer, if any.
    pub fn hit_test(&mut self, state: &ViewState, ndc: Vec2) -> Option<HitTarget> {
        self.render(state)?;
        let layout = self.layout?;
        let regions = layout
            .crosshair
            .hit_regions(&self.framing, self.viewport, &self.config);
        hit_test(&regions, self.world_at(ndc))
    }

    /// Track the hovered target and report what the overlay should show.
    pub fn hover(&mut self, state: &ViewState, ndc: Vec2) -> HoverFeedback {
        self.hover = self.hit_test(state, ndc);
        self.hover
            .map(HitTarget::hover_feedback)
            .unwrap_or_default()
    }

    /// Drop the volume and every cached layout. The view can be reused
    /// after another [`set_volume`](Self::set_volume).
    pub fn dispose(&mut self) {
        self.volume = None;
        self.solver.reset();
        self.layout = None;
        self.hover = None;
    }
}
