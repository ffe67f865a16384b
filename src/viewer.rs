//! Three linked views over one volume and one shared [`ViewState`].

use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, info};
use web_time::Instant;

use crate::config::ViewerConfig;
use crate::enums::{Orientation, SlabMode};
use crate::interaction::{
    DragSession, HitTarget, HoverFeedback, PointerTool, ScrollAccumulator, apply_delta,
    apply_window_level,
};
use crate::scheduler::FrameRequester;
use crate::view::{DisplaySurface, View};
use crate::view_state::ViewState;
use crate::volume::VolumeGrid;

/// What the primary button is currently doing.
#[derive(Debug, Clone)]
enum Gesture {
    Overlay(DragSession),
    Tool(Orientation),
}

fn invalidate_views(views: &mut [View; 3], frames: &mut dyn FrameRequester) {
    for view in views {
        view.invalidate(frames);
    }
}

pub struct MprViewer {
    config: ViewerConfig,
    volume: Option<Arc<VolumeGrid>>,
    state: Option<ViewState>,
    views: [View; 3],
    gesture: Option<Gesture>,
    tool: PointerTool,
    scroll: ScrollAccumulator,
}

impl MprViewer {
    pub fn new(config: ViewerConfig) -> Self {
        let views = Orientation::ALL.map(|orientation| View::new(orientation, &config));
        Self {
            scroll: ScrollAccumulator::new(config.scroll_threshold),
            config,
            volume: None,
            state: None,
            views,
            gesture: None,
            tool: PointerTool::default(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn volume(&self) -> Option<&VolumeGrid> {
        self.volume.as_deref()
    }

    pub fn state(&self) -> Option<&ViewState> {
        self.state.as_ref()
    }

    pub fn view(&self, orientation: Orientation) -> &View {
        &self.views[orientation.index()]
    }

    /// Replace the volume and reset all shared state for it.
    pub fn load_volume(&mut self, volume: VolumeGrid, frames: &mut dyn FrameRequester) {
        let (width, height, depth) = volume.dims();
        info!(width, height, depth, "volume loaded");
        let volume = Arc::new(volume);
        self.state = Some(ViewState::for_volume(&volume));
        for view in &mut self.views {
            view.set_volume(Arc::clone(&volume));
        }
        self.volume = Some(volume);
        self.gesture = None;
        self.scroll.reset();
        self.invalidate_all(frames);
    }

    fn invalidate_all(&mut self, frames: &mut dyn FrameRequester) {
        invalidate_views(&mut self.views, frames);
    }

    /// Mutate the shared state directly and redraw every view. Does nothing
    /// before a volume is loaded.
    pub fn update_state(
        &mut self,
        frames: &mut dyn FrameRequester,
        edit: impl FnOnce(&mut ViewState),
    ) {
        if let Some(state) = self.state.as_mut() {
            edit(state);
            self.invalidate_all(frames);
        }
    }

    pub fn set_slab_mode(&mut self, mode: SlabMode, frames: &mut dyn FrameRequester) {
        self.update_state(frames, |state| state.set_slab_mode(mode));
    }

    pub fn tool(&self) -> PointerTool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: PointerTool) {
        self.tool = tool;
    }

    /// Primary button pressed in a view at normalized device coordinates.
    /// Returns the overlay target the drag started on, if any.
    pub fn pointer_down(&mut self, orientation: Orientation, ndc: Vec2) -> Option<HitTarget> {
        let state = self.state.as_ref()?;
        let view = &mut self.views[orientation.index()];
        let Some(target) = view.hit_test(state, ndc) else {
            self.gesture = Some(Gesture::Tool(orientation));
            self.scroll.reset();
            return None;
        };
        let geometry = view.drag_geometry(state)?;
        let session = DragSession::begin(orientation, target, view.world_at(ndc), geometry, state);
        self.gesture = Some(Gesture::Overlay(session));
        Some(target)
    }

    /// Pointer moved in a view. `delta_px` is the motion since the last
    /// event in screen pixels, y down.
    pub fn pointer_move(
        &mut self,
        orientation: Orientation,
        ndc: Vec2,
        delta_px: Vec2,
        frames: &mut dyn FrameRequester,
    ) -> HoverFeedback {
        let Some(state) = self.state.as_mut() else {
            return HoverFeedback::default();
        };
        let view = &mut self.views[orientation.index()];

        match self.gesture.as_mut() {
            None => view.hover(state, ndc),
            Some(Gesture::Overlay(session)) => {
                let feedback = session.target().hover_feedback();
                if session.orientation() != orientation {
                    return feedback;
                }
                let Some(geometry) = view.drag_geometry(state) else {
                    return feedback;
                };
                let deltas = session.update(view.world_at(ndc), geometry, state);
                if deltas.is_empty() {
                    return feedback;
                }
                for delta in deltas {
                    apply_delta(state, delta);
                }
                invalidate_views(&mut self.views, frames);
                feedback
            }
            Some(Gesture::Tool(source)) => {
                let source = *source;
                match self.tool {
                    PointerTool::WindowLevel => apply_window_level(state, delta_px),
                    PointerTool::Scroll => {
                        let steps = self.scroll.feed(delta_px.y);
                        if steps == 0 {
                            return HoverFeedback::default();
                        }
                        state.offset_position(source, steps as f32);
                    }
                }
                invalidate_views(&mut self.views, frames);
                HoverFeedback::default()
            }
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(Gesture::Overlay(session)) = self.gesture.take() {
            debug!(
                orientation = session.orientation().name(),
                target = ?session.target(),
                "drag finished"
            );
        }
        self.scroll.reset();
    }

    pub fn resize(
        &mut self,
        orientation: Orientation,
        width: u32,
        height: u32,
        now: Instant,
        surface: &mut dyn DisplaySurface,
        frames: &mut dyn FrameRequester,
    ) {
        self.views[orientation.index()].resize(width, height, now, surface, frames);
    }

    /// Run the frame callback of one view. Returns whether it presented.
    pub fn frame(
        &mut self,
        orientation: Orientation,
        now: Instant,
        surface: &mut dyn DisplaySurface,
        frames: &mut dyn FrameRequester,
    ) -> bool {
        self.views[orientation.index()].frame(now, self.state.as_ref(), surface, frames)
    }

    /// Drop the volume and the shared state. Pending callbacks find nothing
    /// to draw.
    pub fn dispose(&mut self) {
        for view in &mut self.views {
            view.dispose();
        }
        self.volume = None;
        self.state = None;
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scheduler::FrameQueue;
    use crate::view::ImageSurface;
    use crate::volume::VolumeMetadata;

    fn volume() -> VolumeGrid {
        let metadata = VolumeMetadata {
            window_center: 40.0,
            window_width: 80.0,
            ..VolumeMetadata::default()
        };
        VolumeGrid::new(vec![10.0; 9 * 9 * 9], (9, 9, 9), metadata).unwrap()
    }

    /// A viewer whose views have all drawn once and have nothing pending.
    fn loaded() -> (MprViewer, ImageSurface, FrameQueue, Instant) {
        let mut viewer = MprViewer::new(ViewerConfig::default());
        let mut surface = ImageSurface::new();
        let mut frames = FrameQueue::new();
        viewer.load_volume(volume(), &mut frames);
        let start = Instant::now();
        for orientation in Orientation::ALL {
            viewer.resize(orientation, 100, 100, start, &mut surface, &mut frames);
        }
        let quiet = start + Duration::from_millis(200);
        for orientation in frames.take() {
            viewer.frame(orientation, quiet, &mut surface, &mut frames);
        }
        assert!(frames.is_empty());
        (viewer, surface, frames, quiet)
    }

    #[test]
    fn load_invalidates_every_view_once() {
        let mut viewer = MprViewer::new(ViewerConfig::default());
        let mut frames = FrameQueue::new();
        viewer.load_volume(volume(), &mut frames);
        viewer.set_slab_mode(SlabMode::AvgIP, &mut frames);
        assert_eq!(frames.take(), Orientation::ALL.to_vec());
        assert_eq!(viewer.state().unwrap().slab_mode(), SlabMode::AvgIP);
    }

    #[test]
    fn window_level_drag_off_the_overlay() {
        let (mut viewer, _, mut frames, _) = loaded();
        assert_eq!(viewer.pointer_down(Orientation::Axial, Vec2::new(0.8, 0.8)), None);
        viewer.pointer_move(Orientation::Axial, Vec2::new(0.8, 0.8), Vec2::new(5.0, -100.0), &mut frames);
        viewer.pointer_up();
        let state = viewer.state().unwrap();
        assert_eq!(state.window_center(), 45.0);
        assert_eq!(state.window_width(), 1.0);
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn scroll_tool_steps_own_slice() {
        let (mut viewer, _, mut frames, _) = loaded();
        viewer.set_tool(PointerTool::Scroll);
        viewer.pointer_down(Orientation::Coronal, Vec2::new(0.8, 0.8));
        viewer.pointer_move(Orientation::Coronal, Vec2::ZERO, Vec2::new(0.0, 2.0), &mut frames);
        assert!(frames.is_empty());
        viewer.pointer_move(Orientation::Coronal, Vec2::ZERO, Vec2::new(0.0, 5.0), &mut frames);
        assert_eq!(viewer.state().unwrap().position(Orientation::Coronal), 6);
    }

    #[test]
    fn dragging_the_vertical_line_moves_sagittal() {
        let (mut viewer, _, mut frames, _) = loaded();
        let start = Vec2::new(0.0, -0.6);
        assert_eq!(
            viewer.pointer_down(Orientation::Axial, start),
            Some(HitTarget::CrosshairLine(crate::enums::HandleAxis::Vertical))
        );
        // NDC 0.5 is a quarter of the plane width to the right.
        viewer.pointer_move(Orientation::Axial, Vec2::new(0.5, -0.6), Vec2::ZERO, &mut frames);
        viewer.pointer_up();
        let state = viewer.state().unwrap();
        assert_eq!(state.position(Orientation::Sagittal), 6);
        assert_eq!(state.position(Orientation::Coronal), 4);
    }

    #[test]
    fn frames_draw_after_edits_and_stop_after_dispose() {
        let (mut viewer, mut surface, mut frames, quiet) = loaded();
        let now = quiet + Duration::from_millis(100);
        assert_eq!(surface.presented(), 3);
        viewer.set_slab_mode(SlabMode::MinIP, &mut frames);
        assert!(viewer.frame(Orientation::Sagittal, now, &mut surface, &mut frames));
        assert!(surface.image(Orientation::Sagittal).is_some());

        viewer.dispose();
        assert!(viewer.state().is_none());
        assert!(!viewer.frame(Orientation::Axial, now, &mut surface, &mut frames));
    }
}
