use glam::Vec2;
use hop_runner_core::{Presentation, StepAnimation, StepAnimator, VisualHandle};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug)]
struct HeadlessVisual {
    position: Vec2,
    active: bool,
}

/// Presentation port that keeps tile visuals in memory instead of drawing them.
#[derive(Debug, Default)]
pub(crate) struct HeadlessPresentation {
    visuals: Vec<HeadlessVisual>,
    destroyed: usize,
}

impl HeadlessPresentation {
    /// Number of visuals currently shown.
    pub(crate) fn visible_count(&self) -> usize {
        self.visuals.iter().filter(|visual| visual.active).count()
    }

    /// Number of visuals destroyed at teardown.
    pub(crate) fn destroyed(&self) -> usize {
        self.destroyed
    }

    fn visual_mut(&mut self, handle: VisualHandle) -> Option<&mut HeadlessVisual> {
        usize::try_from(handle.get())
            .ok()
            .and_then(|slot| self.visuals.get_mut(slot))
    }
}

impl Presentation for HeadlessPresentation {
    fn spawn_visual(&mut self) -> VisualHandle {
        let slot = u32::try_from(self.visuals.len()).expect("visual count exceeds u32 range");
        self.visuals.push(HeadlessVisual {
            position: Vec2::ZERO,
            active: false,
        });
        trace!(handle = slot, "visual constructed");
        VisualHandle::new(slot)
    }

    fn position_visual(&mut self, handle: VisualHandle, coordinate: Vec2) {
        if let Some(visual) = self.visual_mut(handle) {
            visual.position = coordinate;
        }
    }

    fn set_visual_active(&mut self, handle: VisualHandle, active: bool) {
        if let Some(visual) = self.visual_mut(handle) {
            visual.active = active;
            trace!(
                handle = handle.get(),
                x = visual.position.x,
                active,
                "visual toggled"
            );
        }
    }

    fn destroy_all_visuals(&mut self) {
        self.destroyed += self.visuals.len();
        self.visuals.clear();
    }
}

/// Animation port that logs the clips it is asked to play.
#[derive(Debug, Default)]
pub(crate) struct LoggingAnimator {
    played: usize,
}

impl LoggingAnimator {
    /// Number of clips started so far.
    pub(crate) fn played(&self) -> usize {
        self.played
    }
}

impl StepAnimator for LoggingAnimator {
    fn play_step(&mut self, step: StepAnimation) {
        self.played += 1;
        debug!(clip = step.name(), "body animation");
    }
}
