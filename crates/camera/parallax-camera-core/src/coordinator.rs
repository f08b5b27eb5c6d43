//! Pause procedural motion around user interaction and resume it after a
//! debounce delay.

use crate::config::SceneConfig;
use crate::store::{MotionPhase, PoseStore};
use crate::timer::{TaskHandle, TimerQueue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorTask {
    ResumeMotion,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatorSettings {
    pub resume_delay_ms: f64,
    pub auto_resume: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&SceneConfig::default())
    }
}

impl From<&SceneConfig> for CoordinatorSettings {
    fn from(cfg: &SceneConfig) -> Self {
        Self {
            resume_delay_ms: cfg.motion_resume_delay_ms,
            auto_resume: cfg.auto_resume_motion,
        }
    }
}

#[derive(Debug, Default)]
pub struct InteractionCoordinator {
    settings: CoordinatorSettings,
    timers: TimerQueue<CoordinatorTask>,
    pending_resume: Option<TaskHandle>,
    /// Motion was running when the current interaction paused it.
    paused_by_interaction: bool,
}

impl InteractionCoordinator {
    pub fn new(settings: CoordinatorSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: CoordinatorSettings) {
        self.settings = settings;
    }

    /// Cancel any pending resume and pause running motion. Returns whether
    /// motion was paused by this call.
    pub fn on_interaction_start(&mut self, store: &mut PoseStore, now_ms: f64) -> bool {
        self.cancel_pending();
        if store.pause_motion(now_ms) {
            self.paused_by_interaction = true;
            return true;
        }
        false
    }

    /// Schedule a single delayed resume if the interaction paused motion that
    /// is still paused, auto-resume is on and the motion is not static.
    pub fn on_interaction_end(&mut self, store: &PoseStore, now_ms: f64) -> Option<TaskHandle> {
        let motion = store.motion();
        if !(self.paused_by_interaction
            && motion.phase() == MotionPhase::Paused
            && self.settings.auto_resume
            && !motion.motion_type.is_static())
        {
            return None;
        }
        self.cancel_pending();
        let handle = self
            .timers
            .schedule(now_ms + self.settings.resume_delay_ms, CoordinatorTask::ResumeMotion);
        self.pending_resume = Some(handle);
        Some(handle)
    }

    /// Fire due timers. Returns `true` if motion was resumed.
    pub fn poll(&mut self, store: &mut PoseStore, now_ms: f64) -> bool {
        let mut resumed = false;
        for (handle, task) in self.timers.poll_due(now_ms) {
            match task {
                CoordinatorTask::ResumeMotion => {
                    if self.pending_resume == Some(handle) {
                        self.pending_resume = None;
                    }
                    if store.interaction().is_interacting {
                        continue;
                    }
                    self.paused_by_interaction = false;
                    resumed |= store.resume_motion(now_ms);
                }
            }
        }
        resumed
    }

    /// Cancel any pending resume and resume right away.
    pub fn immediate_resume(&mut self, store: &mut PoseStore, now_ms: f64) -> bool {
        self.cancel_pending();
        self.paused_by_interaction = false;
        store.resume_motion(now_ms)
    }

    pub fn cancel_pending(&mut self) -> bool {
        match self.pending_resume.take() {
            Some(handle) => self.timers.cancel(handle),
            None => false,
        }
    }

    /// Motion was paused, stopped or restarted explicitly; an interaction no
    /// longer owns its paused state.
    pub fn release(&mut self) {
        self.cancel_pending();
        self.paused_by_interaction = false;
    }

    /// Motion is paused on behalf of an interaction, either still in progress
    /// or waiting out its resume delay.
    #[inline]
    pub fn owns_pause(&self) -> bool {
        self.paused_by_interaction
    }

    /// Take back ownership of paused motion so the next interaction end
    /// schedules its resume.
    pub fn claim_pause(&mut self) {
        self.paused_by_interaction = true;
    }

    #[inline]
    pub fn pending_resume_at(&self) -> Option<f64> {
        self.pending_resume.and_then(|h| self.timers.due_at(h))
    }

    #[inline]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Drop every timer. Returns how many were pending.
    pub fn teardown(&mut self) -> usize {
        self.pending_resume = None;
        self.paused_by_interaction = false;
        self.timers.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MotionType;
    use crate::store::InteractionKind;

    fn running_store() -> PoseStore {
        let mut store = PoseStore::default();
        store.start_motion(MotionType::Orbit, 0.0, 1.0);
        store
    }

    #[test]
    fn resumes_after_delay() {
        let mut store = running_store();
        let mut c = InteractionCoordinator::default();
        assert!(c.on_interaction_start(&mut store, 1_000.0));
        assert!(c.on_interaction_end(&store, 2_000.0).is_some());
        assert_eq!(c.pending_resume_at(), Some(3_000.0));

        assert!(!c.poll(&mut store, 2_999.0));
        assert!(c.poll(&mut store, 3_000.0));
        assert_eq!(store.motion().phase(), MotionPhase::Active);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn new_interaction_cancels_pending_resume() {
        let mut store = running_store();
        let mut c = InteractionCoordinator::default();
        c.on_interaction_start(&mut store, 0.0);
        c.on_interaction_end(&store, 100.0);
        c.on_interaction_start(&mut store, 600.0);
        assert_eq!(c.pending_timers(), 0);
        assert!(!c.poll(&mut store, 5_000.0));
        assert_eq!(store.motion().phase(), MotionPhase::Paused);
    }

    #[test]
    fn explicit_pause_is_not_auto_resumed() {
        let mut store = running_store();
        let mut c = InteractionCoordinator::default();
        store.pause_motion(10.0);
        assert!(!c.on_interaction_start(&mut store, 20.0));
        assert!(c.on_interaction_end(&store, 30.0).is_none());
    }

    #[test]
    fn static_or_disabled_never_schedules() {
        let mut store = PoseStore::default();
        store.start_motion(MotionType::Static, 0.0, 1.0);
        let mut c = InteractionCoordinator::default();
        c.on_interaction_start(&mut store, 10.0);
        assert!(c.on_interaction_end(&store, 20.0).is_none());

        let mut store = running_store();
        let mut c = InteractionCoordinator::new(CoordinatorSettings {
            resume_delay_ms: 1_000.0,
            auto_resume: false,
        });
        c.on_interaction_start(&mut store, 10.0);
        assert!(c.on_interaction_end(&store, 20.0).is_none());
        assert!(c.immediate_resume(&mut store, 30.0));
    }

    #[test]
    fn claimed_pause_schedules_on_interaction_end() {
        let mut store = running_store();
        let mut c = InteractionCoordinator::default();
        c.on_interaction_start(&mut store, 0.0);
        assert!(c.owns_pause());
        c.release();
        assert!(!c.owns_pause());
        assert!(c.on_interaction_end(&store, 100.0).is_none());

        c.claim_pause();
        assert!(c.on_interaction_end(&store, 200.0).is_some());
        assert_eq!(c.pending_resume_at(), Some(1_200.0));
    }

    #[test]
    fn resume_is_skipped_while_interacting() {
        let mut store = running_store();
        let mut c = InteractionCoordinator::default();
        c.on_interaction_start(&mut store, 0.0);
        c.on_interaction_end(&store, 0.0);
        store.start_interaction(InteractionKind::Zoom);
        assert!(!c.poll(&mut store, 2_000.0));
        assert_eq!(c.teardown(), 0);
    }
}
