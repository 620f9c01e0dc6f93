//! Shared services handed to every gesture and scroller

use std::sync::Arc;

use motive_animation::{Easing, TimeManager};
use motive_core::{MotionConfig, ResourceArbitrator, SharedSession, TracingSession};

/// Clock, arbitration, configuration and diagnostics for one document
#[derive(Clone)]
pub struct MotionContext {
    pub timers: Arc<TimeManager>,
    pub arbitrator: Arc<ResourceArbitrator>,
    pub config: Arc<MotionConfig>,
    pub session: SharedSession,
}

impl MotionContext {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            timers: TimeManager::new(),
            arbitrator: ResourceArbitrator::new(),
            config: Arc::new(config),
            session: TracingSession::shared(),
        }
    }

    pub fn with_session(mut self, session: SharedSession) -> Self {
        self.session = session;
        self
    }

    pub fn with_timers(mut self, timers: Arc<TimeManager>) -> Self {
        self.timers = timers;
        self
    }

    /// Resolve a configured easing, reporting bad text to the session
    pub fn easing(&self, text: &str) -> Easing {
        Easing::parse_with_session(self.session.as_ref(), text)
    }

    /// Stop all motion: no more timers, no more claims
    pub fn terminate(&self) {
        self.timers.terminate();
        self.arbitrator.terminate();
    }
}

impl Default for MotionContext {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
