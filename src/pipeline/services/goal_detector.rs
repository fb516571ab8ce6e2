use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::common::{DetectionBox, GoalRegion};

/// Stateless overlap check between the ball box and the hoop region.
pub fn check_score(ball: &DetectionBox, goal: &GoalRegion) -> bool {
    ball.bounds.overlaps(goal)
}

/// Turns per-frame overlap results into discrete scoring events.
///
/// One event fires per continuous overlap run. The run ends on the first
/// frame where the ball is missing or outside the goal. Events closer than
/// `cooldown` to the previous one are swallowed to absorb detector flicker.
#[derive(Debug, Clone)]
pub struct GoalDetector {
    goal: GoalRegion,
    cooldown: Duration,
    in_overlap: bool,
    last_score_at: Option<Instant>,
}

impl GoalDetector {
    pub fn new(goal: GoalRegion, cooldown: Duration) -> Self {
        Self {
            goal,
            cooldown,
            in_overlap: false,
            last_score_at: None,
        }
    }

    /// Returns true when this frame starts a new scoring event.
    pub fn observe(&mut self, ball: Option<&DetectionBox>, now: Instant) -> bool {
        let overlapping = ball.is_some_and(|b| check_score(b, &self.goal));
        let rising_edge = overlapping && !self.in_overlap;
        self.in_overlap = overlapping;

        if !rising_edge {
            return false;
        }

        if let Some(last) = self.last_score_at {
            if now.saturating_duration_since(last) < self.cooldown {
                debug!("Ignoring goal overlap inside score cooldown");
                return false;
            }
        }

        self.last_score_at = Some(now);
        info!("Scoring event");
        true
    }

    pub fn reset(&mut self) {
        self.in_overlap = false;
        self.last_score_at = None;
    }
}
