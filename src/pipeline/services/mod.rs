pub mod goal_detector;
pub mod heuristics;
pub mod overlay_renderer;
pub mod rate_limiter;
pub mod speech;

pub use goal_detector::{check_score, GoalDetector};
pub use heuristics::ShotHeuristics;
pub use overlay_renderer::OverlayRenderer;
pub use rate_limiter::{FeedbackRateLimiter, PendingRepeat, SpeechDecision};
pub use speech::{LoggingSpeech, SpeechOutput, Utterance};
