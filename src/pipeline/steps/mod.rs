pub mod goal_detection_step;
pub mod overlay_step;
pub mod shot_analysis_step;

pub use goal_detection_step::GoalDetectionStep;
pub use overlay_step::OverlayStep;
pub use shot_analysis_step::ShotAnalysisStep;
