use crate::config::Settings;
use crate::pipeline::orchestration::ProcessingPipeline;
use crate::pipeline::services::{GoalDetector, OverlayRenderer, ShotHeuristics};
use crate::pipeline::steps::{GoalDetectionStep, OverlayStep, ShotAnalysisStep};

/// Builds the per-frame coaching pipeline. The ball is located before the
/// overlay step so its box can be drawn on the same frame.
pub fn coaching_pipeline(settings: &Settings) -> ProcessingPipeline {
    let heuristics = ShotHeuristics::new(settings.feedback.knee_margin)
        .with_closing_tip(settings.feedback.closing_tip.clone());
    let goal = settings.goal.region;

    ProcessingPipeline::new()
        .add_step(Box::new(ShotAnalysisStep::new(heuristics)))
        .add_step(Box::new(GoalDetectionStep::new(
            GoalDetector::new(goal, settings.goal.score_cooldown()),
            settings.detection.ball_label.clone(),
            settings.detection.min_ball_confidence,
        )))
        .add_step(Box::new(OverlayStep::new(
            OverlayRenderer::new(settings.session.canvas_width, settings.session.canvas_height),
            goal,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::keypoint::fixtures;
    use crate::common::{DetectionBox, Frame, Rect};
    use crate::pipeline::detection::DetectionResult;
    use crate::pipeline::orchestration::FrameContext;
    use crate::pipeline::services::heuristics::{GOOD_KNEE_BEND, RAISE_ELBOW, WAITING_FOR_PLAYER};
    use chrono::Utc;
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn context(detections: DetectionResult) -> FrameContext {
        let frame = Frame::new(0, DynamicImage::ImageRgb8(RgbImage::new(320, 240)), Utc::now());
        FrameContext::new(Arc::new(frame), detections, Instant::now())
    }

    fn ball_in_hoop() -> DetectionBox {
        DetectionBox::new("sports ball", 0.9, Rect::new(510.0, 60.0, 20.0, 20.0))
    }

    #[test]
    fn test_pipeline_step_order() {
        let pipeline = coaching_pipeline(&Settings::default());
        assert_eq!(
            pipeline.step_names(),
            vec!["ShotAnalysisStep", "GoalDetectionStep", "OverlayStep"]
        );
    }

    #[tokio::test]
    async fn test_pipeline_fills_feedback_ball_and_canvas() {
        let mut pipeline = coaching_pipeline(&Settings::default());
        let mut ctx = context(DetectionResult {
            pose: Some(fixtures::pose(0.3, 0.4, 0.6, 0.4)),
            hands: None,
            objects: vec![ball_in_hoop()],
        });

        pipeline.process(&mut ctx).await.unwrap();

        assert_eq!(ctx.feedback, vec![RAISE_ELBOW, GOOD_KNEE_BEND]);
        assert_eq!(ctx.ball, Some(ball_in_hoop()));
        assert!(ctx.scored);
        assert_eq!(ctx.canvas.as_ref().unwrap().dimensions(), (640, 480));
    }

    #[tokio::test]
    async fn test_pipeline_without_subject() {
        let mut pipeline = coaching_pipeline(&Settings::default());
        let mut ctx = context(DetectionResult::default());

        pipeline.process(&mut ctx).await.unwrap();

        assert_eq!(ctx.feedback, vec![WAITING_FOR_PLAYER]);
        assert_eq!(ctx.ball, None);
        assert!(!ctx.scored);
        assert!(ctx.canvas.is_some());
    }

    #[tokio::test]
    async fn test_reset_rearms_goal_detection() {
        let mut pipeline = coaching_pipeline(&Settings::default());
        let detections = DetectionResult {
            objects: vec![ball_in_hoop()],
            ..DetectionResult::default()
        };

        let mut first = context(detections.clone());
        pipeline.process(&mut first).await.unwrap();
        assert!(first.scored);

        let mut second = context(detections.clone());
        pipeline.process(&mut second).await.unwrap();
        assert!(!second.scored);

        pipeline.reset();
        let mut third = context(detections);
        pipeline.process(&mut third).await.unwrap();
        assert!(third.scored);
    }
}
