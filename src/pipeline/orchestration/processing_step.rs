use super::frame_context::FrameContext;
use crate::error::AppError;
use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::instrument;

/// Chain of Responsibility pattern for processing pipeline
#[async_trait]
pub trait ProcessingStep: Send + Sync {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError>;
    fn name(&self) -> &'static str;

    /// Drops any state carried between frames.
    fn reset(&mut self) {}
}

/// A pipeline that processes frames through a chain of named steps, in
/// insertion order.
#[derive(Default)]
pub struct ProcessingPipeline {
    steps: IndexMap<&'static str, Box<dyn ProcessingStep>>,
}

impl ProcessingPipeline {
    pub fn new() -> Self {
        Self {
            steps: IndexMap::new(),
        }
    }

    pub fn add_step(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.insert(step.name(), step);
        self
    }

    #[instrument(skip_all, fields(frame = context.frame.index()))]
    pub async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        for (name, step) in &mut self.steps {
            tracing::debug!("Processing step: {}", name);
            step.process(context).await?;
        }
        context.metrics.finalize(context.processing_start);
        Ok(())
    }

    pub fn reset(&mut self) {
        for step in self.steps.values_mut() {
            step.reset();
        }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Frame;
    use crate::pipeline::detection::DetectionResult;
    use chrono::Utc;
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;
    use tokio::time::Instant;

    struct Push(&'static str, u32);

    #[async_trait]
    impl ProcessingStep for Push {
        async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
            self.1 += 1;
            context.feedback.push(format!("{}:{}", self.0, self.1));
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.0
        }

        fn reset(&mut self) {
            self.1 = 0;
        }
    }

    struct Fail;

    #[async_trait]
    impl ProcessingStep for Fail {
        async fn process(&mut self, _context: &mut FrameContext) -> Result<(), AppError> {
            Err(AppError::Pipeline("boom".to_string()))
        }

        fn name(&self) -> &'static str {
            "fail"
        }
    }

    fn context() -> FrameContext {
        let frame = Frame::new(0, DynamicImage::ImageRgb8(RgbImage::new(2, 2)), Utc::now());
        FrameContext::new(Arc::new(frame), DetectionResult::default(), Instant::now())
    }

    #[tokio::test]
    async fn test_steps_run_in_insertion_order() {
        let mut pipeline = ProcessingPipeline::new()
            .add_step(Box::new(Push("b", 0)))
            .add_step(Box::new(Push("a", 0)));
        assert_eq!(pipeline.step_names(), vec!["b", "a"]);

        let mut ctx = context();
        pipeline.process(&mut ctx).await.unwrap();
        assert_eq!(ctx.feedback, vec!["b:1", "a:1"]);
    }

    #[tokio::test]
    async fn test_reset_reaches_every_step() {
        let mut pipeline = ProcessingPipeline::new().add_step(Box::new(Push("a", 0)));
        let mut ctx = context();
        pipeline.process(&mut ctx).await.unwrap();
        pipeline.reset();
        let mut ctx = context();
        pipeline.process(&mut ctx).await.unwrap();
        assert_eq!(ctx.feedback, vec!["a:1"]);
    }

    #[tokio::test]
    async fn test_error_stops_the_chain() {
        let mut pipeline = ProcessingPipeline::new()
            .add_step(Box::new(Fail))
            .add_step(Box::new(Push("after", 0)));
        let mut ctx = context();
        assert!(pipeline.process(&mut ctx).await.is_err());
        assert!(ctx.feedback.is_empty());
    }
}
