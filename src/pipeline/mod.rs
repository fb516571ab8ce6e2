pub mod detection;
pub mod orchestration;
pub mod pipeline_factory;
pub mod services;
pub mod steps;

pub use detection::{DetectionResult, Detector};
pub use orchestration::{FrameContext, ProcessingPipeline, ProcessingStep};
pub use pipeline_factory::coaching_pipeline;
