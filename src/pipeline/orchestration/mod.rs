pub mod frame_context;
pub mod processing_step;

pub use frame_context::{FrameContext, FrameMetrics, ProcessingStepType};
pub use processing_step::{ProcessingPipeline, ProcessingStep};
