pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod network;
pub mod pipeline;
pub mod recording;
pub mod session;

pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{AppError, DetectionError, RecordingError, SessionError};
pub use session::{FeedbackView, SessionHandle, SessionState};
