pub mod capture;
pub mod coordinator;

pub use capture::{CaptureBackend, CaptureHandle, Clip, MemoryCapture};
pub use coordinator::RecordingCoordinator;
