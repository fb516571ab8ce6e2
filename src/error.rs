use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),
    #[error("Detection Error: {0}")]
    Detection(#[from] DetectionError),
    #[error("Recording Error: {0}")]
    Recording(#[from] RecordingError),
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Failed to bind to port {1}: {0}")]
    Bind(std::io::Error, u16),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("The session is already running.")]
    AlreadyRunning,
    #[error("The session is not running.")]
    NotRunning,
    #[error("Please select a video file.")]
    NoFileSelected,
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("Failed to open uploaded video: {0}")]
    Upload(String),
    #[error("Recording: {0}")]
    Recording(#[from] RecordingError),
    #[error("The session controller is no longer running.")]
    ControllerGone,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Detection model is not loaded")]
    ModelUnavailable,
    #[error("Detection timed out after {0}ms")]
    TimedOut(u64),
    #[error("Detection failed: {0}")]
    Failed(String),
    #[error("Failed to load replay detections: {0}")]
    Replay(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    #[error("Already recording")]
    AlreadyRecording,
    #[error("Capture handle {0} is not active")]
    NotRecording(u64),
    #[error("Failed to export clip: {0}")]
    Export(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("Capture device is already in use")]
    Busy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseError {
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
}
