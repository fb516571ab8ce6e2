pub mod camera;
pub mod frame_source;
pub mod upload;

pub use camera::{CameraFeed, CaptureDevice, ChannelCamera};
pub use frame_source::{FrameSource, SourceKind};
pub use upload::UploadedVideo;
