use async_trait::async_trait;
use std::path::PathBuf;

use crate::common::Frame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Camera,
    Upload(PathBuf),
}

/// A stream of frames in capture order. `None` means the source is
/// exhausted.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<Frame>;
    fn kind(&self) -> SourceKind;
}
