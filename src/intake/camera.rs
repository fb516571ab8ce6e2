use async_trait::async_trait;
use chrono::Utc;
use image::DynamicImage;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::frame_source::{FrameSource, SourceKind};
use crate::common::Frame;
use crate::error::CaptureError;

/// A live capture device. Opening may fail when the user denies access.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;
    fn release(&self);
}

type SenderSlot = Arc<Mutex<Option<mpsc::Sender<DynamicImage>>>>;

/// Camera fed by whatever owns the [`CameraFeed`]. Images pushed while the
/// camera is closed, or faster than the session drains them, are dropped.
pub struct ChannelCamera {
    slot: SenderSlot,
    buffer: usize,
    denied: Option<String>,
}

/// Producer side of a [`ChannelCamera`].
#[derive(Clone)]
pub struct CameraFeed {
    slot: SenderSlot,
}

impl ChannelCamera {
    pub fn new(buffer: usize) -> (Self, CameraFeed) {
        let slot: SenderSlot = Arc::new(Mutex::new(None));
        (
            Self {
                slot: slot.clone(),
                buffer: buffer.max(1),
                denied: None,
            },
            CameraFeed { slot },
        )
    }

    /// A camera whose permission prompt was refused.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            buffer: 1,
            denied: Some(reason.into()),
        }
    }
}

#[async_trait]
impl CaptureDevice for ChannelCamera {
    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        if let Some(reason) = &self.denied {
            return Err(CaptureError::PermissionDenied(reason.clone()));
        }
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(CaptureError::Busy);
        }
        let (tx, rx) = mpsc::channel(self.buffer);
        *slot = Some(tx);
        info!("Camera opened");
        Ok(Box::new(CameraSource { rx, next_index: 0 }))
    }

    fn release(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            info!("Camera released");
        }
    }
}

impl CameraFeed {
    /// Offers a captured image. Returns false when it was dropped.
    pub fn push(&self, image: DynamicImage) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(tx) => match tx.try_send(image) {
                Ok(()) => true,
                Err(e) => {
                    debug!("Camera frame dropped: {}", e);
                    false
                }
            },
            None => false,
        }
    }
}

struct CameraSource {
    rx: mpsc::Receiver<DynamicImage>,
    next_index: u64,
}

#[async_trait]
impl FrameSource for CameraSource {
    async fn next_frame(&mut self) -> Option<Frame> {
        let image = self.rx.recv().await?;
        let frame = Frame::new(self.next_index, image, Utc::now());
        self.next_index += 1;
        Some(frame)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Camera
    }
}
