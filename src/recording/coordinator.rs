use image::RgbImage;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use super::capture::{CaptureBackend, CaptureHandle, Clip};
use crate::error::RecordingError;

struct ActiveRecording {
    handle: CaptureHandle,
    last_frame_at: Option<Instant>,
}

/// Sequences start/stop of canvas capture against the session and paces
/// rendered frames to the target frame rate.
pub struct RecordingCoordinator {
    backend: Box<dyn CaptureBackend>,
    fps: u32,
    active: Option<ActiveRecording>,
}

impl RecordingCoordinator {
    pub fn new(backend: Box<dyn CaptureBackend>, fps: u32) -> Self {
        Self {
            backend,
            fps: fps.max(1),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self) -> Result<(), RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        let handle = self.backend.begin_capture(self.fps)?;
        self.active = Some(ActiveRecording {
            handle,
            last_frame_at: None,
        });
        info!("Recording started at {} fps", self.fps);
        Ok(())
    }

    /// Offers a rendered canvas. Frames closer together than the frame
    /// interval are skipped.
    pub fn offer(&mut self, canvas: &RgbImage, now: Instant) {
        let frame_interval = self.frame_interval();
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active
            .last_frame_at
            .is_some_and(|last| now.saturating_duration_since(last) < frame_interval)
        {
            return;
        }
        match self.backend.push_frame(active.handle, canvas) {
            Ok(()) => active.last_frame_at = Some(now),
            Err(e) => warn!("Dropping recorded frame: {}", e),
        }
    }

    /// Finalizes the active recording. Returns `None` when idle.
    pub fn stop(&mut self) -> Result<Option<Clip>, RecordingError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let clip = self.backend.end_capture(active.handle)?;
        info!(
            "Recording stopped: {} frames ({:.1}s)",
            clip.frames.len(),
            clip.duration().as_secs_f32()
        );
        Ok(Some(clip))
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::MemoryCapture;

    fn coordinator() -> RecordingCoordinator {
        RecordingCoordinator::new(Box::new(MemoryCapture::default()), 30)
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut recording = coordinator();
        assert!(matches!(recording.stop(), Ok(None)));
        assert!(!recording.is_recording());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut recording = coordinator();
        recording.start().unwrap();
        assert_eq!(recording.start(), Err(RecordingError::AlreadyRecording));
        assert!(recording.is_recording());
    }

    #[test]
    fn test_frames_are_paced_to_fps() {
        let mut recording = coordinator();
        recording.start().unwrap();
        let start = Instant::now();
        let canvas = RgbImage::new(4, 4);

        // 100 offers at 10ms spacing over one second.
        for i in 0..100u64 {
            recording.offer(&canvas, start + Duration::from_millis(i * 10));
        }

        let clip = recording.stop().unwrap().unwrap();
        // One frame per 40ms step (ceil of 33.3ms to the 10ms grid).
        assert_eq!(clip.frames.len(), 25);
        assert!(!recording.is_recording());
    }

    #[test]
    fn test_offer_while_idle_is_ignored() {
        let mut recording = coordinator();
        recording.offer(&RgbImage::new(4, 4), Instant::now());
        recording.start().unwrap();
        let clip = recording.stop().unwrap().unwrap();
        assert!(clip.frames.is_empty());
    }

    #[test]
    fn test_restart_after_stop() {
        let mut recording = coordinator();
        recording.start().unwrap();
        recording.stop().unwrap();
        assert!(recording.start().is_ok());
    }
}
