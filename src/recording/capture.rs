use chrono::{DateTime, Utc};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::error::RecordingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(u64);

/// Encoder side of recording. Implementations own the buffered output
/// between `begin_capture` and `end_capture`.
pub trait CaptureBackend: Send {
    fn begin_capture(&mut self, fps: u32) -> Result<CaptureHandle, RecordingError>;
    fn push_frame(&mut self, handle: CaptureHandle, frame: &RgbImage) -> Result<(), RecordingError>;
    fn end_capture(&mut self, handle: CaptureHandle) -> Result<Clip, RecordingError>;
}

/// A finished recording.
#[derive(Debug, Clone)]
pub struct Clip {
    pub id: Uuid,
    pub fps: u32,
    pub started_at: DateTime<Utc>,
    pub frames: Vec<RgbImage>,
}

impl Clip {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames.len() as f64 / self.fps.max(1) as f64)
    }

    /// Writes the clip as a numbered PNG sequence under `dir/clip-<id>/`.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, RecordingError> {
        let target = dir.as_ref().join(format!("clip-{}", self.id));
        std::fs::create_dir_all(&target).map_err(|e| RecordingError::Export(e.to_string()))?;
        for (i, frame) in self.frames.iter().enumerate() {
            frame
                .save(target.join(format!("frame_{:05}.png", i)))
                .map_err(|e| RecordingError::Export(e.to_string()))?;
        }
        info!(
            "Exported clip {} ({} frames at {} fps) to {}",
            self.id,
            self.frames.len(),
            self.fps,
            target.display()
        );
        Ok(target)
    }
}

/// Buffers raw frames in memory; encoding is left to whoever consumes the
/// clip.
#[derive(Debug, Default)]
pub struct MemoryCapture {
    next_handle: u64,
    active: Option<(CaptureHandle, Clip)>,
}

impl CaptureBackend for MemoryCapture {
    fn begin_capture(&mut self, fps: u32) -> Result<CaptureHandle, RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        let handle = CaptureHandle(self.next_handle);
        self.next_handle += 1;
        self.active = Some((
            handle,
            Clip {
                id: Uuid::new_v4(),
                fps,
                started_at: Utc::now(),
                frames: Vec::new(),
            },
        ));
        Ok(handle)
    }

    fn push_frame(&mut self, handle: CaptureHandle, frame: &RgbImage) -> Result<(), RecordingError> {
        match self.active.as_mut() {
            Some((active, clip)) if *active == handle => {
                clip.frames.push(frame.clone());
                Ok(())
            }
            _ => Err(RecordingError::NotRecording(handle.0)),
        }
    }

    fn end_capture(&mut self, handle: CaptureHandle) -> Result<Clip, RecordingError> {
        match self.active.take() {
            Some((active, clip)) if active == handle => Ok(clip),
            other => {
                self.active = other;
                Err(RecordingError::NotRecording(handle.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_capture_collects_frames() {
        let mut capture = MemoryCapture::default();
        let handle = capture.begin_capture(30).unwrap();
        capture.push_frame(handle, &RgbImage::new(4, 4)).unwrap();
        capture.push_frame(handle, &RgbImage::new(4, 4)).unwrap();

        let clip = capture.end_capture(handle).unwrap();
        assert_eq!(clip.frames.len(), 2);
        assert_eq!(clip.fps, 30);
        assert!(capture.end_capture(handle).is_err());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut capture = MemoryCapture::default();
        let first = capture.begin_capture(30).unwrap();
        capture.end_capture(first).unwrap();
        let second = capture.begin_capture(30).unwrap();

        assert_eq!(
            capture.push_frame(first, &RgbImage::new(1, 1)),
            Err(RecordingError::NotRecording(0))
        );
        assert!(capture.end_capture(first).is_err());
        assert!(capture.end_capture(second).is_ok());
    }

    #[test]
    fn test_clip_duration_and_export() {
        let clip = Clip {
            id: Uuid::new_v4(),
            fps: 30,
            started_at: Utc::now(),
            frames: vec![RgbImage::new(4, 4); 15],
        };
        assert_eq!(clip.duration(), Duration::from_millis(500));

        let dir = std::env::temp_dir().join(format!("hoop-coach-clip-{}", Uuid::new_v4()));
        let target = clip.export(&dir).unwrap();
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 15);
        std::fs::remove_dir_all(dir).ok();
    }
}
