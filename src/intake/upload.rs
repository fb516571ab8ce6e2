use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::frame_source::{FrameSource, SourceKind};
use crate::common::Frame;
use crate::error::SessionError;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// An uploaded clip, supplied as a directory of decoded frame images (or a
/// single image). Frames play back at a fixed interval.
pub struct UploadedVideo {
    path: PathBuf,
    frames: Vec<PathBuf>,
    position: usize,
    ticker: Interval,
}

impl UploadedVideo {
    pub async fn open(path: impl AsRef<Path>, frame_interval: Duration) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let frames = list_frames(&path).await?;
        if frames.is_empty() {
            return Err(SessionError::Upload(format!(
                "{} contains no frame images",
                path.display()
            )));
        }
        info!("Loaded upload {} with {} frames", path.display(), frames.len());

        Ok(Self {
            path,
            frames,
            position: 0,
            ticker: playback_ticker(frame_interval),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[async_trait]
impl FrameSource for UploadedVideo {
    async fn next_frame(&mut self) -> Option<Frame> {
        while self.position < self.frames.len() {
            self.ticker.tick().await;
            let index = self.position;
            let file = self.frames[index].clone();
            self.position += 1;

            match tokio::task::spawn_blocking(move || image::open(&file)).await {
                Ok(Ok(image)) => return Some(Frame::new(index as u64, image, Utc::now())),
                Ok(Err(e)) => warn!("Skipping undecodable upload frame {}: {}", index, e),
                Err(e) => warn!("Upload frame {} decode task failed: {}", index, e),
            }
        }
        debug!("Upload {} finished", self.path.display());
        None
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Upload(self.path.clone())
    }
}

fn playback_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

async fn list_frames(path: &Path) -> Result<Vec<PathBuf>, SessionError> {
    let upload_error = |e: std::io::Error| SessionError::Upload(format!("{}: {}", path.display(), e));
    let metadata = tokio::fs::metadata(path).await.map_err(upload_error)?;

    if metadata.is_file() {
        return Ok(if is_frame_file(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await.map_err(upload_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(upload_error)? {
        let file = entry.path();
        if is_frame_file(&file) {
            frames.push(file);
        }
    }
    frames.sort();
    Ok(frames)
}
