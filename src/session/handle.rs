use image::RgbImage;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::command::{Responder, SessionCommand};
use super::state::FeedbackView;
use crate::error::SessionError;
use crate::recording::Clip;

/// Cloneable front door to a running [`super::SessionController`]. Every
/// UI trigger maps to one method.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    view_rx: watch::Receiver<FeedbackView>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        view_rx: watch::Receiver<FeedbackView>,
    ) -> Self {
        Self {
            command_tx,
            view_rx,
        }
    }

    pub async fn start(&self) -> Result<(), SessionError> {
        debug!("Requesting session start");
        self.request(|responder| SessionCommand::Start { responder })
            .await?
    }

    /// Stops the session. Returns the clip if a recording was still active.
    pub async fn stop(&self) -> Result<Option<Clip>, SessionError> {
        debug!("Requesting session stop");
        self.request(|responder| SessionCommand::Stop { responder })
            .await?
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        self.request(|responder| SessionCommand::Reset { responder })
            .await
    }

    pub async fn start_recording(&self) -> Result<(), SessionError> {
        self.request(|responder| SessionCommand::StartRecording { responder })
            .await?
    }

    pub async fn stop_recording(&self) -> Result<Option<Clip>, SessionError> {
        self.request(|responder| SessionCommand::StopRecording { responder })
            .await?
    }

    /// Analyzes an uploaded clip. `None` models the trigger firing with no
    /// file selected.
    pub async fn analyze_upload(&self, path: Option<PathBuf>) -> Result<(), SessionError> {
        self.request(|responder| SessionCommand::AnalyzeUpload { path, responder })
            .await?
    }

    pub async fn snapshot(&self) -> Result<FeedbackView, SessionError> {
        self.request(|responder| SessionCommand::Snapshot { responder })
            .await
    }

    /// The most recently rendered canvas, if any.
    pub async fn canvas(&self) -> Result<Option<RgbImage>, SessionError> {
        self.request(|responder| SessionCommand::Canvas { responder })
            .await
    }

    /// Latest published feedback; changes whenever a frame is surfaced or the
    /// lifecycle moves.
    pub fn subscribe(&self) -> watch::Receiver<FeedbackView> {
        self.view_rx.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Responder<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(command(responder))
            .await
            .map_err(|_| SessionError::ControllerGone)?;
        response_rx.await.map_err(|_| SessionError::ControllerGone)
    }
}
