use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::Settings,
    error::{AppError, SessionError},
    intake::{CameraFeed, CaptureDevice, ChannelCamera},
    network::StaticServer,
    pipeline::{
        detection::{Detector, UnavailableDetector},
        services::{LoggingSpeech, SpeechOutput},
    },
    recording::{CaptureBackend, Clip, MemoryCapture},
    session::{SessionController, SessionHandle, SessionParts},
};

/// Owns the background tasks of one running application: the session
/// controller and, when enabled, the static file server.
pub struct Coordinator {
    session: SessionHandle,
    session_task: JoinHandle<()>,
    server_task: Option<JoinHandle<()>>,
    camera_feed: Option<CameraFeed>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn new(settings: Settings, parts: SessionParts, camera_feed: Option<CameraFeed>) -> Self {
        let cancel_token = CancellationToken::new();
        let server_task = settings
            .server
            .enabled
            .then(|| Self::start_server_task(&settings, cancel_token.clone()));
        let (session, session_task) = Self::start_session_task(settings, parts, cancel_token.clone());

        Self {
            session,
            session_task,
            server_task,
            camera_feed,
            cancel_token,
        }
    }

    fn start_session_task(
        settings: Settings,
        parts: SessionParts,
        cancel_token: CancellationToken,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (controller, handle) = SessionController::new(settings, parts, cancel_token);
        (handle, tokio::spawn(controller.run()))
    }

    fn start_server_task(settings: &Settings, cancel_token: CancellationToken) -> JoinHandle<()> {
        let server = StaticServer::new(settings.server.port, settings.server.static_dir.clone());
        tokio::spawn(async move {
            if let Err(e) = server.start(cancel_token).await {
                error!("Static server failed: {}", e);
            }
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Producer side of the built-in camera, when no custom capture device
    /// was supplied.
    pub fn camera_feed(&self) -> Option<&CameraFeed> {
        self.camera_feed.as_ref()
    }

    /// Stops the session, waits for the background tasks and hands back
    /// whatever was still being recorded.
    pub async fn shutdown(&mut self) -> Result<Option<Clip>, AppError> {
        let clip = match self.session.stop().await {
            Ok(Some(clip)) => Some(clip),
            Ok(None) | Err(SessionError::NotRunning) => self.session.stop_recording().await?,
            Err(e) => return Err(e.into()),
        };

        self.cancel_token.cancel();
        if let Err(e) = (&mut self.session_task).await {
            warn!("Session task ended abnormally: {}", e);
        }
        if let Some(server_task) = self.server_task.as_mut() {
            if let Err(e) = server_task.await {
                warn!("Server task ended abnormally: {}", e);
            }
        }
        info!("Coordinator shut down");
        Ok(clip)
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    detector: Option<Arc<dyn Detector>>,
    speech: Option<Arc<dyn SpeechOutput>>,
    camera: Option<Arc<dyn CaptureDevice>>,
    capture: Option<Box<dyn CaptureBackend>>,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            detector: None,
            speech: None,
            camera: None,
            capture: None,
        }
    }

    // Sets the static server port, this will override the configured value.
    pub fn port(mut self, port: u16) -> Self {
        self.settings.server.port = port;
        self
    }

    // Enables or disables the static server, this will override the configured value.
    pub fn serve_static(mut self, enabled: bool) -> Self {
        self.settings.server.enabled = enabled;
        self
    }

    // Adjusts the frame buffer size, this will override the configured value.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.settings.session.frame_buffer_size = frame_buffer_size;
        self
    }

    pub fn detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn camera(mut self, camera: Arc<dyn CaptureDevice>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn capture(mut self, capture: Box<dyn CaptureBackend>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Spawns the coordinator's tasks; must be called inside a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.settings.validate()?;

        let (camera, camera_feed): (Arc<dyn CaptureDevice>, _) = match self.camera {
            Some(camera) => (camera, None),
            None => {
                let (camera, feed) = ChannelCamera::new(self.settings.session.frame_buffer_size);
                (Arc::new(camera), Some(feed))
            }
        };

        let parts = SessionParts {
            detector: self.detector.unwrap_or_else(|| {
                warn!("No detector configured, every frame will fail detection");
                Arc::new(UnavailableDetector)
            }),
            speech: self.speech.unwrap_or_else(|| Arc::new(LoggingSpeech)),
            camera,
            capture: self
                .capture
                .unwrap_or_else(|| Box::new(MemoryCapture::default())),
        };

        Ok(Coordinator::new(self.settings, parts, camera_feed))
    }
}
