use chrono::Utc;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use super::command::SessionCommand;
use super::handle::SessionHandle;
use super::state::{FeedbackView, SessionState};
use crate::common::Frame;
use crate::config::Settings;
use crate::error::{DetectionError, SessionError};
use crate::intake::{CaptureDevice, FrameSource, SourceKind, UploadedVideo};
use crate::pipeline::detection::{detection_stack, DetectionResult, DetectionStack, Detector};
use crate::pipeline::orchestration::{FrameContext, ProcessingPipeline, ProcessingStepType};
use crate::pipeline::services::{FeedbackRateLimiter, SpeechOutput, Utterance};
use crate::pipeline::coaching_pipeline;
use crate::recording::{CaptureBackend, Clip, RecordingCoordinator};

pub const SESSION_STOPPED_NOTICE: &str = "AI coaching session stopped.";

/// External collaborators the controller drives.
pub struct SessionParts {
    pub detector: Arc<dyn Detector>,
    pub speech: Arc<dyn SpeechOutput>,
    pub camera: Arc<dyn CaptureDevice>,
    pub capture: Box<dyn CaptureBackend>,
}

struct ActiveSource {
    kind: SourceKind,
    pump: JoinHandle<()>,
}

struct DetectionCompletion {
    epoch: u64,
    frame: Arc<Frame>,
    outcome: Result<DetectionResult, DetectionError>,
    elapsed: Duration,
}

/// Owns all per-session state. Frames, detection results, repeat timers and
/// UI commands are serialized through one task, so pipeline passes never
/// overlap and results from an earlier run are recognized by their epoch.
pub struct SessionController {
    settings: Settings,
    state: SessionState,
    epoch: u64,
    in_flight: bool,
    consecutive_failures: u32,
    failure_reported: bool,

    pipeline: ProcessingPipeline,
    detection: DetectionStack,
    limiter: FeedbackRateLimiter,
    speech: Arc<dyn SpeechOutput>,
    camera: Arc<dyn CaptureDevice>,
    recording: RecordingCoordinator,

    source: Option<ActiveSource>,
    frame_rx: Option<mpsc::Receiver<Frame>>,
    canvas: Option<RgbImage>,
    view: FeedbackView,

    command_rx: mpsc::Receiver<SessionCommand>,
    completion_tx: mpsc::Sender<DetectionCompletion>,
    completion_rx: mpsc::Receiver<DetectionCompletion>,
    view_tx: watch::Sender<FeedbackView>,
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(
        settings: Settings,
        parts: SessionParts,
        cancel: CancellationToken,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(settings.session.command_buffer_size);
        let (completion_tx, completion_rx) = mpsc::channel(4);
        let (view_tx, view_rx) = watch::channel(FeedbackView::default());

        let controller = Self {
            pipeline: coaching_pipeline(&settings),
            detection: detection_stack(parts.detector, settings.detection.timeout()),
            limiter: FeedbackRateLimiter::new(
                settings.feedback.speech_cooldown(),
                settings.feedback.repeat_delay(),
            ),
            speech: parts.speech,
            camera: parts.camera,
            recording: RecordingCoordinator::new(parts.capture, settings.recording.fps),
            settings,
            state: SessionState::Idle,
            epoch: 0,
            in_flight: false,
            consecutive_failures: 0,
            failure_reported: false,
            source: None,
            frame_rx: None,
            canvas: None,
            view: FeedbackView::default(),
            command_rx,
            completion_tx,
            completion_rx,
            view_tx,
            cancel,
        };

        (controller, SessionHandle::new(command_tx, view_rx))
    }

    pub async fn run(mut self) {
        info!("Session controller started");

        loop {
            let repeat_due = self.limiter.pending_repeat().map(|r| r.due_at);

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Session controller cancelled");
                    break;
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        info!("All session handles dropped");
                        break;
                    }
                },
                frame = next_frame(&mut self.frame_rx) => match frame {
                    Some(frame) => self.admit_frame(frame),
                    None => self.source_finished(),
                },
                Some(done) = self.completion_rx.recv() => self.complete_frame(done).await,
                _ = sleep_until_due(repeat_due), if repeat_due.is_some() => self.speak_repeat(),
            }
        }

        self.shutdown();
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start { responder } => {
                let result = self.start().await;
                let _ = responder.send(result);
            }
            SessionCommand::Stop { responder } => {
                let result = self.stop();
                let _ = responder.send(result);
            }
            SessionCommand::Reset { responder } => {
                self.reset().await;
                let _ = responder.send(());
            }
            SessionCommand::StartRecording { responder } => {
                let result = self.recording.start().map_err(SessionError::from);
                self.publish();
                let _ = responder.send(result);
            }
            SessionCommand::StopRecording { responder } => {
                let result = self.recording.stop().map_err(SessionError::from);
                self.publish();
                let _ = responder.send(result);
            }
            SessionCommand::AnalyzeUpload { path, responder } => {
                let result = self.analyze_upload(path).await;
                let _ = responder.send(result);
            }
            SessionCommand::Snapshot { responder } => {
                let _ = responder.send(self.view.clone());
            }
            SessionCommand::Canvas { responder } => {
                let _ = responder.send(self.canvas.clone());
            }
        }
    }

    async fn start(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            return Err(SessionError::AlreadyRunning);
        }

        match self.camera.open().await {
            Ok(source) => {
                self.begin_run(source);
                info!("Coaching session started on camera");
                Ok(())
            }
            Err(e) => {
                error!("Could not open camera: {}", e);
                self.state = SessionState::Stopped;
                self.view.notice = Some(e.to_string());
                self.publish();
                Err(SessionError::CameraUnavailable(e.to_string()))
            }
        }
    }

    fn stop(&mut self) -> Result<Option<Clip>, SessionError> {
        match self.state {
            SessionState::Idle => return Err(SessionError::NotRunning),
            SessionState::Stopped => return Ok(None),
            SessionState::Running => {}
        }

        self.state = SessionState::Stopped;
        self.invalidate_in_flight();
        self.stop_source();
        self.camera.release();

        let clip = match self.recording.stop() {
            Ok(clip) => clip,
            Err(e) => {
                warn!("Failed to finalize recording on stop: {}", e);
                None
            }
        };

        self.limiter.reset();
        self.canvas = None;
        self.view.messages.clear();
        self.view.notice = Some(SESSION_STOPPED_NOTICE.to_string());
        self.publish();
        info!("Coaching session stopped");
        Ok(clip)
    }

    async fn reset(&mut self) {
        self.invalidate_in_flight();
        self.limiter.reset();
        self.pipeline.reset();
        self.canvas = None;
        self.view.messages.clear();
        self.view.notice = None;
        self.view.scores = 0;
        self.consecutive_failures = 0;
        self.failure_reported = false;
        if self.state == SessionState::Stopped {
            self.state = SessionState::Idle;
        }

        if let Some(SourceKind::Upload(path)) = self.source.as_ref().map(|s| s.kind.clone()) {
            self.stop_source();
            if self.state == SessionState::Running {
                self.restart_upload(path).await;
            }
        }

        self.publish();
        debug!("Session reset (epoch {})", self.epoch);
    }

    async fn analyze_upload(&mut self, path: Option<PathBuf>) -> Result<(), SessionError> {
        let Some(path) = path else {
            let err = SessionError::NoFileSelected;
            self.view.notice = Some(err.to_string());
            self.publish();
            return Err(err);
        };

        match UploadedVideo::open(&path, self.settings.upload.frame_interval()).await {
            Ok(upload) => {
                if self
                    .source
                    .as_ref()
                    .is_some_and(|s| s.kind == SourceKind::Camera)
                {
                    self.stop_source();
                    self.camera.release();
                }
                self.begin_run(Box::new(upload));
                info!("Analyzing uploaded video {}", path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Upload rejected: {}", e);
                self.view.notice = Some(e.to_string());
                self.publish();
                Err(e)
            }
        }
    }

    async fn restart_upload(&mut self, path: PathBuf) {
        match UploadedVideo::open(&path, self.settings.upload.frame_interval()).await {
            Ok(upload) => self.attach_source(Box::new(upload)),
            Err(e) => {
                warn!("Could not rewind upload: {}", e);
                self.view.notice = Some(e.to_string());
            }
        }
    }

    fn begin_run(&mut self, source: Box<dyn FrameSource>) {
        self.stop_source();
        self.invalidate_in_flight();
        self.limiter.reset();
        self.pipeline.reset();
        self.canvas = None;
        self.consecutive_failures = 0;
        self.failure_reported = false;
        self.view.messages.clear();
        self.view.notice = None;
        self.view.scores = 0;
        self.view.stats = Default::default();

        self.attach_source(source);
        self.state = SessionState::Running;
        self.publish();
    }

    fn attach_source(&mut self, mut source: Box<dyn FrameSource>) {
        let (frame_tx, frame_rx) = mpsc::channel(self.settings.session.frame_buffer_size);
        let kind = source.kind();
        let pump = tokio::spawn(async move {
            while let Some(frame) = source.next_frame().await {
                if frame_tx.send(frame).await.is_err() {
                    break;
                }
            }
        });
        self.source = Some(ActiveSource { kind, pump });
        self.frame_rx = Some(frame_rx);
    }

    fn stop_source(&mut self) {
        if let Some(source) = self.source.take() {
            source.pump.abort();
            debug!("Detached {:?} source", source.kind);
        }
        self.frame_rx = None;
    }

    /// Results already in flight belong to the previous epoch and will be
    /// discarded on arrival.
    fn invalidate_in_flight(&mut self) {
        self.epoch += 1;
        self.in_flight = false;
    }

    fn source_finished(&mut self) {
        self.frame_rx = None;
        if let Some(source) = self.source.as_ref() {
            info!("{:?} source finished", source.kind);
        }
    }

    fn admit_frame(&mut self, frame: Frame) {
        if self.state != SessionState::Running {
            return;
        }
        if self.in_flight {
            self.view.stats.frames_dropped += 1;
            debug!("Dropping frame {} while detection is busy", frame.index());
            return;
        }

        self.in_flight = true;
        let epoch = self.epoch;
        let frame = Arc::new(frame);
        let detection = self.detection.clone();
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = detection.oneshot(frame.clone()).await;
            let done = DetectionCompletion {
                epoch,
                frame,
                outcome,
                elapsed: started.elapsed(),
            };
            let _ = completion_tx.send(done).await;
        });
    }

    async fn complete_frame(&mut self, done: DetectionCompletion) {
        if done.epoch != self.epoch || self.state != SessionState::Running {
            self.view.stats.results_discarded += 1;
            debug!(
                "Discarding detection for frame {} from epoch {}",
                done.frame.index(),
                done.epoch
            );
            return;
        }
        self.in_flight = false;

        match done.outcome {
            Ok(result) => {
                self.consecutive_failures = 0;
                self.surface(done.frame, result, done.elapsed).await;
            }
            Err(e) => self.record_failure(e),
        }
        self.publish();
    }

    async fn surface(&mut self, frame: Arc<Frame>, result: DetectionResult, elapsed: Duration) {
        let now = Instant::now();
        let mut context = FrameContext::new(frame, result, now);
        context
            .metrics
            .record_duration(ProcessingStepType::Detection, elapsed.as_micros() as u64);

        if let Err(e) = self.pipeline.process(&mut context).await {
            warn!("Frame {} failed in pipeline: {}", context.frame.index(), e);
            return;
        }

        self.view.messages = context.feedback.clone();
        let joined = context.feedback.join(". ");
        self.announce(&joined, now);

        // Scoring events are already debounced; they bypass the limiter so
        // technique dedup and its pending repeat stay untouched.
        if context.scored {
            let message = self.settings.goal.score_message.clone();
            self.view.scores += 1;
            info!("Scoring event #{}", self.view.scores);
            self.speak(&message);
            self.view.messages.push(message);
        }

        if let Some(canvas) = context.canvas.take() {
            self.recording.offer(&canvas, now);
            self.canvas = Some(canvas);
        }

        self.view.stats.frames_processed += 1;
        debug!(
            frame = context.frame.index(),
            frame_id = %context.frame.id(),
            age_ms = (Utc::now() - context.frame.captured_at()).num_milliseconds(),
            detection_us = context.metrics.detection_duration_us,
            total_us = context.metrics.total_processing_duration_us,
            "Frame surfaced"
        );
    }

    fn announce(&mut self, text: &str, now: Instant) {
        if self.limiter.consider(text, now).should_speak {
            self.speak(text);
        }
    }

    fn speak_repeat(&mut self) {
        if let Some(text) = self.limiter.take_due_repeat(Instant::now()) {
            debug!("Repeating feedback");
            self.speak(&text);
        }
    }

    fn speak(&self, text: &str) {
        self.speech
            .speak(Utterance::new(text, self.settings.feedback.speech_rate));
    }

    fn record_failure(&mut self, err: DetectionError) {
        self.consecutive_failures += 1;
        self.view.stats.detection_failures += 1;
        warn!(
            "Detection failed ({} in a row): {}",
            self.consecutive_failures, err
        );

        if !self.failure_reported
            && self.consecutive_failures >= self.settings.detection.failure_notice_after
        {
            self.failure_reported = true;
            error!("Detection keeps failing, notifying user");
            self.view.notice = Some(format!("Pose detection is unavailable: {}", err));
        }
    }

    fn publish(&mut self) {
        self.view.state = self.state;
        self.view.recording = self.recording.is_recording();
        self.view_tx.send_replace(self.view.clone());
    }

    fn shutdown(&mut self) {
        self.stop_source();
        if self.state == SessionState::Running {
            self.camera.release();
        }
        if let Ok(Some(clip)) = self.recording.stop() {
            warn!(
                "Session shut down with an active recording; {} frames discarded",
                clip.frames.len()
            );
        }
        info!("Session controller stopped");
    }
}

async fn next_frame(frame_rx: &mut Option<mpsc::Receiver<Frame>>) -> Option<Frame> {
    match frame_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
