use image::RgbImage;
use std::path::PathBuf;
use tokio::sync::oneshot;

use super::state::FeedbackView;
use crate::error::SessionError;
use crate::recording::Clip;

pub type Responder<T> = oneshot::Sender<T>;

pub enum SessionCommand {
    Start {
        responder: Responder<Result<(), SessionError>>,
    },
    Stop {
        responder: Responder<Result<Option<Clip>, SessionError>>,
    },
    Reset {
        responder: Responder<()>,
    },
    StartRecording {
        responder: Responder<Result<(), SessionError>>,
    },
    StopRecording {
        responder: Responder<Result<Option<Clip>, SessionError>>,
    },
    AnalyzeUpload {
        path: Option<PathBuf>,
        responder: Responder<Result<(), SessionError>>,
    },
    Snapshot {
        responder: Responder<FeedbackView>,
    },
    Canvas {
        responder: Responder<Option<RgbImage>>,
    },
}
