use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};

use super::{DetectionResult, Detector};
use crate::common::Frame;
use crate::error::DetectionError;

/// Detection behind the timeout layer, as handed to the session.
pub type DetectionStack = BoxCloneService<Arc<Frame>, DetectionResult, DetectionError>;

/// Runs the three models concurrently for one frame.
#[derive(Clone)]
pub struct DetectionService {
    inner: Arc<dyn Detector>,
}

impl DetectionService {
    pub fn new(inner: Arc<dyn Detector>) -> Self {
        Self { inner }
    }
}

impl Service<Arc<Frame>> for DetectionService {
    type Response = DetectionResult;
    type Error = DetectionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: Arc<Frame>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let (pose, hands, objects) = tokio::join!(
                inner.detect_pose(&frame),
                inner.detect_hands(&frame),
                inner.detect_objects(&frame)
            );
            tracing::trace!(detector = inner.name(), frame = frame.index(), "Detection finished");

            // Only the pose model is required; hand and ball output degrade to empty.
            let hands = hands.unwrap_or_else(|e| {
                tracing::warn!(frame = frame.index(), "Hand detection failed: {}", e);
                None
            });
            let objects = objects.unwrap_or_else(|e| {
                tracing::warn!(frame = frame.index(), "Object detection failed: {}", e);
                Vec::new()
            });
            Ok(DetectionResult {
                pose: pose?,
                hands,
                objects,
            })
        })
    }
}

/// Wraps a detector with a dead-man timeout so a stalled model call cannot
/// hold the session's busy flag forever.
pub fn detection_stack(detector: Arc<dyn Detector>, timeout: Duration) -> DetectionStack {
    let timeout_ms = timeout.as_millis() as u64;
    ServiceBuilder::new()
        .map_err(move |err: BoxError| classify_error(err, timeout_ms))
        .timeout(timeout)
        .service(DetectionService::new(detector))
        .boxed_clone()
}

fn classify_error(err: BoxError, timeout_ms: u64) -> DetectionError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return DetectionError::TimedOut(timeout_ms);
    }
    match err.downcast::<DetectionError>() {
        Ok(err) => *err,
        Err(other) => DetectionError::Failed(other.to_string()),
    }
}
