use tracing::info;

/// Text handed to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            rate,
        }
    }
}

/// Fire-and-forget speech sink. The platform queues utterances; callers only
/// promise not to exceed what the rate limiter allows.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, utterance: Utterance);
}

/// Speech sink that writes utterances to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSpeech;

impl SpeechOutput for LoggingSpeech {
    fn speak(&self, utterance: Utterance) {
        info!(rate = utterance.rate, "Speaking: {}", utterance.text);
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Captures utterances so tests can assert on them.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingSpeech {
        spoken: Arc<Mutex<Vec<Utterance>>>,
    }

    impl RecordingSpeech {
        pub fn texts(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|u| u.text.clone())
                .collect()
        }
    }

    impl SpeechOutput for RecordingSpeech {
        fn speak(&self, utterance: Utterance) {
            self.spoken.lock().unwrap().push(utterance);
        }
    }
}
