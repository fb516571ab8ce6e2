use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_SPEECH_COOLDOWN: Duration = Duration::from_millis(5_000);
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(15_000);

/// Outcome of offering one joined feedback text to the limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechDecision {
    pub should_display: bool,
    pub should_speak: bool,
    pub scheduled_repeat_at: Option<Instant>,
}

/// A repeat of previously spoken text waiting for its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRepeat {
    pub text: String,
    pub due_at: Instant,
}

/// Throttles spoken feedback so identical text is not repeated every frame.
///
/// Display is never throttled. Speech happens when the text is new, or when
/// the cooldown has passed since the last utterance. Each utterance may arm a
/// single delayed repeat, which is dropped if newer text was spoken first.
#[derive(Debug, Clone)]
pub struct FeedbackRateLimiter {
    cooldown: Duration,
    repeat_delay: Option<Duration>,
    last_spoken: Option<String>,
    last_spoken_at: Option<Instant>,
    pending_repeat: Option<PendingRepeat>,
}

impl Default for FeedbackRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_SPEECH_COOLDOWN, Some(DEFAULT_REPEAT_DELAY))
    }
}

impl FeedbackRateLimiter {
    pub fn new(cooldown: Duration, repeat_delay: Option<Duration>) -> Self {
        Self {
            cooldown,
            repeat_delay,
            last_spoken: None,
            last_spoken_at: None,
            pending_repeat: None,
        }
    }

    pub fn consider(&mut self, text: &str, now: Instant) -> SpeechDecision {
        let should_speak = !text.is_empty() && (self.is_new_text(text) || self.cooled_down(now));

        if !should_speak {
            return SpeechDecision {
                should_display: true,
                should_speak: false,
                scheduled_repeat_at: None,
            };
        }

        self.last_spoken = Some(text.to_string());
        self.last_spoken_at = Some(now);
        self.pending_repeat = self.repeat_delay.map(|delay| PendingRepeat {
            text: text.to_string(),
            due_at: now + delay,
        });
        debug!("Speaking feedback: {}", text);

        SpeechDecision {
            should_display: true,
            should_speak: true,
            scheduled_repeat_at: self.pending_repeat.as_ref().map(|r| r.due_at),
        }
    }

    /// Consumes the pending repeat when it is due. Returns the text to speak
    /// if it still matches what was last spoken.
    pub fn take_due_repeat(&mut self, now: Instant) -> Option<String> {
        if self.pending_repeat.as_ref()?.due_at > now {
            return None;
        }
        let repeat = self.pending_repeat.take()?;
        if self.last_spoken.as_deref() != Some(repeat.text.as_str()) {
            debug!("Dropping superseded repeat: {}", repeat.text);
            return None;
        }
        self.last_spoken_at = Some(now);
        Some(repeat.text)
    }

    pub fn pending_repeat(&self) -> Option<&PendingRepeat> {
        self.pending_repeat.as_ref()
    }

    pub fn last_spoken(&self) -> Option<&str> {
        self.last_spoken.as_deref()
    }

    pub fn reset(&mut self) {
        self.last_spoken = None;
        self.last_spoken_at = None;
        self.pending_repeat = None;
    }

    fn is_new_text(&self, text: &str) -> bool {
        self.last_spoken.as_deref() != Some(text)
    }

    fn cooled_down(&self, now: Instant) -> bool {
        // Never spoken counts as spoken at minus infinity.
        self.last_spoken_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown)
    }
}
