use parking_lot::Mutex;

/// Text-to-speech capability. Fire-and-forget; implementations must not block.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str, language: &str);
}

/// Emits speech cues as tracing events for a client-side synthesizer to pick up.
#[derive(Debug, Default)]
pub struct TracingSpeaker;

impl Speaker for TracingSpeaker {
    fn speak(&self, text: &str, language: &str) {
        if text.trim().is_empty() {
            return;
        }
        tracing::debug!(text, language, "speech cue");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
}

/// Keeps every utterance; used in tests.
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<Utterance>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str, language: &str) {
        self.spoken.lock().push(Utterance {
            text: text.to_string(),
            language: language.to_string(),
        });
    }
}
