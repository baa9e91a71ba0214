//! Event recorder and replay.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::types::{Event, Recording};

/// Captures timestamped UI events between [`Recorder::start`] and
/// [`Recorder::stop`].
///
/// All methods take `&self`, so one recorder can be shared across threads.
///
/// ```rust
/// use session_replay_sdk::Recorder;
///
/// let recorder = Recorder::new();
/// recorder.start();
/// recorder.log("screen_view", "Login");
/// recorder.log("tap", "Login");
/// let recording = recorder.stop();
/// assert_eq!(recording.events.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    state: Mutex<RecorderState>,
}

#[derive(Debug, Default)]
struct RecorderState {
    recording: bool,
    started_at: i64,
    events: Vec<Event>,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a new recording, discarding any previously captured events.
    pub fn start(&self) {
        let mut state = self.state();
        state.recording = true;
        state.started_at = now_millis();
        state.events.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.state().recording
    }

    /// Capture an event. Ignored (returns `false`) while not recording.
    pub fn log(&self, kind: impl Into<String>, screen: impl Into<String>) -> bool {
        let mut state = self.state();
        if !state.recording {
            return false;
        }
        state.events.push(Event {
            kind: kind.into(),
            screen: screen.into(),
            timestamp: now_millis(),
        });
        true
    }

    /// Stop recording and return everything captured since `start`.
    pub fn stop(&self) -> Recording {
        let mut state = self.state();
        state.recording = false;
        Recording {
            started_at: state.started_at,
            ended_at: now_millis(),
            events: state.events.clone(),
        }
    }
}

/// Feed `recording`'s events to `on_event` in timestamp order, waiting
/// `delay` after each event, the last one included.
pub async fn replay<F>(recording: &Recording, delay: Duration, mut on_event: F)
where
    F: FnMut(&Event),
{
    for event in recording.ordered_events() {
        on_event(&event);
        tokio::time::sleep(delay).await;
    }
}
