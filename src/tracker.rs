//! Bounded event log for fabrication activity (spec.md §5: "tracker/
//! logger is appended-only with a bounded ring buffer (500 events)").
//!
//! A plain `VecDeque` behind a `Mutex` — the teacher reaches for a crate
//! only when `std` genuinely can't express the shape (`lazy_static`,
//! `bitflags`); a capped ring buffer needs nothing more than
//! `pop_front` eviction.

use std::collections::VecDeque;
use std::time::SystemTime;

use tokio::sync::Mutex;

/// Cap named directly in spec.md §5.
pub const TRACKER_CAPACITY: usize = 500;

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Emitted before a fabrication stream starts.
    LlmStart {
        context: String,
        path: String,
        depth_or_mime: Option<String>,
        model: String,
        prompt_preview: String,
        at: SystemTime,
    },
    /// Emitted once the stream completes, successfully or not.
    LlmEnd {
        context: String,
        path: String,
        tool_calls_applied: usize,
        bytes_written: usize,
        at: SystemTime,
    },
}

/// Append-only, bounded event log. Cloneable handles share one buffer
/// via `Arc` at the call site — `Tracker` itself holds no `Arc`, mapping
/// the teacher's preference for plain ownership over hidden sharing.
#[derive(Default)]
pub struct Tracker {
    events: Mutex<VecDeque<TrackerEvent>>,
}

impl Tracker {
    pub fn new() -> Tracker {
        Tracker::default()
    }

    pub async fn push(&self, event: TrackerEvent) {
        let mut events = self.events.lock().await;
        if events.len() >= TRACKER_CAPACITY {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub async fn snapshot(&self) -> Vec<TrackerEvent> {
        self.events.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_event(path: &str) -> TrackerEvent {
        TrackerEvent::LlmStart {
            context: "listing".to_string(),
            path: path.to_string(),
            depth_or_mime: None,
            model: "gpt-test".to_string(),
            prompt_preview: "preview".to_string(),
            at: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn records_events_in_order() {
        let tracker = Tracker::new();
        tracker.push(start_event("/a")).await;
        tracker.push(start_event("/b")).await;
        let snap = tracker.snapshot().await;
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test]
    async fn evicts_oldest_past_capacity() {
        let tracker = Tracker::new();
        for i in 0..(TRACKER_CAPACITY + 10) {
            tracker.push(start_event(&format!("/p{i}"))).await;
        }
        assert_eq!(tracker.len().await, TRACKER_CAPACITY);
        let snap = tracker.snapshot().await;
        match &snap[0] {
            TrackerEvent::LlmStart { path, .. } => assert_eq!(path, "/p10"),
            _ => panic!("expected LlmStart"),
        }
    }
}
