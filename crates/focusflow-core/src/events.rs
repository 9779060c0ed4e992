use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};
use crate::timer::TimerMode;

/// Every state change in the core produces an Event.
/// Front ends subscribe to them or drain them from an [`EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The task collection changed; carries the full list in display order.
    TasksChanged {
        tasks: Vec<Task>,
    },
    TaskSelected {
        task_id: TaskId,
        description: String,
    },
    /// The selected task was deleted, completed or the account went away.
    SelectionCleared,
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerTick {
        remaining_secs: u32,
        mode: TimerMode,
    },
    FocusSessionCompleted {
        task_id: Option<TaskId>,
        task_description: Option<String>,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Timer switched mode and sits idle at the mode's full length.
    ModeChanged {
        mode: TimerMode,
        remaining_secs: u32,
    },
    StateSnapshot {
        mode: TimerMode,
        remaining_secs: u32,
        total_secs: u32,
        running: bool,
        clock: String,
        selected_task: Option<TaskId>,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
}

/// User-facing message for a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Event {
    /// Notification text for events the user should hear about.
    pub fn notification(&self) -> Option<Notification> {
        let (title, body) = match self {
            Event::FocusSessionCompleted {
                task_description: Some(description),
                ..
            } => (
                "Focus Session Complete",
                format!("Great job! You've completed a pomodoro for \"{description}\""),
            ),
            Event::FocusSessionCompleted { .. } => {
                ("Focus Session Complete", "Time for a break!".to_string())
            }
            Event::BreakCompleted { .. } => {
                ("Break Complete", "Ready to focus again?".to_string())
            }
            _ => return None,
        };
        Some(Notification {
            title: title.to_string(),
            body,
        })
    }
}

/// Receiver of published events.
pub trait EventSink {
    fn on_event(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> EventSink for F {
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Fan-out to subscribers plus a queue for front ends that poll.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    pending: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn publish(&mut self, event: Event) {
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
        self.pending.push(event);
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Take every event published since the last drain.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }
}
