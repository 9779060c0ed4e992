//! Session engine.
//!
//! A tick-driven state machine. It owns no clock and no thread: the front end
//! calls `tick()` once per second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle (paused) -> Running -> ... -> Completed -> Idle (next mode)
//! ```
//!
//! `Completed` is transient: reaching zero runs the completion protocol and
//! lands in the next mode, idle at full length. Nothing auto-starts.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(Durations::default());
//! engine.select_task(&store, &task_id)?;
//! engine.start(&store)?;
//! // Once per second:
//! let events = engine.tick(&mut store);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::mode::{format_clock, Durations, TimerMode};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::task::TaskId;

/// The engine's only view of the task collection.
pub trait TaskLedger {
    /// The id names an existing, incomplete task.
    fn is_selectable(&self, id: &TaskId) -> bool;
    fn description(&self, id: &TaskId) -> Option<String>;
    /// Credit one pomodoro. Returns false if the id is unknown.
    fn increment_pomodoro(&mut self, id: &TaskId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEngine {
    durations: Durations,
    mode: TimerMode,
    remaining_secs: u32,
    running: bool,
    /// Lookup key into the ledger, never a copy of the task.
    #[serde(default)]
    selected_task: Option<TaskId>,
    #[serde(default)]
    completed_focus_count: u64,
}

impl SessionEngine {
    /// Idle in focus mode at full length.
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            mode: TimerMode::Focus,
            remaining_secs: durations.secs_for(TimerMode::Focus),
            running: false,
            selected_task: None,
            completed_focus_count: 0,
        }
    }

    /// Resume the lifetime focus counter from storage.
    pub fn with_completed_focus_count(mut self, count: u64) -> Self {
        self.completed_focus_count = count;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn selected_task(&self) -> Option<&TaskId> {
        self.selected_task.as_ref()
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.completed_focus_count
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn total_secs(&self) -> u32 {
        self.durations.secs_for(self.mode)
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            running: self.running,
            clock: self.clock(),
            selected_task: self.selected_task.clone(),
            completed_focus_count: self.completed_focus_count,
            at: Utc::now(),
        }
    }

    // ── Selection ────────────────────────────────────────────────────

    /// # Errors
    /// `NotFound` if the id does not name an open task.
    pub fn select_task(&mut self, ledger: &impl TaskLedger, id: &TaskId) -> Result<Event> {
        if !ledger.is_selectable(id) {
            return Err(CoreError::NotFound { id: id.to_string() });
        }
        let description = ledger.description(id).unwrap_or_default();
        self.selected_task = Some(id.clone());
        tracing::debug!(%id, "task selected");
        Ok(Event::TaskSelected {
            task_id: id.clone(),
            description,
        })
    }

    pub fn clear_selection(&mut self) -> Option<Event> {
        self.selected_task.take().map(|id| {
            tracing::debug!(%id, "selection cleared");
            Event::SelectionCleared
        })
    }

    /// Clear the selection if it points at `id`.
    pub fn clear_selection_if(&mut self, id: &TaskId) -> Option<Event> {
        if self.selected_task.as_ref() == Some(id) {
            self.clear_selection()
        } else {
            None
        }
    }

    /// Drop a selection that no longer resolves to an open task.
    pub fn revalidate(&mut self, ledger: &impl TaskLedger) -> Option<Event> {
        match &self.selected_task {
            Some(id) if !ledger.is_selectable(id) => self.clear_selection(),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume the countdown. `Ok(None)` if already running.
    ///
    /// # Errors
    /// `NoTaskSelected` in focus mode without a resolvable selection; the
    /// engine stays idle.
    pub fn start(&mut self, ledger: &impl TaskLedger) -> Result<Option<Event>> {
        if self.running {
            return Ok(None);
        }
        if self.mode == TimerMode::Focus
            && !self
                .selected_task
                .as_ref()
                .is_some_and(|id| ledger.is_selectable(id))
        {
            return Err(CoreError::NoTaskSelected);
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.total_secs();
        }
        self.running = true;
        tracing::debug!(mode = %self.mode, remaining = self.remaining_secs, "timer started");
        Ok(Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        tracing::debug!(remaining = self.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop and restore the current mode's full length.
    pub fn reset(&mut self) -> Event {
        self.running = false;
        self.remaining_secs = self.total_secs();
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    /// Switch mode by hand. Stops the countdown and loads the full length.
    pub fn set_mode(&mut self, mode: TimerMode) -> Event {
        self.running = false;
        self.mode = mode;
        self.remaining_secs = self.total_secs();
        tracing::debug!(%mode, "mode changed");
        Event::ModeChanged {
            mode,
            remaining_secs: self.remaining_secs,
        }
    }

    /// Swap in new lengths. An idle timer sitting at its full length picks up
    /// the new length; a partially run timer keeps its remaining time.
    pub fn set_durations(&mut self, durations: Durations) {
        let at_full = !self.running && self.remaining_secs == self.total_secs();
        self.durations = durations;
        if at_full {
            self.remaining_secs = self.total_secs();
        }
    }

    /// Advance one second. No-op while idle.
    pub fn tick(&mut self, ledger: &mut impl TaskLedger) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut events = vec![Event::TimerTick {
            remaining_secs: self.remaining_secs,
            mode: self.mode,
        }];
        if self.remaining_secs == 0 {
            events.extend(self.complete(ledger));
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, ledger: &mut impl TaskLedger) -> Vec<Event> {
        self.running = false;
        let mut events = Vec::new();

        let next = if self.mode == TimerMode::Focus {
            events.extend(self.revalidate(&*ledger));
            self.completed_focus_count += 1;

            let (task_id, task_description) = match self.selected_task.clone() {
                Some(id) => {
                    let description = ledger.description(&id);
                    if ledger.increment_pomodoro(&id) {
                        (Some(id), description)
                    } else {
                        (None, None)
                    }
                }
                None => (None, None),
            };
            tracing::info!(
                count = self.completed_focus_count,
                task = task_id.as_ref().map(TaskId::as_str).unwrap_or("-"),
                "focus session completed"
            );
            events.push(Event::FocusSessionCompleted {
                task_id,
                task_description,
                completed_focus_count: self.completed_focus_count,
                at: Utc::now(),
            });
            self.durations.break_after(self.completed_focus_count)
        } else {
            tracing::info!(mode = %self.mode, "break completed");
            events.push(Event::BreakCompleted {
                mode: self.mode,
                at: Utc::now(),
            });
            TimerMode::Focus
        };

        events.push(self.set_mode(next));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Minimal ledger: id -> (description, completed, pomodoros).
    #[derive(Default)]
    struct FakeLedger(HashMap<TaskId, (String, bool, u32)>);

    impl FakeLedger {
        fn with(ids: &[&str]) -> Self {
            Self(
                ids.iter()
                    .map(|id| (TaskId::from(*id), (format!("task {id}"), false, 0)))
                    .collect(),
            )
        }

        fn count(&self, id: &str) -> u32 {
            self.0[&TaskId::from(id)].2
        }
    }

    impl TaskLedger for FakeLedger {
        fn is_selectable(&self, id: &TaskId) -> bool {
            self.0.get(id).is_some_and(|t| !t.1)
        }

        fn description(&self, id: &TaskId) -> Option<String> {
            self.0.get(id).map(|t| t.0.clone())
        }

        fn increment_pomodoro(&mut self, id: &TaskId) -> bool {
            match self.0.get_mut(id) {
                Some(t) => {
                    t.2 += 1;
                    true
                }
                None => false,
            }
        }
    }

    fn short() -> Durations {
        Durations {
            focus_secs: 3,
            short_break_secs: 2,
            long_break_secs: 4,
            long_break_interval: 4,
        }
    }

    fn run_out(engine: &mut SessionEngine, ledger: &mut FakeLedger) -> Vec<Event> {
        let mut events = Vec::new();
        while engine.is_running() {
            events.extend(engine.tick(ledger));
        }
        events
    }

    #[test]
    fn starts_idle_in_focus_at_full_length() {
        let engine = SessionEngine::new(Durations::default());
        assert_eq!(engine.mode(), TimerMode::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.is_running());
        assert_eq!(engine.clock(), "25:00");
    }

    #[test]
    fn focus_start_without_selection_fails() {
        let ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        assert!(matches!(
            engine.start(&ledger),
            Err(CoreError::NoTaskSelected)
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn break_start_needs_no_selection() {
        let ledger = FakeLedger::default();
        let mut engine = SessionEngine::new(short());
        engine.set_mode(TimerMode::ShortBreak);
        assert!(engine.start(&ledger).unwrap().is_some());
        assert!(engine.is_running());
        assert!(engine.start(&ledger).unwrap().is_none());
    }

    #[test]
    fn select_unknown_or_completed_task_fails() {
        let mut ledger = FakeLedger::with(&["a"]);
        ledger.0.get_mut(&TaskId::from("a")).unwrap().1 = true;
        let mut engine = SessionEngine::new(short());
        assert!(matches!(
            engine.select_task(&ledger, &TaskId::from("zzz")),
            Err(CoreError::NotFound { .. })
        ));
        assert!(engine.select_task(&ledger, &TaskId::from("a")).is_err());
        assert!(engine.selected_task().is_none());
    }

    #[test]
    fn pause_preserves_remaining_and_idle_ticks_do_nothing() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        engine.start(&ledger).unwrap();
        engine.tick(&mut ledger);
        assert!(engine.pause().is_some());
        assert!(engine.pause().is_none());
        assert_eq!(engine.remaining_secs(), 2);
        assert!(engine.tick(&mut ledger).is_empty());
        assert_eq!(engine.remaining_secs(), 2);
    }

    #[test]
    fn reset_restores_full_length_from_any_state() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        engine.start(&ledger).unwrap();
        engine.tick(&mut ledger);
        engine.reset();
        assert_eq!(engine.remaining_secs(), 3);
        assert!(!engine.is_running());

        engine.set_mode(TimerMode::LongBreak);
        engine.start(&ledger).unwrap();
        engine.tick(&mut ledger);
        engine.reset();
        assert_eq!(engine.remaining_secs(), 4);
        assert!(!engine.is_running());
    }

    #[test]
    fn focus_completion_credits_selected_task_only() {
        let mut ledger = FakeLedger::with(&["a", "b"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        engine.start(&ledger).unwrap();
        let events = run_out(&mut engine, &mut ledger);

        assert_eq!(engine.completed_focus_count(), 1);
        assert_eq!(ledger.count("a"), 1);
        assert_eq!(ledger.count("b"), 0);
        assert_eq!(engine.mode(), TimerMode::ShortBreak);
        assert_eq!(engine.remaining_secs(), 2);
        assert!(!engine.is_running());
        assert_eq!(engine.selected_task(), Some(&TaskId::from("a")));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::FocusSessionCompleted { task_description: Some(d), .. } if d == "task a"
        )));
    }

    #[test]
    fn fourth_focus_earns_long_break() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        for round in 1..=4 {
            engine.start(&ledger).unwrap();
            run_out(&mut engine, &mut ledger);
            let expected = if round == 4 {
                TimerMode::LongBreak
            } else {
                TimerMode::ShortBreak
            };
            assert_eq!(engine.mode(), expected, "after focus #{round}");

            engine.start(&ledger).unwrap();
            let events = run_out(&mut engine, &mut ledger);
            assert!(events
                .iter()
                .any(|e| matches!(e, Event::BreakCompleted { .. })));
            assert_eq!(engine.mode(), TimerMode::Focus);
        }
        assert_eq!(ledger.count("a"), 4);
    }

    #[test]
    fn completing_with_stale_selection_credits_nobody() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        engine.start(&ledger).unwrap();
        ledger.0.clear();

        let events = run_out(&mut engine, &mut ledger);
        assert_eq!(engine.completed_focus_count(), 1);
        assert!(engine.selected_task().is_none());
        assert!(events.contains(&Event::SelectionCleared));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::FocusSessionCompleted { task_id: None, task_description: None, .. }
        )));
    }

    #[test]
    fn start_with_stale_selection_fails_without_clearing() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        ledger.0.clear();
        assert!(matches!(
            engine.start(&ledger),
            Err(CoreError::NoTaskSelected)
        ));
        assert_eq!(engine.revalidate(&ledger), Some(Event::SelectionCleared));
        assert_eq!(engine.revalidate(&ledger), None);
    }

    #[test]
    fn clear_selection_if_matches_only_selected() {
        let ledger = FakeLedger::with(&["a", "b"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        assert!(engine.clear_selection_if(&TaskId::from("b")).is_none());
        assert!(engine.clear_selection_if(&TaskId::from("a")).is_some());
        assert!(engine.selected_task().is_none());
    }

    #[test]
    fn set_durations_updates_idle_full_timer_only() {
        let mut ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.set_durations(Durations::default());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        engine.start(&ledger).unwrap();
        engine.tick(&mut ledger);
        engine.pause();
        engine.set_durations(short());
        assert_eq!(engine.remaining_secs(), 1499);
    }

    #[test]
    fn snapshot_reflects_state() {
        let engine = SessionEngine::new(Durations::default()).with_completed_focus_count(7);
        match engine.snapshot() {
            Event::StateSnapshot {
                mode,
                remaining_secs,
                total_secs,
                running,
                clock,
                completed_focus_count,
                ..
            } => {
                assert_eq!(mode, TimerMode::Focus);
                assert_eq!(remaining_secs, 1500);
                assert_eq!(total_secs, 1500);
                assert!(!running);
                assert_eq!(clock, "25:00");
                assert_eq!(completed_focus_count, 7);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn engine_survives_serde_roundtrip() {
        let ledger = FakeLedger::with(&["a"]);
        let mut engine = SessionEngine::new(short());
        engine.select_task(&ledger, &TaskId::from("a")).unwrap();
        let json = serde_json::to_string(&engine).unwrap();
        let back: SessionEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, engine);
    }
}
