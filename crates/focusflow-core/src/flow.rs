//! The command surface front ends talk to.
//!
//! [`FocusFlow`] owns one [`TaskStore`], one [`SessionEngine`] and one
//! [`EventBus`]. Every command mutates through here so that selection
//! invalidation, counter persistence and event publishing happen in one place.

use chrono::NaiveDate;

use crate::error::Result;
use crate::events::{Event, EventBus, EventSink};
use crate::stats::DashboardStats;
use crate::storage::{keys, KeyValueStore, UserRecord};
use crate::task::{Priority, Task, TaskFilter, TaskId, TaskPatch, TaskStore};
use crate::timer::{Durations, SessionEngine, TimerMode};

pub struct FocusFlow<K> {
    store: TaskStore<K>,
    engine: SessionEngine,
    bus: EventBus,
}

impl<K: KeyValueStore> FocusFlow<K> {
    /// Fresh idle engine, lifetime counter read from `backend`.
    pub fn open(backend: K, durations: Durations) -> Self {
        let store = TaskStore::open(backend);
        let count = read_parsed(store.backend(), keys::COMPLETED_POMODOROS).unwrap_or(0);
        Self {
            engine: SessionEngine::new(durations).with_completed_focus_count(count),
            store,
            bus: EventBus::new(),
        }
    }

    /// Like [`open`](Self::open), but continues the engine saved by
    /// [`save_engine`](Self::save_engine) if there is one.
    pub fn resume(backend: K, durations: Durations) -> Self {
        let mut flow = Self::open(backend, durations);
        let saved = flow
            .store
            .backend()
            .get(keys::TIMER_ENGINE)
            .ok()
            .flatten()
            .and_then(|json| match serde_json::from_str::<SessionEngine>(&json) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable timer state");
                    None
                }
            });
        if let Some(mut engine) = saved {
            engine.set_durations(durations);
            let count = flow.engine.completed_focus_count();
            flow.engine = engine.with_completed_focus_count(count);
            flow.engine.revalidate(&flow.store);
        }
        flow
    }

    /// Store the engine state for a later [`resume`](Self::resume).
    pub fn save_engine(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.engine)?;
        self.store.backend_mut().set(keys::TIMER_ENGINE, &json)?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &TaskStore<K> {
        &self.store
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn account(&self) -> Option<&UserRecord> {
        self.store.account()
    }

    pub fn list_tasks(&self, filter: TaskFilter) -> Vec<Task> {
        self.store.list(filter)
    }

    /// Tasks a focus session can be attached to.
    pub fn selectable_tasks(&self) -> Vec<Task> {
        self.store.list(TaskFilter::Active)
    }

    /// The selected task, if it still resolves.
    pub fn selected_task(&self) -> Option<&Task> {
        self.engine.selected_task().and_then(|id| self.store.get(id))
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::compute(
            self.store.iter(),
            self.engine.completed_focus_count(),
            self.store.account().map(|a| a.pomodoro_goal),
        )
    }

    pub fn dark_mode(&self) -> bool {
        read_parsed(self.store.backend(), keys::DARK_MODE).unwrap_or(false)
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) {
        self.bus.subscribe(sink);
    }

    /// Events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    // ── Task commands ────────────────────────────────────────────────

    pub fn add_task(
        &mut self,
        description: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> Result<Task> {
        let task = self.store.add(description, priority, due_date)?;
        self.publish_tasks();
        Ok(task)
    }

    /// Returns `Ok(false)` when the id is unknown.
    pub fn edit_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<bool> {
        let completes = patch.completed == Some(true);
        if !self.store.edit(id, patch)? {
            return Ok(false);
        }
        if completes {
            self.clear_selection_if(id);
        }
        self.publish_tasks();
        Ok(true)
    }

    pub fn delete_task(&mut self, id: &TaskId) -> bool {
        if !self.store.delete(id) {
            return false;
        }
        self.clear_selection_if(id);
        self.publish_tasks();
        true
    }

    /// Returns the new completion state, `None` for an unknown id.
    pub fn toggle_task(&mut self, id: &TaskId) -> Option<bool> {
        let completed = self.store.toggle_completion(id)?;
        if completed {
            self.clear_selection_if(id);
        }
        self.publish_tasks();
        Some(completed)
    }

    pub fn select_task(&mut self, id: &TaskId) -> Result<()> {
        let event = self.engine.select_task(&self.store, id)?;
        self.bus.publish(event);
        Ok(())
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Result<()> {
        if let Some(event) = self.engine.revalidate(&self.store) {
            self.bus.publish(event);
        }
        if let Some(event) = self.engine.start(&self.store)? {
            self.bus.publish(event);
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(event) = self.engine.pause() {
            self.bus.publish(event);
        }
    }

    pub fn reset(&mut self) {
        let event = self.engine.reset();
        self.bus.publish(event);
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        let event = self.engine.set_mode(mode);
        self.bus.publish(event);
    }

    /// Advance the timer one second.
    pub fn tick(&mut self) {
        let events = self.engine.tick(&mut self.store);
        let focus_done = events
            .iter()
            .any(|e| matches!(e, Event::FocusSessionCompleted { .. }));
        self.bus.publish_all(events);
        if focus_done {
            let count = self.engine.completed_focus_count().to_string();
            self.write_flag(keys::COMPLETED_POMODOROS, &count);
            self.publish_tasks();
        }
    }

    // ── Account ──────────────────────────────────────────────────────

    pub fn sign_up(&mut self, email: &str, password: &str, confirm: &str) -> Result<()> {
        let record = UserRecord::sign_up(email, password, confirm)?;
        self.activate(record);
        Ok(())
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let record = UserRecord::sign_in(email, password)?;
        self.activate(record);
        Ok(())
    }

    /// Returns false if nobody was signed in.
    pub fn sign_out(&mut self) -> bool {
        if self.store.sign_out().is_none() {
            return false;
        }
        if let Some(event) = self.engine.clear_selection() {
            self.bus.publish(event);
        }
        self.publish_tasks();
        true
    }

    pub fn update_profile(&mut self, name: Option<&str>, pomodoro_goal: Option<u32>) -> Result<()> {
        self.store.update_profile(name, pomodoro_goal)
    }

    // ── Theme ────────────────────────────────────────────────────────

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.write_flag(keys::DARK_MODE, if enabled { "true" } else { "false" });
    }

    /// Returns the new setting.
    pub fn toggle_dark_mode(&mut self) -> bool {
        let enabled = !self.dark_mode();
        self.set_dark_mode(enabled);
        enabled
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Signing in as the active account keeps its tasks; a different
    /// address replaces it.
    fn activate(&mut self, record: UserRecord) {
        if self
            .store
            .account()
            .is_some_and(|current| current.email == record.email)
        {
            return;
        }
        if self.store.is_signed_in() {
            self.sign_out();
        }
        self.store.sign_in(record);
        self.publish_tasks();
    }

    fn clear_selection_if(&mut self, id: &TaskId) {
        if let Some(event) = self.engine.clear_selection_if(id) {
            self.bus.publish(event);
        }
    }

    fn publish_tasks(&mut self) {
        let tasks = self.store.list(TaskFilter::All);
        self.bus.publish(Event::TasksChanged { tasks });
    }

    fn write_flag(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.backend_mut().set(key, value) {
            tracing::warn!(key, error = %e, "setting kept in memory only");
        }
    }
}

fn read_parsed<T: std::str::FromStr>(backend: &impl KeyValueStore, key: &str) -> Option<T> {
    match backend.get(key) {
        Ok(Some(raw)) => raw.trim().parse().ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn short() -> Durations {
        Durations {
            focus_secs: 2,
            short_break_secs: 1,
            long_break_secs: 3,
            long_break_interval: 4,
        }
    }

    fn signed_in() -> FocusFlow<MemoryStore> {
        let mut flow = FocusFlow::open(MemoryStore::new(), short());
        flow.sign_in("ada@example.com", "pw").unwrap();
        flow
    }

    fn run_focus(flow: &mut FocusFlow<MemoryStore>) {
        flow.start().unwrap();
        while flow.engine().is_running() {
            flow.tick();
        }
    }

    #[test]
    fn deleting_selected_task_clears_selection() {
        let mut flow = signed_in();
        let task = flow.add_task("Write report", Priority::High, None).unwrap();
        flow.select_task(&task.id).unwrap();
        flow.drain_events();

        assert!(flow.delete_task(&task.id));
        assert!(flow.engine().selected_task().is_none());
        assert!(flow.drain_events().contains(&Event::SelectionCleared));
        assert!(matches!(flow.start(), Err(CoreError::NoTaskSelected)));
        assert!(!flow.engine().is_running());
    }

    #[test]
    fn completing_selected_task_clears_selection() {
        let mut flow = signed_in();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.select_task(&task.id).unwrap();
        assert_eq!(flow.toggle_task(&task.id), Some(true));
        assert!(flow.engine().selected_task().is_none());

        let other = flow.add_task("b", Priority::Low, None).unwrap();
        flow.select_task(&other.id).unwrap();
        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(flow.edit_task(&other.id, patch).unwrap());
        assert!(flow.engine().selected_task().is_none());
    }

    #[test]
    fn toggling_other_task_keeps_selection() {
        let mut flow = signed_in();
        let a = flow.add_task("a", Priority::Low, None).unwrap();
        let b = flow.add_task("b", Priority::Low, None).unwrap();
        flow.select_task(&a.id).unwrap();
        flow.toggle_task(&b.id);
        assert_eq!(flow.engine().selected_task(), Some(&a.id));
    }

    #[test]
    fn every_task_mutation_publishes_tasks_changed() {
        let mut flow = signed_in();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        flow.subscribe(move |e: &Event| {
            if matches!(e, Event::TasksChanged { .. }) {
                *counter.borrow_mut() += 1;
            }
        });

        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.toggle_task(&task.id);
        flow.edit_task(&task.id, TaskPatch::default()).unwrap();
        flow.delete_task(&task.id);
        assert_eq!(*seen.borrow(), 4);

        flow.delete_task(&task.id);
        flow.toggle_task(&task.id);
        assert_eq!(*seen.borrow(), 4);
    }

    #[test]
    fn focus_completion_persists_counter_and_credits_task() {
        let mut flow = signed_in();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.select_task(&task.id).unwrap();
        run_focus(&mut flow);

        assert_eq!(flow.store().get(&task.id).unwrap().pomodoro_count, 1);
        assert_eq!(flow.engine().mode(), TimerMode::ShortBreak);
        let backend = flow.store().backend().clone();
        assert_eq!(
            backend.get(keys::COMPLETED_POMODOROS).unwrap().as_deref(),
            Some("1")
        );

        let reopened = FocusFlow::open(backend, short());
        assert_eq!(reopened.engine().completed_focus_count(), 1);
        assert_eq!(reopened.store().get(&task.id).unwrap().pomodoro_count, 1);
    }

    #[test]
    fn completion_notification_carries_description() {
        let mut flow = signed_in();
        let task = flow.add_task("Write report", Priority::High, None).unwrap();
        flow.select_task(&task.id).unwrap();
        run_focus(&mut flow);

        let notes: Vec<_> = flow
            .drain_events()
            .iter()
            .filter_map(Event::notification)
            .collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].body,
            "Great job! You've completed a pomodoro for \"Write report\""
        );
    }

    #[test]
    fn signed_out_tasks_stay_in_memory() {
        let mut flow = FocusFlow::open(MemoryStore::new(), short());
        flow.add_task("scratch", Priority::Low, None).unwrap();
        assert!(flow.store().backend().get(keys::USER).unwrap().is_none());

        flow.sign_up("bob@example.com", "pw", "pw").unwrap();
        assert_eq!(flow.store().len(), 1);
        assert!(flow.store().backend().get(keys::USER).unwrap().is_some());
    }

    #[test]
    fn sign_up_rejects_mismatched_passwords() {
        let mut flow = FocusFlow::open(MemoryStore::new(), short());
        assert!(matches!(
            flow.sign_up("bob@example.com", "one", "two"),
            Err(CoreError::Validation(_))
        ));
        assert!(flow.account().is_none());
    }

    #[test]
    fn sign_out_drops_tasks_and_selection() {
        let mut flow = signed_in();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.select_task(&task.id).unwrap();
        assert!(flow.sign_out());
        assert!(flow.store().is_empty());
        assert!(flow.engine().selected_task().is_none());
        assert!(!flow.sign_out());
    }

    #[test]
    fn signing_in_as_another_user_replaces_tasks() {
        let mut flow = signed_in();
        flow.add_task("ada's", Priority::Low, None).unwrap();
        flow.sign_in("ada@example.com", "pw").unwrap();
        assert_eq!(flow.store().len(), 1);

        flow.sign_in("bob@example.com", "pw").unwrap();
        assert!(flow.store().is_empty());
        assert_eq!(flow.account().unwrap().name, "bob");
    }

    #[test]
    fn dark_mode_is_independent_of_account() {
        let mut flow = FocusFlow::open(MemoryStore::new(), short());
        assert!(!flow.dark_mode());
        assert!(flow.toggle_dark_mode());
        flow.sign_in("ada@example.com", "pw").unwrap();
        flow.sign_out();
        assert!(flow.dark_mode());
        flow.set_dark_mode(false);
        assert!(!flow.dark_mode());
    }

    #[test]
    fn stats_use_account_goal() {
        let mut flow = signed_in();
        flow.update_profile(None, Some(4)).unwrap();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.add_task("b", Priority::Low, None).unwrap();
        flow.toggle_task(&task.id);

        let stats = flow.stats();
        assert_eq!(stats.completion_rate, 50);
        assert_eq!(stats.pomodoro_goal, 4);
    }

    #[test]
    fn selectable_tasks_exclude_completed() {
        let mut flow = signed_in();
        let a = flow.add_task("a", Priority::Low, None).unwrap();
        flow.add_task("b", Priority::High, None).unwrap();
        flow.toggle_task(&a.id);
        let names: Vec<_> = flow
            .selectable_tasks()
            .into_iter()
            .map(|t| t.description)
            .collect();
        assert_eq!(names, ["b"]);
        assert!(flow.select_task(&a.id).is_err());
    }

    #[test]
    fn resume_restores_saved_engine() {
        let mut flow = signed_in();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.select_task(&task.id).unwrap();
        flow.start().unwrap();
        flow.tick();
        flow.pause();
        flow.save_engine().unwrap();

        let resumed = FocusFlow::resume(flow.store().backend().clone(), short());
        assert_eq!(resumed.engine().remaining_secs(), 1);
        assert_eq!(resumed.engine().selected_task(), Some(&task.id));
        assert_eq!(resumed.selected_task().unwrap().description, "a");
    }

    #[test]
    fn resume_drops_selection_of_vanished_task() {
        let mut flow = signed_in();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.select_task(&task.id).unwrap();
        flow.save_engine().unwrap();

        let mut backend = flow.store().backend().clone();
        backend.remove(keys::USER).unwrap();
        let resumed = FocusFlow::resume(backend, short());
        assert!(resumed.engine().selected_task().is_none());
    }

    #[test]
    fn read_only_backend_degrades_to_memory() {
        let mut flow = FocusFlow::open(MemoryStore::read_only(), short());
        flow.sign_in("ada@example.com", "pw").unwrap();
        let task = flow.add_task("a", Priority::Low, None).unwrap();
        flow.set_dark_mode(true);
        assert_eq!(flow.store().get(&task.id).unwrap().description, "a");
        assert!(flow.save_engine().is_err());
    }
}
