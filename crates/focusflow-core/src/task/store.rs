use chrono::{Local, NaiveDate};

use super::{sort_for_display, Priority, Task, TaskFilter, TaskId, TaskPatch};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{keys, KeyValueStore, UserRecord};
use crate::timer::TaskLedger;

/// Owner of the task collection.
///
/// Mutations are written through to the active account's record in the
/// backing store. Without an account they stay in memory. Write failures are
/// logged and otherwise ignored.
pub struct TaskStore<K> {
    backend: K,
    /// Active account. Its `tasks` field is kept empty; `tasks` below is authoritative.
    account: Option<UserRecord>,
    tasks: Vec<Task>,
}

impl<K: KeyValueStore> TaskStore<K> {
    /// Open the store, resuming the account recorded in `backend` if any.
    pub fn open(backend: K) -> Self {
        let mut store = Self {
            backend,
            account: None,
            tasks: Vec::new(),
        };
        match store.backend.get(keys::USER) {
            Ok(Some(json)) => match serde_json::from_str::<UserRecord>(&json) {
                Ok(mut record) => {
                    store.tasks = std::mem::take(&mut record.tasks);
                    tracing::debug!(
                        email = %record.email,
                        tasks = store.tasks.len(),
                        "resumed account"
                    );
                    store.account = Some(record);
                }
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable user record"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read user record"),
        }
        store
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn backend(&self) -> &K {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut K {
        &mut self.backend
    }

    pub fn account(&self) -> Option<&UserRecord> {
        self.account.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.account.is_some()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Filtered tasks in display order, judging "due today" by the local date.
    pub fn list(&self, filter: TaskFilter) -> Vec<Task> {
        self.list_on(filter, Local::now().date_naive())
    }

    pub fn list_on(&self, filter: TaskFilter, today: NaiveDate) -> Vec<Task> {
        let mut out: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| filter.matches(t, today))
            .cloned()
            .collect();
        sort_for_display(&mut out);
        out
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add(
        &mut self,
        description: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription.into());
        }
        let task = Task::new(description.to_string(), priority, due_date);
        tracing::debug!(id = %task.id, %priority, "task added");
        self.tasks.push(task.clone());
        self.persist();
        Ok(task)
    }

    /// Flip completion. Returns the new state, or `None` if the id is unknown.
    pub fn toggle_completion(&mut self, id: &TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| &t.id == id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        tracing::debug!(%id, completed, "task toggled");
        self.persist();
        Some(completed)
    }

    /// Remove a task. Returns whether anything was removed.
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| &t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            tracing::debug!(%id, "task deleted");
            self.persist();
        }
        removed
    }

    /// Apply a partial update. Returns `Ok(false)` if the id is unknown.
    ///
    /// # Errors
    /// `Validation` if the patch would leave the description empty; the task is
    /// left untouched in that case.
    pub fn edit(&mut self, id: &TaskId, patch: TaskPatch) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            return Ok(false);
        };
        let description = match patch.description.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::EmptyDescription.into()),
            other => other.map(str::to_string),
        };
        if let Some(d) = description {
            task.description = d;
        }
        if let Some(p) = patch.priority {
            task.priority = p;
        }
        if let Some(due) = patch.due_date {
            task.due_date = due;
        }
        if let Some(c) = patch.completed {
            task.completed = c;
        }
        self.persist();
        Ok(true)
    }

    pub fn increment_pomodoro(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            return false;
        };
        task.pomodoro_count += 1;
        tracing::debug!(%id, count = task.pomodoro_count, "pomodoro credited");
        self.persist();
        true
    }

    // ── Account ──────────────────────────────────────────────────────

    /// Make `record` the active account.
    ///
    /// Tasks created while signed out are carried into the account after the
    /// record's own tasks, then everything is persisted.
    pub fn sign_in(&mut self, mut record: UserRecord) {
        let mut tasks = std::mem::take(&mut record.tasks);
        for pending in self.tasks.drain(..) {
            if !tasks.iter().any(|t| t.id == pending.id) {
                tasks.push(pending);
            }
        }
        tracing::info!(email = %record.email, tasks = tasks.len(), "signed in");
        self.tasks = tasks;
        self.account = Some(record);
        self.persist();
    }

    /// Drop the active account and its tasks from memory and from the store.
    /// Returns the record that was active.
    pub fn sign_out(&mut self) -> Option<UserRecord> {
        let record = self.account.take()?;
        self.tasks.clear();
        if let Err(e) = self.backend.remove(keys::USER) {
            tracing::warn!(error = %e, "could not remove user record");
        }
        tracing::info!(email = %record.email, "signed out");
        Some(record)
    }

    pub fn update_profile(&mut self, name: Option<&str>, pomodoro_goal: Option<u32>) -> Result<()> {
        let account = self.account.as_mut().ok_or(CoreError::NotSignedIn)?;
        account.update_profile(name, pomodoro_goal);
        self.persist();
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self) {
        let Some(account) = &self.account else {
            return;
        };
        let record = UserRecord {
            tasks: self.tasks.clone(),
            ..account.clone()
        };
        let result = serde_json::to_string(&record)
            .map_err(CoreError::from)
            .and_then(|json| Ok(self.backend.set(keys::USER, &json)?));
        if let Err(e) = result {
            tracing::warn!(error = %e, "task changes kept in memory only");
        }
    }
}

impl<K: KeyValueStore> TaskLedger for TaskStore<K> {
    fn is_selectable(&self, id: &TaskId) -> bool {
        self.get(id).is_some_and(|t| !t.completed)
    }

    fn description(&self, id: &TaskId) -> Option<String> {
        self.get(id).map(|t| t.description.clone())
    }

    fn increment_pomodoro(&mut self, id: &TaskId) -> bool {
        TaskStore::increment_pomodoro(self, id)
    }
}
