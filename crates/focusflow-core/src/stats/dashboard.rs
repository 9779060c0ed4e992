//! Dashboard summary
//!
//! Aggregates shown on the dashboard view:
//! - **Tasks**: total, completed, still active
//! - **Completion rate**: completed share of all tasks as a rounded percent
//! - **Pomodoros**: lifetime completed focus sessions against the daily goal

use serde::{Deserialize, Serialize};

use crate::storage::account::DEFAULT_POMODORO_GOAL;
use crate::task::Task;

/// Figures for the dashboard view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Number of tasks in the collection
    pub total_tasks: usize,
    /// Tasks marked completed
    pub completed_tasks: usize,
    /// Tasks still open
    pub active_tasks: usize,
    /// Completed share in percent (0-100), 0 for an empty list
    pub completion_rate: u8,
    /// Lifetime completed focus sessions
    pub completed_pomodoros: u64,
    /// Pomodoros the user aims for per day
    pub pomodoro_goal: u32,
}

impl DashboardStats {
    /// Compute stats over `tasks`. `pomodoro_goal` falls back to the default
    /// when no account is active.
    pub fn compute<'a>(
        tasks: impl IntoIterator<Item = &'a Task>,
        completed_pomodoros: u64,
        pomodoro_goal: Option<u32>,
    ) -> Self {
        let (total, completed) = tasks.into_iter().fold((0usize, 0usize), |(t, c), task| {
            (t + 1, c + usize::from(task.completed))
        });
        let completion_rate = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total_tasks: total,
            completed_tasks: completed,
            active_tasks: total - completed,
            completion_rate,
            completed_pomodoros,
            pomodoro_goal: pomodoro_goal.unwrap_or(DEFAULT_POMODORO_GOAL),
        }
    }

    /// Progress towards the goal in percent, capped at 100.
    pub fn goal_progress(&self) -> u8 {
        if self.pomodoro_goal == 0 {
            return 0;
        }
        let pct = (self.completed_pomodoros as f64 / self.pomodoro_goal as f64) * 100.0;
        pct.round().min(100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::{Priority, TaskStore};

    fn store_with(done: usize, open: usize) -> TaskStore<MemoryStore> {
        let mut store = TaskStore::open(MemoryStore::new());
        for i in 0..done {
            let t = store.add(&format!("done {i}"), Priority::Low, None).unwrap();
            store.toggle_completion(&t.id);
        }
        for i in 0..open {
            store.add(&format!("open {i}"), Priority::Low, None).unwrap();
        }
        store
    }

    #[test]
    fn empty_list_has_zero_rate() {
        let stats = DashboardStats::compute(std::iter::empty(), 0, None);
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.pomodoro_goal, DEFAULT_POMODORO_GOAL);
    }

    #[test]
    fn rate_is_rounded_percent() {
        let store = store_with(1, 2);
        let stats = DashboardStats::compute(store.iter(), 3, Some(6));
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.active_tasks, 2);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.goal_progress(), 50);

        let store = store_with(2, 1);
        assert_eq!(DashboardStats::compute(store.iter(), 0, None).completion_rate, 67);
    }

    #[test]
    fn goal_progress_caps_at_hundred() {
        let stats = DashboardStats::compute(std::iter::empty(), 20, Some(8));
        assert_eq!(stats.goal_progress(), 100);
    }
}
