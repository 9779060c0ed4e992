//! Task management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use focusflow_core::{Config, Priority, Task, TaskFilter, TaskPatch};

use super::{open_flow, resolve_task_id, short_id, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new task
    Add {
        /// What needs doing
        description: String,
        /// low, medium or high
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List tasks, open high-priority ones first
    List {
        /// all, active, completed, high or today
        #[arg(long, short, default_value = "all")]
        filter: TaskFilter,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit fields of a task
    Edit {
        /// Task ID or unique prefix
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task done, or open again
    Toggle {
        /// Task ID or unique prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique prefix
        id: String,
    },
    /// Attach the timer to a task
    Select {
        /// Task ID or unique prefix
        id: String,
    },
}

fn print_table(tasks: &[Task], selected: Option<&Task>) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    for task in tasks {
        let marker = if selected.is_some_and(|s| s.id == task.id) { ">" } else { " " };
        let check = if task.completed { "x" } else { " " };
        let due = task
            .due_date
            .map(|d| format!("  due {d}"))
            .unwrap_or_default();
        println!(
            "{marker} [{check}] {}  {:<6}  {} ({} pomodoros){due}",
            short_id(&task.id),
            task.priority.to_string(),
            task.description,
            task.pomodoro_count,
        );
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut flow = open_flow(&config)?;

    match action {
        TaskAction::Add {
            description,
            priority,
            due,
        } => {
            let task = flow.add_task(&description, priority, due)?;
            if flow.account().is_none() {
                eprintln!("note: not signed in, task will not be saved");
            }
            println!("Task created: {}", task.id);
        }
        TaskAction::List { filter, json } => {
            let tasks = flow.list_tasks(filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print_table(&tasks, flow.selected_task());
            }
        }
        TaskAction::Edit {
            id,
            description,
            priority,
            due,
            clear_due,
            completed,
        } => {
            let id = resolve_task_id(&flow, &id)?;
            let patch = TaskPatch {
                description,
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                completed,
            };
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            if flow.edit_task(&id, patch)? {
                println!("Task updated: {id}");
            } else {
                println!("No task {id}");
            }
        }
        TaskAction::Toggle { id } => {
            let id = resolve_task_id(&flow, &id)?;
            match flow.toggle_task(&id) {
                Some(true) => println!("Completed: {id}"),
                Some(false) => println!("Reopened: {id}"),
                None => println!("No task {id}"),
            }
        }
        TaskAction::Delete { id } => {
            let id = resolve_task_id(&flow, &id)?;
            if flow.delete_task(&id) {
                println!("Task deleted: {id}");
            } else {
                println!("No task {id}");
            }
        }
        TaskAction::Select { id } => {
            let id = resolve_task_id(&flow, &id)?;
            flow.select_task(&id)?;
            if let Some(task) = flow.selected_task() {
                println!("Selected: {}", task.description);
            }
        }
    }

    flow.save_engine()?;
    Ok(())
}
