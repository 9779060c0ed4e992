pub mod account;
pub mod config;
pub mod stats;
pub mod task;
pub mod theme;
pub mod timer;

use focusflow_core::{Config, Database, FocusFlow, TaskId};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the data directory's database and continue the saved timer.
pub fn open_flow(config: &Config) -> Result<FocusFlow<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(FocusFlow::resume(db, config.durations()))
}

/// Accept a full task id or an unambiguous prefix of one.
pub fn resolve_task_id(flow: &FocusFlow<Database>, raw: &str) -> Result<TaskId, String> {
    let raw = raw.trim();
    let matches: Vec<&TaskId> = flow
        .store()
        .iter()
        .map(|t| &t.id)
        .filter(|id| id.as_str().starts_with(raw))
        .collect();
    if let Some(exact) = matches.iter().find(|id| id.as_str() == raw) {
        return Ok((*exact).clone());
    }
    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Ok(TaskId::from(raw)),
        _ => Err(format!("ambiguous task id prefix '{raw}' ({} matches)", matches.len())),
    }
}

/// First eight characters of an id for tables.
pub fn short_id(id: &TaskId) -> &str {
    let s = id.as_str();
    s.get(..8).unwrap_or(s)
}
