use focusflow_core::Config;

use super::{open_flow, CmdResult};

pub fn run(json: bool) -> CmdResult {
    let config = Config::load_or_default();
    let flow = open_flow(&config)?;
    let stats = flow.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "Tasks:      {} total, {} active, {} completed",
        stats.total_tasks, stats.active_tasks, stats.completed_tasks
    );
    println!("Completion: {}%", stats.completion_rate);
    println!(
        "Pomodoros:  {} of {} ({}%)",
        stats.completed_pomodoros,
        stats.pomodoro_goal,
        stats.goal_progress()
    );
    Ok(())
}
