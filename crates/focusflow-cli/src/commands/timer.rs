use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use focusflow_core::integrations::{ActivityClient, CompletionCounter, FALLBACK_ACTIVITY};
use focusflow_core::timer::format_clock;
use focusflow_core::{Config, Database, Event, FocusFlow, TimerMode};

use super::{open_flow, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause, keeping the remaining time
    Pause,
    /// Stop and restore the current mode's full length
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Advance the timer by whole seconds
    Tick {
        /// Number of seconds
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },
    /// Start and count down in the foreground until the session ends
    Run,
    /// Switch mode: focus, short_break or long_break
    Mode { mode: TimerMode },
}

/// Outbound helpers built from the integrations config section.
struct Reactions {
    notify: bool,
    bell: bool,
    activity: Option<ActivityClient>,
    counter: Option<CompletionCounter>,
    timeout: Duration,
}

impl Reactions {
    fn from_config(config: &Config) -> Self {
        let activity = ActivityClient::from_config(&config.integrations)
            .map_err(|e| tracing::warn!(error = %e, "break suggestions disabled"))
            .ok();
        let counter = CompletionCounter::from_config(&config.integrations)
            .map_err(|e| tracing::warn!(error = %e, "completion counter disabled"))
            .ok()
            .flatten();
        Self {
            notify: config.notifications.enabled,
            bell: config.notifications.sound,
            activity,
            counter,
            timeout: Duration::from_millis(config.integrations.timeout_ms),
        }
    }

    /// Print notifications and run the best-effort calls for `events`.
    ///
    /// The engine must already be saved. These calls can stall for up to `timeout`.
    async fn handle(&self, events: &[Event]) {
        let mut hits = Vec::new();
        for event in events {
            if self.notify {
                if let Some(n) = event.notification() {
                    let bell = if self.bell { "\x07" } else { "" };
                    println!("{bell}{}: {}", n.title, n.body);
                }
            }
            match event {
                Event::FocusSessionCompleted { .. } => {
                    if let Some(counter) = &self.counter {
                        hits.push(counter.spawn_hit());
                    }
                }
                Event::ModeChanged { mode, .. } if mode.is_break() => {
                    println!("Break idea: {}", self.suggestion().await);
                }
                _ => {}
            }
        }
        if hits.is_empty() {
            return;
        }
        let pending = async {
            for hit in hits {
                if let Err(e) = hit.await {
                    tracing::debug!(error = %e, "completion counter task failed");
                }
            }
        };
        if tokio::time::timeout(self.timeout, pending).await.is_err() {
            tracing::debug!("completion counter still pending at exit");
        }
    }

    async fn suggestion(&self) -> String {
        match &self.activity {
            Some(client) => client.suggest_break_activity().await,
            None => FALLBACK_ACTIVITY.to_string(),
        }
    }
}

fn print_status(flow: &FocusFlow<Database>) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(&flow.engine().snapshot())?);
    Ok(())
}

fn print_line(flow: &FocusFlow<Database>) {
    let engine = flow.engine();
    let state = if engine.is_running() { "running" } else { "idle" };
    let task = flow
        .selected_task()
        .map(|t| format!("  [{}]", t.description))
        .unwrap_or_default();
    println!("{} {} ({state}){task}", engine.mode().label(), engine.clock());
}

/// Status text from the tick payload. The completing tick reads 00:00 in the
/// mode that just finished.
fn countdown_line(events: &[Event]) -> Option<String> {
    events.iter().find_map(|e| match e {
        Event::TimerTick {
            mode,
            remaining_secs,
        } => Some(format!("{} {}", mode.label(), format_clock(*remaining_secs))),
        _ => None,
    })
}

/// Count down once per second until the session completes or Ctrl-C.
async fn run_foreground(flow: &mut FocusFlow<Database>, reactions: &Reactions) -> CmdResult {
    flow.start()?;
    flow.drain_events();

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                flow.tick();
                let events = flow.drain_events();
                if let Some(line) = countdown_line(&events) {
                    print!("\r{line}  ");
                    std::io::stdout().flush()?;
                }

                let done = events.iter().any(|e| {
                    matches!(e, Event::FocusSessionCompleted { .. } | Event::BreakCompleted { .. })
                });
                if done {
                    println!();
                    flow.save_engine()?;
                    reactions.handle(&events).await;
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                flow.pause();
                println!();
                println!("Paused at {}", flow.engine().clock());
                break;
            }
        }
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut flow = open_flow(&config)?;
    let reactions = Reactions::from_config(&config);
    let runtime = tokio::runtime::Runtime::new()?;

    match action {
        TimerAction::Start => {
            flow.start()?;
            print_line(&flow);
        }
        TimerAction::Pause => {
            flow.pause();
            print_line(&flow);
        }
        TimerAction::Reset => {
            flow.reset();
            print_line(&flow);
        }
        TimerAction::Status => return print_status(&flow),
        TimerAction::Tick { count } => {
            for _ in 0..count {
                if !flow.engine().is_running() {
                    break;
                }
                flow.tick();
            }
            let events: Vec<Event> = flow
                .drain_events()
                .into_iter()
                .filter(|e| !matches!(e, Event::TimerTick { .. }))
                .collect();
            flow.save_engine()?;
            runtime.block_on(reactions.handle(&events));
            print_line(&flow);
        }
        TimerAction::Run => {
            runtime.block_on(run_foreground(&mut flow, &reactions))?;
            print_line(&flow);
        }
        TimerAction::Mode { mode } => {
            flow.set_mode(mode);
            let events = flow.drain_events();
            flow.save_engine()?;
            runtime.block_on(reactions.handle(&events));
            print_line(&flow);
        }
    }

    flow.save_engine()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completing_tick_shows_zero_in_the_finished_mode() {
        let events = vec![
            Event::TimerTick {
                remaining_secs: 0,
                mode: TimerMode::Focus,
            },
            Event::ModeChanged {
                mode: TimerMode::ShortBreak,
                remaining_secs: 300,
            },
        ];
        assert_eq!(countdown_line(&events).unwrap(), "Focus Time 00:00");
    }

    #[test]
    fn no_tick_no_line() {
        assert!(countdown_line(&[]).is_none());
    }
}
