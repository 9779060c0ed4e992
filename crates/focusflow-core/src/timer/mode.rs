use serde::{Deserialize, Serialize};
use std::fmt;

/// Timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn is_break(self) -> bool {
        !matches!(self, TimerMode::Focus)
    }

    /// Human label shown next to the clock.
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus Time",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(TimerMode::Focus),
            "short_break" | "short-break" | "break" => Ok(TimerMode::ShortBreak),
            "long_break" | "long-break" | "longbreak" => Ok(TimerMode::LongBreak),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

/// Full length of each mode, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub focus_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    /// A long break follows every N-th completed focus session.
    pub long_break_interval: u32,
}

impl Durations {
    /// Build from minute values, as stored in the config file.
    ///
    /// Zero values fall back to the defaults.
    pub fn from_minutes(focus: u32, short_break: u32, long_break: u32, interval: u32) -> Self {
        let d = Self::default();
        let secs = |min: u32, fallback: u32| {
            if min == 0 {
                fallback
            } else {
                min.saturating_mul(60)
            }
        };
        Self {
            focus_secs: secs(focus, d.focus_secs),
            short_break_secs: secs(short_break, d.short_break_secs),
            long_break_secs: secs(long_break, d.long_break_secs),
            long_break_interval: if interval == 0 {
                d.long_break_interval
            } else {
                interval
            },
        }
    }

    pub fn secs_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_secs,
            TimerMode::ShortBreak => self.short_break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }

    /// Break that follows the `completed`-th focus session.
    pub fn break_after(&self, completed: u64) -> TimerMode {
        if completed > 0 && completed % u64::from(self.long_break_interval.max(1)) == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            long_break_interval: 4,
        }
    }
}

/// Render seconds as `MM:SS`.
pub fn format_clock(remaining_secs: u32) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}
