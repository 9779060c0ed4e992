//! # FocusFlow Core Library
//!
//! This library provides the core logic for FocusFlow, a Pomodoro timer tied
//! to a personal task list. Front ends (the `focusflow` CLI) issue commands to
//! the core and are notified of state changes through events.
//!
//! ## Architecture
//!
//! - **Task Store**: Owns the task collection and writes it through to the
//!   active account's record
//! - **Session Engine**: A tick-driven focus/break state machine that credits
//!   completed focus sessions to the selected task
//! - **Storage**: SQLite-backed key-value records and TOML configuration
//! - **Integrations**: Best-effort break suggestions and a remote completion
//!   counter
//!
//! ## Key Components
//!
//! - [`FocusFlow`]: The command surface tying store, engine and events together
//! - [`TaskStore`]: Task collection and persistence
//! - [`SessionEngine`]: Timer state machine
//! - [`Database`]: Durable key-value store
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod flow;
pub mod integrations;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use error::{ConfigError, CoreError, IntegrationError, StorageError, ValidationError};
pub use events::{Event, EventBus, EventSink, Notification};
pub use flow::FocusFlow;
pub use stats::DashboardStats;
pub use storage::{Config, Database, KeyValueStore, MemoryStore, UserRecord};
pub use task::{Priority, Task, TaskFilter, TaskId, TaskPatch, TaskStore};
pub use timer::{Durations, SessionEngine, TaskLedger, TimerMode};
