//! Statistics module for FocusFlow
//!
//! Dashboard figures derived from the task list and the lifetime focus
//! counter.

mod dashboard;

pub use dashboard::DashboardStats;
