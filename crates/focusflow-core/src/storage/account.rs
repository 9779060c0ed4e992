//! Local account record.
//!
//! There is no authentication: an account is just the record that scopes
//! persisted tasks to a person. Passwords are checked for presence and
//! confirmation, then dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::task::Task;

pub const DEFAULT_POMODORO_GOAL: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "default_goal")]
    pub pomodoro_goal: u32,
}

fn default_goal() -> u32 {
    DEFAULT_POMODORO_GOAL
}

impl UserRecord {
    /// Fresh record for `email`, named after the local part of the address.
    pub fn new(email: &str) -> Self {
        let email = email.trim();
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            email: email.to_string(),
            name,
            joined_at: Utc::now(),
            tasks: Vec::new(),
            pomodoro_goal: DEFAULT_POMODORO_GOAL,
        }
    }

    pub fn sign_in(email: &str, password: &str) -> Result<Self, ValidationError> {
        require("email", email)?;
        require("password", password)?;
        Ok(Self::new(email))
    }

    pub fn sign_up(email: &str, password: &str, confirm: &str) -> Result<Self, ValidationError> {
        require("email", email)?;
        require("password", password)?;
        require("confirm_password", confirm)?;
        if password != confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(Self::new(email))
    }

    /// Apply profile settings. A blank name keeps the current one; a zero goal
    /// falls back to the default.
    pub fn update_profile(&mut self, name: Option<&str>, pomodoro_goal: Option<u32>) {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(goal) = pomodoro_goal {
            self.pomodoro_goal = if goal == 0 { DEFAULT_POMODORO_GOAL } else { goal };
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field.to_string()))
    } else {
        Ok(())
    }
}
