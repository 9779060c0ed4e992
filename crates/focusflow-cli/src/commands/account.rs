use clap::Subcommand;
use focusflow_core::Config;

use super::{open_flow, CmdResult};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create a local account and sign in
    SignUp {
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Sign in; tasks added while signed out move into the account
    SignIn {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the account's tasks
    SignOut,
    /// Show the active account
    Show,
    /// Update display name or daily pomodoro goal
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<u32>,
    },
}

pub fn run(action: AccountAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut flow = open_flow(&config)?;

    match action {
        AccountAction::SignUp {
            email,
            password,
            confirm,
        } => {
            flow.sign_up(&email, &password, &confirm)?;
            println!("Signed up as {}", email.trim());
        }
        AccountAction::SignIn { email, password } => {
            flow.sign_in(&email, &password)?;
            println!("Signed in as {}", email.trim());
        }
        AccountAction::SignOut => {
            if flow.sign_out() {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
        }
        AccountAction::Show => match flow.account() {
            Some(account) => {
                println!("Name:   {}", account.name);
                println!("Email:  {}", account.email);
                println!("Joined: {}", account.joined_at.format("%Y-%m-%d"));
                println!("Goal:   {} pomodoros", account.pomodoro_goal);
                println!("Tasks:  {}", flow.store().len());
            }
            None => println!("Not signed in"),
        },
        AccountAction::Profile { name, goal } => {
            flow.update_profile(name.as_deref(), goal)?;
            println!("Profile updated");
        }
    }

    flow.save_engine()?;
    Ok(())
}
