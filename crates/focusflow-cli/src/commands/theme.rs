use clap::Subcommand;
use focusflow_core::Config;

use super::{open_flow, CmdResult};

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Show,
    Dark,
    Light,
    /// Switch between dark and light
    Toggle,
}

fn name(dark: bool) -> &'static str {
    if dark {
        "dark"
    } else {
        "light"
    }
}

pub fn run(action: ThemeAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut flow = open_flow(&config)?;

    let dark = match action {
        ThemeAction::Show => flow.dark_mode(),
        ThemeAction::Dark => {
            flow.set_dark_mode(true);
            true
        }
        ThemeAction::Light => {
            flow.set_dark_mode(false);
            false
        }
        ThemeAction::Toggle => flow.toggle_dark_mode(),
    };
    println!("{}", name(dark));
    Ok(())
}
