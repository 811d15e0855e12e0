// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pq settings` - Inspect the settings document

use anyhow::Result;
use clap::{Args, Subcommand};
use pq_storage::SettingsStore;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings (after migration) as JSON
    Show,
    /// Print the settings file location
    Path,
}

pub fn handle(command: SettingsCommand, store: &SettingsStore) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
        SettingsCommand::Path => match store.path() {
            Some(path) => println!("{}", path.display()),
            None => println!("(in memory)"),
        },
    }
    Ok(())
}
