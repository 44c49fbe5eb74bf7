// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod extract;
pub mod path;
pub mod show;
pub mod view;

use crate::config::Config;
use crate::output::Printer;
use crate::session::Session;
use crate::store::FsSnapshotStore;
use anyhow::{Context, Result};

/// Settings shared by every command
pub struct App {
    /// Effective configuration
    pub config: Config,
    /// Table and progress renderer
    pub printer: Printer,
    /// Suppress progress output
    pub quiet: bool,
}

impl App {
    /// Snapshot store under the configured data directory
    #[must_use]
    pub fn snapshot_store(&self) -> FsSnapshotStore {
        FsSnapshotStore::new(&self.config.data_dir)
    }

    /// Open the session for a seed name given as separate words
    pub fn open_session(&self, name: &[String]) -> Result<Session> {
        let seed_name = name.join(" ");
        Session::open(&self.snapshot_store(), &seed_name, &self.config.base_url)
            .with_context(|| format!("Cannot open session for '{seed_name}'"))
    }
}
