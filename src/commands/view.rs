// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::App;
use anyhow::Result;

pub fn run(app: &App, name: &[String]) -> Result<()> {
    let session = app.open_session(name)?;
    tracing::info!("Launching TUI for {}", session.key());
    crate::tui::run(session.graph(), session.key())
}
