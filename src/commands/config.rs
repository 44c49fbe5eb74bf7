// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::App;
use anyhow::{Context, Result};

pub fn run(app: &App) -> Result<()> {
    let text = toml::to_string_pretty(&app.config).context("Failed to serialize configuration")?;
    print!("{text}");
    if let Some(path) = crate::config::default_path() {
        tracing::debug!("Default config file: {}", path.display());
    }
    Ok(())
}
