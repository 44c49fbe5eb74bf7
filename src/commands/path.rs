// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path command - shortest chain of associations from the seed

use super::App;
use crate::graph::ActGraph;
use crate::types::EntityIndex;
use anyhow::Result;

/// Run the path command
pub fn run(app: &App, name: &[String], to: &str) -> Result<()> {
    let session = app.open_session(name)?;
    let graph = session.graph();
    let target = resolve_entity(graph, to)?;

    match graph.shortest_path(0, target) {
        Some(path) => {
            let names: Vec<_> = path
                .iter()
                .filter_map(|&i| graph.entity(i))
                .map(|e| format!("{} [{}]", e.display_name(), e.index))
                .collect();
            println!("{}", names.join(" -> "));
            println!("{} hop(s)", path.len().saturating_sub(1));
        }
        None => {
            anyhow::bail!(
                "No chain of associations from {} to {}",
                graph.seed().display_name(),
                to
            );
        }
    }

    Ok(())
}

/// Resolve an index, reference or name to a single entity
fn resolve_entity(graph: &ActGraph, query: &str) -> Result<EntityIndex> {
    let matches = graph.find(query);

    match matches.len() {
        0 => anyhow::bail!("No act found matching: {}", query),
        1 => Ok(matches[0].index),
        _ => {
            eprintln!("Multiple acts match '{}':", query);
            for e in &matches {
                eprintln!("  {} ({})", e.display_name(), e.index);
            }
            anyhow::bail!("Ambiguous act name. Use the index.");
        }
    }
}
