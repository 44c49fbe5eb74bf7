// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Extract command - resolves one or more breadth-first layers

use super::App;
use crate::crawl::FrontierWalker;
use crate::extractor::WikipediaExtractor;
use crate::session::Origin;
use anyhow::{Context, Result};
use tracing::info;

/// Run the extract command
pub fn run(app: &App, name: &[String], layers: usize) -> Result<()> {
    let store = app.snapshot_store();
    let mut session = app.open_session(name)?;
    if session.origin() == Origin::Recovered {
        eprintln!("Warning: stored graph for {} was unusable, starting over", session.key());
    }

    let extractor =
        WikipediaExtractor::new(&app.config).context("Failed to build page extractor")?;
    let walker = FrontierWalker::new(extractor);

    info!("Extracting {} layer(s) for {}", layers, session.key());
    let printer = app.printer;
    let quiet = app.quiet;
    let reports = session
        .extract_layers(&walker, &store, layers, |layer, progress| {
            if !quiet {
                printer.draw_progress(layer, progress);
            }
        })
        .with_context(|| format!("Failed to save graph to {}", store.base().display()))?;

    let graph = session.graph();
    println!("{}", printer.heading(1, &format!("Influences: {}", graph.seed().display_name())));
    println!();
    print!("{}", printer.entity_table(graph));
    println!();
    for (layer, report) in reports.iter().enumerate() {
        if report.steps == 0 {
            println!("Layer {}: nothing left to resolve", layer + 1);
        } else {
            println!(
                "Layer {}: resolved {}, discovered {}, linked {}",
                layer + 1,
                report.steps,
                report.discovered,
                report.links_added
            );
        }
    }
    println!("{}", printer.summary(graph));
    println!("Graph saved to {}", store.path_for(session.key()).display());

    Ok(())
}
