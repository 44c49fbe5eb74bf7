// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Terminal rendering for tables, headings and progress

use crate::crawl::Progress;
use crate::graph::ActGraph;
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::io::Write;

const BAR_WIDTH: usize = 30;

/// Heading text for the given level: `#`-style prefix, centred rule below level 1
#[must_use]
pub fn heading(level: u8, text: &str) -> String {
    let level = level.clamp(1, 6);
    let marker = "#".repeat(usize::from(level));
    if level == 1 {
        let rule = "=".repeat(text.chars().count() + marker.len() + 1);
        format!("{marker} {text}\n{rule}")
    } else {
        format!("{marker} {text}")
    }
}

/// Renders graph tables with optional colour
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    color: bool,
}

impl Printer {
    /// Create a printer; `color` enables ANSI styling
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn bold(self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Heading line(s) for `text`
    #[must_use]
    pub fn heading(self, level: u8, text: &str) -> String {
        self.bold(&heading(level, text))
    }

    /// The entity table, one row per entity
    #[must_use]
    pub fn entity_table(self, graph: &ActGraph) -> String {
        let width = graph
            .entities()
            .iter()
            .map(|e| e.display_name().chars().count())
            .max()
            .unwrap_or(0)
            .max(4);

        let mut out = String::new();
        let header = format!("{:>5}  {:>8}  {:<width$}  {}", "Index", "Distance", "Name", "URL");
        let _ = writeln!(out, "{}", self.bold(&header));
        for entity in graph.entities() {
            let name = if entity.is_resolved() {
                format!("{:<width$}", entity.name)
            } else {
                self.dim(&format!("{:<width$}", "(pending)"))
            };
            let _ = writeln!(
                out,
                "{:>5}  {:>8}  {}  {}",
                entity.index, entity.distance, name, entity.reference
            );
        }
        out
    }

    /// The link table with names on both ends
    #[must_use]
    pub fn link_table(self, graph: &ActGraph) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.bold(&format!("{:>6}  {:>10}", "Band", "Associated")));
        for link in graph.links() {
            let source = graph
                .entity(link.source_index)
                .map_or("?", |e| e.display_name());
            let target = graph
                .entity(link.target_index)
                .map_or("?", |e| e.display_name());
            let _ = writeln!(
                out,
                "{:>6}  {:>10}  {}",
                link.source_index,
                link.target_index,
                self.dim(&format!("{source} -> {target}"))
            );
        }
        out
    }

    /// One-paragraph summary of the graph
    #[must_use]
    pub fn summary(self, graph: &ActGraph) -> String {
        let layers = graph
            .layer_sizes()
            .iter()
            .map(|(distance, count)| format!("d{distance}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} entities ({} resolved, {} pending), {} links [{}]",
            graph.entity_count(),
            graph.resolved_count(),
            graph.unresolved_count(),
            graph.link_count(),
            layers
        )
    }

    /// Progress bar line for a layer
    #[must_use]
    pub fn progress_line(self, layer: usize, progress: Progress) -> String {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let filled = (progress.fraction() * BAR_WIDTH as f64).round() as usize;
        let bar = format!(
            "{}{}",
            "#".repeat(filled.min(BAR_WIDTH)),
            "-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
        );
        let bar = if self.color {
            bar.green().to_string()
        } else {
            bar
        };
        format!(
            "layer {layer} [{bar}] {}/{}",
            progress.completed, progress.total
        )
    }

    /// Redraw the progress bar in place on stderr
    pub fn draw_progress(self, layer: usize, progress: Progress) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", self.progress_line(layer, progress));
        if progress.completed == progress.total {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Association;

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading(1, "Influences"), "# Influences\n============");
        assert_eq!(heading(3, "Layer 2"), "### Layer 2");
        assert_eq!(heading(9, "x"), "###### x");
    }

    #[test]
    fn test_entity_table_plain() {
        let mut graph = ActGraph::new("S");
        graph
            .merge(0, "BandA", &[Association::new("X", "R1")])
            .unwrap();

        let table = Printer::new(false).entity_table(&graph);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Distance"));
        assert!(lines[1].contains("BandA"));
        assert!(lines[2].contains("(pending)"));
        assert!(lines[2].ends_with("R1"));
    }

    #[test]
    fn test_link_table_names_both_ends() {
        let mut graph = ActGraph::new("S");
        graph
            .merge(0, "BandA", &[Association::new("X", "R1")])
            .unwrap();

        let table = Printer::new(false).link_table(&graph);
        assert!(table.contains("BandA -> R1"));
    }

    #[test]
    fn test_progress_line() {
        let printer = Printer::new(false);
        let line = printer.progress_line(2, Progress { completed: 1, total: 2 });

        assert!(line.starts_with("layer 2 ["));
        assert!(line.ends_with("] 1/2"));
        assert_eq!(line.matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn test_summary() {
        let graph = ActGraph::new("S");
        assert_eq!(
            Printer::new(false).summary(&graph),
            "1 entities (0 resolved, 1 pending), 0 links [d0: 1]"
        );
    }
}
