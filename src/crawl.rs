// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Frontier walking and breadth-first layer extraction

use crate::extractor::PageExtractor;
use crate::graph::ActGraph;
use crate::types::Extraction;
use tracing::{error, info, warn};

/// Progress through one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Steps finished so far
    pub completed: usize,
    /// Steps in this layer
    pub total: usize,
}

impl Progress {
    /// Share of the layer done, in `0.0..=1.0`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// What one layer run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerReport {
    /// Frontier entities resolved
    pub steps: usize,
    /// Entities appended to the table
    pub discovered: usize,
    /// Links appended to the table
    pub links_added: usize,
}

/// Resolves frontier entities one at a time
pub struct FrontierWalker<E> {
    extractor: E,
}

impl<E: PageExtractor> FrontierWalker<E> {
    /// Create a walker around an extractor
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    /// Resolve the next unresolved entity.
    ///
    /// Returns `false` when nothing is left to resolve. A failed extraction
    /// counts as the empty result, so the entity still ends up resolved under
    /// its own reference.
    pub fn step(&self, graph: &mut ActGraph) -> bool {
        let Some((reference, index)) = graph
            .next_unresolved()
            .map(|(reference, index)| (reference.to_string(), index))
        else {
            return false;
        };

        let extraction = match self.extractor.extract(&reference) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("Extraction failed for {}: {}", reference, e);
                Extraction::empty()
            }
        };

        match graph.merge(index, &extraction.resolved_name, &extraction.associations) {
            Ok(report) => {
                if report.used_fallback_name {
                    info!("Resolved {} by reference", reference);
                }
                true
            }
            Err(e) => {
                error!("Merge failed for {}: {}", reference, e);
                false
            }
        }
    }

    /// Resolve exactly the frontier that exists now.
    ///
    /// Entities discovered during the run stay unresolved for the next
    /// layer. `progress` is called after every step; an empty frontier runs
    /// no steps and never calls it.
    pub fn run_layer<F>(&self, graph: &mut ActGraph, mut progress: F) -> LayerReport
    where
        F: FnMut(Progress),
    {
        let total = graph.unresolved_count();
        let entities_before = graph.entity_count();
        let links_before = graph.link_count();

        let mut report = LayerReport::default();
        for completed in 1..=total {
            if !self.step(graph) {
                break;
            }
            report.steps += 1;
            progress(Progress { completed, total });
        }

        report.discovered = graph.entity_count() - entities_before;
        report.links_added = graph.link_count() - links_before;
        info!(
            "Layer done: {} resolved, {} discovered, {} links",
            report.steps, report.discovered, report.links_added
        );
        report
    }
}
