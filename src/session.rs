// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! A crawl session - one seed act, its tables, and their persistence

use crate::crawl::{FrontierWalker, LayerReport, Progress};
use crate::extractor::PageExtractor;
use crate::graph::ActGraph;
use crate::store::{SnapshotStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

/// Replaces whitespace in a seed name to form its key
pub const KEY_SEPARATOR: char = '_';

/// Errors that end a session operation
#[derive(Debug, Error)]
pub enum SessionError {
    /// The seed name has no visible characters
    #[error("seed name is empty")]
    EmptySeed,
    /// Saving the tables failed
    #[error("failed to save {key}: {source}")]
    Save {
        /// Session key being saved
        key: String,
        /// Underlying store error
        source: StoreError,
    },
}

/// Normalized key for a seed name: trimmed, whitespace replaced by `_`
pub fn session_key(seed_name: &str) -> Result<String, SessionError> {
    let key: String = seed_name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { KEY_SEPARATOR } else { c })
        .collect();
    if key.is_empty() {
        return Err(SessionError::EmptySeed);
    }
    Ok(key)
}

/// Page reference of the seed for `key`
#[must_use]
pub fn seed_reference(base_url: &str, key: &str) -> String {
    format!("{base_url}{key}")
}

/// How the session's tables came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Loaded from an earlier snapshot
    Resumed,
    /// Nothing stored yet
    Fresh,
    /// A snapshot existed but could not be used
    Recovered,
}

/// The tables of one seed, owned for the length of a run
pub struct Session {
    key: String,
    graph: ActGraph,
    origin: Origin,
}

impl Session {
    /// Load the tables for `seed_name`, or start fresh from its seed page.
    ///
    /// A snapshot that cannot be read or fails validation is logged and
    /// replaced by fresh tables.
    pub fn open<S: SnapshotStore + ?Sized>(
        store: &S,
        seed_name: &str,
        base_url: &str,
    ) -> Result<Self, SessionError> {
        let key = session_key(seed_name)?;
        let fresh = || ActGraph::new(seed_reference(base_url, &key));

        let (graph, origin) = match store.load(&key) {
            Ok(Some(tables)) => match ActGraph::from_store(tables) {
                Ok(graph) => {
                    info!("Resuming {} ({} entities)", key, graph.entity_count());
                    (graph, Origin::Resumed)
                }
                Err(e) => {
                    warn!("Discarding invalid snapshot for {}: {}", key, e);
                    (fresh(), Origin::Recovered)
                }
            },
            Ok(None) => {
                info!("Starting fresh for {}", key);
                (fresh(), Origin::Fresh)
            }
            Err(e) => {
                warn!("Could not load snapshot for {}: {}", key, e);
                (fresh(), Origin::Recovered)
            }
        };

        Ok(Self { key, graph, origin })
    }

    /// Session key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How the tables were obtained
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The graph
    #[must_use]
    pub fn graph(&self) -> &ActGraph {
        &self.graph
    }

    /// Run `layers` layer extractions, saving after each one.
    ///
    /// `progress` receives the layer number (from 1) with each step.
    pub fn extract_layers<E, S, F>(
        &mut self,
        walker: &FrontierWalker<E>,
        store: &S,
        layers: usize,
        mut progress: F,
    ) -> Result<Vec<LayerReport>, SessionError>
    where
        E: PageExtractor,
        S: SnapshotStore + ?Sized,
        F: FnMut(usize, Progress),
    {
        let mut reports = Vec::with_capacity(layers);
        for layer in 1..=layers {
            let report = walker.run_layer(&mut self.graph, |p| progress(layer, p));
            self.save(store)?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Persist the tables under the session key
    pub fn save<S: SnapshotStore + ?Sized>(&self, store: &S) -> Result<(), SessionError> {
        store
            .save(&self.key, self.graph.store())
            .map_err(|source| SessionError::Save {
                key: self.key.clone(),
                source,
            })
    }

    /// Consume the session, returning its graph
    #[must_use]
    pub fn into_graph(self) -> ActGraph {
        self.graph
    }
}
