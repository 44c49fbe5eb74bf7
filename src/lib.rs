// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Actgraph library - breadth-first explorer for associated-acts graphs
//!
//! This crate provides the core functionality for discovering how music
//! groups are connected: a seed act is resolved against an encyclopedia
//! page, its associated acts are queued, and each call to the layer runner
//! resolves one more breadth-first ring of the graph.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod crawl;
pub mod extractor;
pub mod graph;
pub mod output;
pub mod session;
pub mod store;
pub mod tui;

/// Core data types for the entity and link tables
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    /// Monotonic identifier assigned to an entity when it is first discovered
    pub type EntityIndex = u64;

    // =========================================================================
    // Entity (Node)
    // =========================================================================

    /// A discovered music act
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Entity {
        /// Unique index, 0 for the seed
        pub index: EntityIndex,
        /// Hop count from the seed
        pub distance: u32,
        /// Canonical page URL; the deduplication key
        pub reference: String,
        /// Resolved display name, empty while unresolved
        #[serde(default)]
        pub name: String,
    }

    impl Entity {
        /// The seed entity of a fresh store
        #[must_use]
        pub fn seed(reference: impl Into<String>) -> Self {
            Self {
                index: 0,
                distance: 0,
                reference: reference.into(),
                name: String::new(),
            }
        }

        /// A newly discovered entity waiting to be resolved
        #[must_use]
        pub fn unresolved(index: EntityIndex, distance: u32, reference: impl Into<String>) -> Self {
            Self {
                index,
                distance,
                reference: reference.into(),
                name: String::new(),
            }
        }

        /// Whether this entity has been visited
        #[must_use]
        pub fn is_resolved(&self) -> bool {
            !self.name.is_empty()
        }

        /// Name for display, falling back to the reference while unresolved
        #[must_use]
        pub fn display_name(&self) -> &str {
            if self.name.is_empty() {
                &self.reference
            } else {
                &self.name
            }
        }
    }

    // =========================================================================
    // Link (Edge)
    // =========================================================================

    /// "source lists target as an associated act"
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Link {
        /// Entity whose page listed the association
        pub source_index: EntityIndex,
        /// Entity that was listed
        pub target_index: EntityIndex,
    }

    impl Link {
        /// Create a link between two entity indices
        #[must_use]
        pub fn new(source_index: EntityIndex, target_index: EntityIndex) -> Self {
            Self {
                source_index,
                target_index,
            }
        }
    }

    // =========================================================================
    // Extraction results
    // =========================================================================

    /// One (name, reference) pair from an associations row
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Association {
        /// Name as listed on the parent's page
        pub name: String,
        /// Page URL of the associated act
        pub reference: String,
    }

    impl Association {
        /// Create an association pair
        #[must_use]
        pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                reference: reference.into(),
            }
        }
    }

    /// What a page extractor found on one page
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Extraction {
        /// Page title, empty when unavailable
        pub resolved_name: String,
        /// Associated acts in page order
        pub associations: Vec<Association>,
    }

    impl Extraction {
        /// The empty-result form: no name, no associations
        #[must_use]
        pub fn empty() -> Self {
            Self::default()
        }

        /// Whether nothing at all was extracted
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.resolved_name.is_empty() && self.associations.is_empty()
        }
    }

    // =========================================================================
    // Graph Store
    // =========================================================================

    /// The entity and link tables
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GraphStore {
        /// All entities in insertion order
        #[serde(default)]
        pub entities: Vec<Entity>,
        /// All links in insertion order
        #[serde(default)]
        pub links: Vec<Link>,
    }

    /// Persisted form of one seed's tables
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Snapshot {
        /// Session key the tables belong to
        pub key: String,
        /// When the snapshot was written
        pub saved_at: DateTime<Utc>,
        /// The tables
        #[serde(flatten)]
        pub store: GraphStore,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
