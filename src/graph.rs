// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph data structures and the merge protocol for the associated-acts graph

use crate::types::{Association, Entity, EntityIndex, GraphStore, Link};
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors raised at the insertion boundary of the graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// No entity carries this index
    #[error("unknown entity index {0}")]
    UnknownEntity(EntityIndex),
    /// Entities are resolved at most once
    #[error("entity {0} is already resolved")]
    AlreadyResolved(EntityIndex),
    /// Loaded tables have no seed entity
    #[error("no seed entity (index 0, distance 0)")]
    MissingSeed,
    /// Loaded tables have more than one distance-0 entity
    #[error("more than one entity at distance 0")]
    MultipleSeeds,
    /// Loaded tables repeat an index
    #[error("duplicate entity index {0}")]
    DuplicateIndex(EntityIndex),
    /// Loaded tables repeat a reference
    #[error("duplicate reference {0}")]
    DuplicateReference(String),
    /// Loaded tables are not in index order
    #[error("entity index {index} does not follow {previous}")]
    IndexOrder {
        /// Index found
        index: EntityIndex,
        /// Index of the entity before it
        previous: EntityIndex,
    },
    /// A link endpoint does not exist
    #[error("link {source_index} -> {target_index} points at a missing entity")]
    DanglingLink {
        /// Source endpoint
        source_index: EntityIndex,
        /// Target endpoint
        target_index: EntityIndex,
    },
}

/// What a single merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Indices of entities appended by this merge
    pub inserted: Vec<EntityIndex>,
    /// Number of links appended
    pub links_added: usize,
    /// The parent was named after its own reference
    pub used_fallback_name: bool,
}

/// The associated-acts graph with petgraph backing for path queries
pub struct ActGraph {
    /// The underlying directed graph, node weight is the entity index
    graph: DiGraph<EntityIndex, ()>,
    /// Map from entity index to node index
    node_indices: HashMap<EntityIndex, NodeIndex>,
    /// Map from entity index to position in the entity table
    positions: HashMap<EntityIndex, usize>,
    /// Map from reference to entity index
    references: HashMap<String, EntityIndex>,
    /// Every entity before this position is resolved
    frontier_start: usize,
    /// The entity and link tables
    store: GraphStore,
}

impl ActGraph {
    /// Create a graph holding only the unresolved seed
    #[must_use]
    pub fn new(seed_reference: impl Into<String>) -> Self {
        let store = GraphStore {
            entities: vec![Entity::seed(seed_reference)],
            links: Vec::new(),
        };
        let mut graph = Self::empty(store);
        graph.rebuild();
        graph
    }

    /// Build a graph from loaded tables, checking every table invariant
    pub fn from_store(store: GraphStore) -> Result<Self, GraphError> {
        validate(&store)?;
        let mut graph = Self::empty(store);
        graph.rebuild();
        Ok(graph)
    }

    fn empty(store: GraphStore) -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            positions: HashMap::new(),
            references: HashMap::new(),
            frontier_start: 0,
            store,
        }
    }

    /// Rebuild lookup maps and the petgraph from the tables
    fn rebuild(&mut self) {
        self.graph.clear();
        self.node_indices.clear();
        self.positions.clear();
        self.references.clear();

        for (position, entity) in self.store.entities.iter().enumerate() {
            let node = self.graph.add_node(entity.index);
            self.node_indices.insert(entity.index, node);
            self.positions.insert(entity.index, position);
            self.references.insert(entity.reference.clone(), entity.index);
        }

        for link in &self.store.links {
            if let (Some(&from), Some(&to)) = (
                self.node_indices.get(&link.source_index),
                self.node_indices.get(&link.target_index),
            ) {
                self.graph.add_edge(from, to, ());
            }
        }

        self.frontier_start = 0;
        self.advance_frontier();
    }

    fn advance_frontier(&mut self) {
        while self
            .store
            .entities
            .get(self.frontier_start)
            .is_some_and(Entity::is_resolved)
        {
            self.frontier_start += 1;
        }
    }

    /// First unresolved entity in insertion order
    #[must_use]
    pub fn next_unresolved(&self) -> Option<(&str, EntityIndex)> {
        self.store.entities[self.frontier_start..]
            .iter()
            .find(|e| !e.is_resolved())
            .map(|e| (e.reference.as_str(), e.index))
    }

    /// Number of entities still waiting to be resolved
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.store.entities[self.frontier_start..]
            .iter()
            .filter(|e| !e.is_resolved())
            .count()
    }

    /// Fold one extraction result into the graph.
    ///
    /// The parent takes `resolved_name`, or its own reference when the name
    /// is blank. Associations whose reference is already known are linked
    /// but not inserted again; new ones are appended one hop further out.
    pub fn merge(
        &mut self,
        parent_index: EntityIndex,
        resolved_name: &str,
        associations: &[Association],
    ) -> Result<MergeReport, GraphError> {
        let position = *self
            .positions
            .get(&parent_index)
            .ok_or(GraphError::UnknownEntity(parent_index))?;
        let parent = &mut self.store.entities[position];
        if parent.is_resolved() {
            return Err(GraphError::AlreadyResolved(parent_index));
        }

        let mut report = MergeReport::default();
        let name = resolved_name.trim();
        if name.is_empty() {
            parent.name = parent.reference.clone();
            report.used_fallback_name = true;
        } else {
            parent.name = name.to_string();
        }
        let child_distance = parent.distance + 1;

        let mut next_index = self.next_index();
        let mut linked = HashSet::new();
        for association in associations {
            let reference = association.reference.as_str();
            if reference.is_empty() {
                continue;
            }

            let target = match self.references.get(reference) {
                Some(&existing) => existing,
                None => {
                    let index = next_index;
                    next_index += 1;
                    self.insert(Entity::unresolved(index, child_distance, reference));
                    report.inserted.push(index);
                    index
                }
            };

            if linked.insert(target) {
                self.push_link(Link::new(parent_index, target));
                report.links_added += 1;
            }
        }

        self.advance_frontier();
        debug!(
            parent = parent_index,
            inserted = report.inserted.len(),
            links = report.links_added,
            "merged extraction"
        );
        Ok(report)
    }

    // Entities are kept in ascending index order
    fn next_index(&self) -> EntityIndex {
        self.store.entities.last().map_or(0, |last| last.index + 1)
    }

    fn insert(&mut self, entity: Entity) {
        let node = self.graph.add_node(entity.index);
        self.node_indices.insert(entity.index, node);
        self.positions.insert(entity.index, self.store.entities.len());
        self.references.insert(entity.reference.clone(), entity.index);
        self.store.entities.push(entity);
    }

    fn push_link(&mut self, link: Link) {
        if let (Some(&from), Some(&to)) = (
            self.node_indices.get(&link.source_index),
            self.node_indices.get(&link.target_index),
        ) {
            self.graph.add_edge(from, to, ());
        }
        self.store.links.push(link);
    }

    /// The seed entity
    #[must_use]
    pub fn seed(&self) -> &Entity {
        &self.store.entities[0]
    }

    /// Get an entity by index
    #[must_use]
    pub fn entity(&self, index: EntityIndex) -> Option<&Entity> {
        self.positions
            .get(&index)
            .map(|&position| &self.store.entities[position])
    }

    /// Get an entity by its exact reference
    #[must_use]
    pub fn entity_by_reference(&self, reference: &str) -> Option<&Entity> {
        self.references
            .get(reference)
            .and_then(|&index| self.entity(index))
    }

    /// All entities in insertion order
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.store.entities
    }

    /// All links in insertion order
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.store.links
    }

    /// The underlying tables
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Consume the graph, returning its tables
    #[must_use]
    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Links whose source is `index`
    #[must_use]
    pub fn links_from(&self, index: EntityIndex) -> Vec<&Link> {
        self.store
            .links
            .iter()
            .filter(|l| l.source_index == index)
            .collect()
    }

    /// Links whose target is `index`
    #[must_use]
    pub fn links_to(&self, index: EntityIndex) -> Vec<&Link> {
        self.store
            .links
            .iter()
            .filter(|l| l.target_index == index)
            .collect()
    }

    /// Get entity count
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.store.entities.len()
    }

    /// Get link count
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.store.links.len()
    }

    /// Number of resolved entities
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.entity_count() - self.unresolved_count()
    }

    /// Entities per distance from the seed
    #[must_use]
    pub fn layer_sizes(&self) -> BTreeMap<u32, usize> {
        let mut sizes = BTreeMap::new();
        for entity in &self.store.entities {
            *sizes.entry(entity.distance).or_insert(0) += 1;
        }
        sizes
    }

    /// Find an entity by index, exact reference, or name substring
    #[must_use]
    pub fn find(&self, query: &str) -> Vec<&Entity> {
        let query = query.trim();
        if let Ok(index) = query.parse::<EntityIndex>() {
            return self.entity(index).into_iter().collect();
        }
        if let Some(entity) = self.entity_by_reference(query) {
            return vec![entity];
        }

        let needle = query.to_lowercase();
        let exact: Vec<_> = self
            .store
            .entities
            .iter()
            .filter(|e| e.name.to_lowercase() == needle)
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        self.store
            .entities
            .iter()
            .filter(|e| e.display_name().to_lowercase().contains(&needle))
            .collect()
    }

    /// Shortest chain of links from one entity to another
    #[must_use]
    pub fn shortest_path(&self, from: EntityIndex, to: EntityIndex) -> Option<Vec<EntityIndex>> {
        let start = *self.node_indices.get(&from)?;
        let goal = *self.node_indices.get(&to)?;
        let (_, nodes) = astar(&self.graph, start, |n| n == goal, |_| 1u32, |_| 0)?;
        Some(nodes.into_iter().map(|n| self.graph[n]).collect())
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph influences {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for entity in &self.store.entities {
            let style = if entity.is_resolved() { "" } else { ", style=dashed" };
            dot.push_str(&format!(
                "  n{} [label=\"{}\\nd={}\"{}];\n",
                entity.index,
                escape_label(entity.display_name()),
                entity.distance,
                style
            ));
        }

        dot.push('\n');

        for link in &self.store.links {
            dot.push_str(&format!(
                "  n{} -> n{};\n",
                link.source_index, link.target_index
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.store)
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Check the table invariants of loaded data
fn validate(store: &GraphStore) -> Result<(), GraphError> {
    let seed = store.entities.first().ok_or(GraphError::MissingSeed)?;
    if seed.index != 0 || seed.distance != 0 {
        return Err(GraphError::MissingSeed);
    }

    let mut indices = HashSet::new();
    let mut references = HashSet::new();
    let mut previous: Option<EntityIndex> = None;
    for entity in &store.entities {
        if !indices.insert(entity.index) {
            return Err(GraphError::DuplicateIndex(entity.index));
        }
        if let Some(previous) = previous {
            if entity.index <= previous {
                return Err(GraphError::IndexOrder {
                    index: entity.index,
                    previous,
                });
            }
            if entity.distance == 0 {
                return Err(GraphError::MultipleSeeds);
            }
        }
        if !references.insert(entity.reference.as_str()) {
            return Err(GraphError::DuplicateReference(entity.reference.clone()));
        }
        previous = Some(entity.index);
    }

    for link in &store.links {
        if !indices.contains(&link.source_index) || !indices.contains(&link.target_index) {
            return Err(GraphError::DanglingLink {
                source_index: link.source_index,
                target_index: link.target_index,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assoc(name: &str, reference: &str) -> Association {
        Association::new(name, reference)
    }

    /// Seed S resolved as BandA with two associations
    fn band_a() -> ActGraph {
        let mut graph = ActGraph::new("S");
        graph
            .merge(0, "BandA", &[assoc("X", "R1"), assoc("Y", "R2")])
            .unwrap();
        graph
    }

    #[test]
    fn test_new_graph_has_unresolved_seed() {
        let graph = ActGraph::new("https://en.wikipedia.org/wiki/Blur_(band)");

        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.seed().distance, 0);
        assert_eq!(graph.seed().name, "");
        assert_eq!(
            graph.next_unresolved(),
            Some(("https://en.wikipedia.org/wiki/Blur_(band)", 0))
        );
        assert_eq!(graph.unresolved_count(), 1);
    }

    #[test]
    fn test_merge_appends_children_one_hop_out() {
        let graph = band_a();

        let rows: Vec<_> = graph
            .entities()
            .iter()
            .map(|e| (e.index, e.name.as_str(), e.distance, e.reference.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![(0, "BandA", 0, "S"), (1, "", 1, "R1"), (2, "", 1, "R2")]
        );
        assert_eq!(graph.links(), &[Link::new(0, 1), Link::new(0, 2)]);
        assert_eq!(graph.unresolved_count(), 2);
        assert_eq!(graph.next_unresolved(), Some(("R1", 1)));
    }

    #[test]
    fn test_merge_links_known_reference_without_inserting() {
        let mut graph = band_a();

        let report = graph
            .merge(1, "X", &[assoc("BandA", "S"), assoc("Z", "R3")])
            .unwrap();

        assert_eq!(report.inserted, vec![3]);
        assert_eq!(report.links_added, 2);
        assert_eq!(graph.entity_count(), 4);
        assert!(graph.links().contains(&Link::new(1, 0)));
        assert_eq!(graph.entity(3).unwrap().distance, 2);
    }

    #[test]
    fn test_merge_blank_name_falls_back_to_reference() {
        let mut graph = band_a();

        let report = graph.merge(2, "  ", &[]).unwrap();

        assert!(report.used_fallback_name);
        assert_eq!(graph.entity(2).unwrap().name, "R2");
        assert_eq!(graph.unresolved_count(), 1);
        assert_eq!(graph.entity_count(), 3);
        assert_eq!(graph.link_count(), 2);
    }

    #[test]
    fn test_merge_deduplicates_within_batch() {
        let mut graph = ActGraph::new("S");

        graph
            .merge(
                0,
                "BandA",
                &[assoc("X", "R1"), assoc("X (band)", "R1"), assoc("", "")],
            )
            .unwrap();

        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.links(), &[Link::new(0, 1)]);
    }

    #[test]
    fn test_merge_rejects_resolved_or_unknown_parent() {
        let mut graph = band_a();

        assert_eq!(
            graph.merge(0, "Again", &[]),
            Err(GraphError::AlreadyResolved(0))
        );
        assert_eq!(graph.merge(42, "Nobody", &[]), Err(GraphError::UnknownEntity(42)));
        assert_eq!(graph.seed().name, "BandA");
    }

    #[test]
    fn test_next_unresolved_skips_resolved_entities() {
        let mut graph = band_a();
        graph.merge(2, "Y", &[]).unwrap();

        assert_eq!(graph.next_unresolved(), Some(("R1", 1)));
        graph.merge(1, "X", &[]).unwrap();
        assert_eq!(graph.next_unresolved(), None);
        assert_eq!(graph.unresolved_count(), 0);
    }

    #[test]
    fn test_from_store_round_trip() {
        let graph = band_a();
        let rebuilt = ActGraph::from_store(graph.store().clone()).unwrap();

        assert_eq!(rebuilt.entities(), graph.entities());
        assert_eq!(rebuilt.next_unresolved(), Some(("R1", 1)));
        assert_eq!(rebuilt.shortest_path(0, 2), Some(vec![0, 2]));
    }

    #[test]
    fn test_merge_continues_after_highest_loaded_index() {
        let mut seed = Entity::seed("S");
        seed.name = "BandA".into();
        let store = GraphStore {
            entities: vec![seed, Entity::unresolved(7, 1, "R7")],
            links: vec![Link::new(0, 7)],
        };
        let mut graph = ActGraph::from_store(store).unwrap();

        graph.merge(7, "X", &[assoc("Z", "R9")]).unwrap();

        assert_eq!(graph.entity_by_reference("R9").map(|e| e.index), Some(8));
        assert_eq!(graph.entity(8).map(|e| e.distance), Some(2));
    }

    #[test]
    fn test_from_store_rejects_broken_tables() {
        let mut store = band_a().into_store();
        store.entities[2].reference = "R1".into();
        assert_eq!(
            ActGraph::from_store(store).err(),
            Some(GraphError::DuplicateReference("R1".into()))
        );

        let mut store = band_a().into_store();
        store.links.push(Link::new(0, 9));
        assert!(matches!(
            ActGraph::from_store(store),
            Err(GraphError::DanglingLink { .. })
        ));

        let mut store = band_a().into_store();
        store.entities[1].distance = 0;
        assert_eq!(ActGraph::from_store(store).err(), Some(GraphError::MultipleSeeds));

        let mut store = band_a().into_store();
        store.entities.swap(1, 2);
        assert!(matches!(
            ActGraph::from_store(store),
            Err(GraphError::IndexOrder { index: 1, previous: 2 })
        ));

        assert_eq!(
            ActGraph::from_store(GraphStore::default()).err(),
            Some(GraphError::MissingSeed)
        );
    }

    #[test]
    fn test_shortest_path_follows_links() {
        let mut graph = band_a();
        graph.merge(1, "X", &[assoc("Z", "R3")]).unwrap();

        assert_eq!(graph.shortest_path(0, 3), Some(vec![0, 1, 3]));
        assert_eq!(graph.shortest_path(3, 0), None);
    }

    #[test]
    fn test_find_by_index_reference_and_name() {
        let mut graph = band_a();
        graph.merge(1, "The Xs", &[]).unwrap();

        assert_eq!(graph.find("2")[0].reference, "R2");
        assert_eq!(graph.find("R1")[0].index, 1);
        assert_eq!(graph.find("banda")[0].index, 0);
        assert_eq!(graph.find("xs")[0].index, 1);
        assert!(graph.find("nothing").is_empty());
    }

    #[test]
    fn test_layer_sizes() {
        let graph = band_a();
        let sizes = graph.layer_sizes();

        assert_eq!(sizes.get(&0), Some(&1));
        assert_eq!(sizes.get(&1), Some(&2));
    }

    #[test]
    fn test_to_dot() {
        let graph = band_a();
        let dot = graph.to_dot();

        assert!(dot.contains("digraph influences"));
        assert!(dot.contains("BandA"));
        assert!(dot.contains("n0 -> n1"));
        assert!(dot.contains("style=dashed"));
    }
}
