//! Seed communities.
//!
//! Seed labels are arbitrary non-negative integers. Internally every label
//! is mapped to a dense community id in order of first appearance (node id
//! order), and the inverse map translates final communities back.
//!
//! Unseeded nodes get a synthetic label `original_id + max_seed + 1`, which
//! can never collide with a real seed label.

use crate::error::{Error, Result};
use crate::graph::RelationshipGraph;
use std::collections::HashMap;

/// Per-node seed labels. Absent or negative labels mean "unseeded".
pub trait SeedProperty: Sync {
    /// Seed label of `node`.
    fn value_for_node(&self, node: usize) -> Option<i64>;

    /// Largest label, if known up front.
    fn max_value(&self) -> Option<i64>;

    /// Number of nodes covered, if fixed.
    fn len(&self) -> Option<usize> {
        None
    }
}

impl SeedProperty for [Option<i64>] {
    fn value_for_node(&self, node: usize) -> Option<i64> {
        self.get(node).copied().flatten()
    }

    fn max_value(&self) -> Option<i64> {
        self.iter().flatten().copied().max()
    }

    fn len(&self) -> Option<usize> {
        Some(<[Option<i64>]>::len(self))
    }
}

impl SeedProperty for Vec<Option<i64>> {
    fn value_for_node(&self, node: usize) -> Option<i64> {
        self.as_slice().value_for_node(node)
    }

    fn max_value(&self) -> Option<i64> {
        self.as_slice().max_value()
    }

    fn len(&self) -> Option<usize> {
        Some(Vec::len(self))
    }
}

impl SeedProperty for HashMap<usize, i64> {
    fn value_for_node(&self, node: usize) -> Option<i64> {
        self.get(&node).copied()
    }

    fn max_value(&self) -> Option<i64> {
        self.values().copied().max()
    }
}

/// Label-to-dense-id mapping established before optimization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeedMapping {
    /// Dense starting community of every node.
    initial: Vec<usize>,
    /// Label of every dense community id.
    reverse: Vec<u64>,
}

impl SeedMapping {
    /// Map `seeds` onto dense ids for every node of `graph`.
    pub(crate) fn build<G, S>(graph: &G, seeds: &S) -> Result<Self>
    where
        G: RelationshipGraph,
        S: SeedProperty + ?Sized,
    {
        let n = graph.node_count();
        if let Some(len) = seeds.len() {
            if len != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: len,
                });
            }
        }

        let labels: Vec<Option<u64>> = (0..n)
            .map(|node| {
                seeds
                    .value_for_node(node)
                    .and_then(|v| u64::try_from(v).ok())
            })
            .collect();

        // A stale declared maximum must not let synthetic labels collide.
        let observed = labels.iter().flatten().copied().max().unwrap_or(0);
        let declared = seeds
            .max_value()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0);
        let offset = observed.max(declared).checked_add(1).ok_or_else(|| {
            Error::invalid("seed_property", "maximum seed label leaves no room for unseeded nodes")
        })?;

        let mut dense: HashMap<u64, usize> = HashMap::new();
        let mut reverse = Vec::new();
        let mut initial = Vec::with_capacity(n);
        for (node, label) in labels.into_iter().enumerate() {
            let label = match label {
                Some(label) => label,
                None => graph
                    .to_original_node_id(node)
                    .checked_add(offset)
                    .ok_or_else(|| {
                        Error::invalid(
                            "seed_property",
                            format!("synthetic label for node {node} overflows"),
                        )
                    })?,
            };
            let id = *dense.entry(label).or_insert_with(|| {
                reverse.push(label);
                reverse.len() - 1
            });
            initial.push(id);
        }

        Ok(Self { initial, reverse })
    }

    /// Dense starting community of every node.
    pub(crate) fn initial_communities(&self) -> &[usize] {
        &self.initial
    }

    /// Label of dense community `id`.
    pub(crate) fn label(&self, id: usize) -> u64 {
        self.reverse[id]
    }

    /// Number of distinct labels.
    pub(crate) fn label_count(&self) -> usize {
        self.reverse.len()
    }
}
