//! Local-move task: one batch of nodes within one color phase.
//!
//! For every node of the phase color, the task sums the relationship weight
//! towards each neighboring community and evaluates
//!
//! ```text
//! gain(c) = k_i,c − k_i × Σ_c / (2W)
//! ```
//!
//! where `k_i,c` is the weight from `i` into `c`, `k_i` the node's
//! cumulative weight, `Σ_c` the community's total weight (without `i` when
//! `c` is `i`'s own community) and `W` the total graph weight. The best
//! community wins; equal gains go to the lower community id, so the result
//! does not depend on neighbor iteration order.
//!
//! Tasks never touch shared community weights. A move is *staged* as
//! `−k_i` on the old and `+k_i` on the new community and only committed
//! after every task of the phase has finished.

use crate::atomic::AtomicDoubleArray;
use crate::graph::{Direction, RelationshipGraph};
use std::collections::HashMap;

/// Read-only view of the run state shared by all tasks of one color phase.
pub(crate) struct ColorPhase<'a, G> {
    pub(crate) graph: &'a G,
    pub(crate) direction: Direction,
    pub(crate) color: usize,
    pub(crate) colors: &'a [usize],
    pub(crate) current: &'a [usize],
    pub(crate) cumulative_node_weights: &'a [f64],
    pub(crate) community_weights: &'a AtomicDoubleArray,
    pub(crate) staged: &'a AtomicDoubleArray,
    pub(crate) total_weight: f64,
}

impl<G: RelationshipGraph> ColorPhase<'_, G> {
    /// Evaluate the batch starting at node `start`.
    ///
    /// `next` and `influences` are this batch's slots, indexed from `start`.
    /// `links` is per-worker scratch space. Returns the number of moved nodes.
    pub(crate) fn run_batch(
        &self,
        start: usize,
        next: &mut [usize],
        influences: &mut [f64],
        links: &mut HashMap<usize, f64>,
    ) -> usize {
        // 1 / 2W, or no penalty at all on a weightless graph
        let penalty = if self.total_weight > 0.0 {
            1.0 / (2.0 * self.total_weight)
        } else {
            0.0
        };

        let mut moved = 0;
        for (offset, (next_slot, influence)) in next.iter_mut().zip(influences.iter_mut()).enumerate() {
            let node = start + offset;
            if self.colors[node] != self.color {
                continue;
            }

            let current = self.current[node];
            let node_weight = self.cumulative_node_weights[node];

            links.clear();
            let mut self_weight = 0.0;
            self.graph
                .for_each_relationship(node, self.direction, 1.0, |_, target, w| {
                    if target == node {
                        self_weight += w;
                    } else {
                        *links.entry(self.current[target]).or_insert(0.0) += w;
                    }
                    true
                });

            let own_links = links.get(&current).copied().unwrap_or(0.0);
            let own_weight = self.community_weights.get(current) - node_weight;
            let mut best = current;
            let mut best_gain = own_links - node_weight * own_weight * penalty;

            for (&candidate, &link) in links.iter() {
                if candidate == current {
                    continue;
                }
                let gain = link - node_weight * self.community_weights.get(candidate) * penalty;
                if gain > best_gain || (gain == best_gain && candidate < best) {
                    best = candidate;
                    best_gain = gain;
                }
            }

            *next_slot = best;
            *influence = links.get(&best).copied().unwrap_or(0.0) + self_weight;

            if best != current {
                self.staged.add(current, -node_weight);
                self.staged.add(best, node_weight);
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::UnGraph;

    struct Fixture {
        graph: UnGraph<(), f64>,
        colors: Vec<usize>,
        current: Vec<usize>,
        weights: Vec<f64>,
        community_weights: AtomicDoubleArray,
        staged: AtomicDoubleArray,
    }

    /// 0 - 1 - 2 with weights 1.0 and 0.5, every node alone, colored 0/1/0.
    fn path() -> Fixture {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        let _ = graph.add_edge(n[0], n[1], 1.0);
        let _ = graph.add_edge(n[1], n[2], 0.5);

        let weights = vec![1.0, 1.5, 0.5];
        let community_weights = AtomicDoubleArray::new(3, 1e9).unwrap();
        for (c, &w) in weights.iter().enumerate() {
            community_weights.set(c, w);
        }
        Fixture {
            graph,
            colors: vec![0, 1, 0],
            current: vec![0, 1, 2],
            weights,
            community_weights,
            staged: AtomicDoubleArray::new(3, 1e9).unwrap(),
        }
    }

    fn phase(f: &Fixture, color: usize) -> ColorPhase<'_, UnGraph<(), f64>> {
        ColorPhase {
            graph: &f.graph,
            direction: Direction::Both,
            color,
            colors: &f.colors,
            current: &f.current,
            cumulative_node_weights: &f.weights,
            community_weights: &f.community_weights,
            staged: &f.staged,
            total_weight: 1.5,
        }
    }

    #[test]
    fn test_moves_only_phase_color_and_stages_deltas() {
        let f = path();
        let mut next = f.current.clone();
        let mut influences = vec![0.0; 3];
        let moved = phase(&f, 0).run_batch(0, &mut next, &mut influences, &mut HashMap::new());

        // Node 0 joins 1 (gain 1 - 1.5/3 > 0); node 2 joins 1 too
        // (0.5 - 0.5*1.5/3 = 0.25 > 0). Node 1 has the other color.
        assert_eq!(moved, 2);
        assert_eq!(next, vec![1, 1, 1]);
        assert_eq!(influences, vec![1.0, 0.0, 0.5]);

        // Deltas are staged, committed weights are untouched.
        assert_eq!(f.community_weights.to_vec(), vec![1.0, 1.5, 0.5]);
        assert_eq!(f.staged.to_vec(), vec![-1.0, 1.5, -0.5]);
    }

    #[test]
    fn test_best_of_several_candidates() {
        let f = path();
        let mut next = f.current.clone();
        let mut influences = vec![0.0; 3];
        // Node 1 (color 1): joining 0 gains 1 - 1.5*1/3 = 0.5,
        // joining 2 gains 0.5 - 1.5*0.5/3 = 0.25, staying alone gains 0.
        let moved = phase(&f, 1).run_batch(0, &mut next, &mut influences, &mut HashMap::new());
        assert_eq!(moved, 1);
        assert_eq!(next, vec![0, 0, 2]);
        assert_eq!(influences[1], 1.0);
    }

    #[test]
    fn test_batch_offset() {
        let f = path();
        let mut next = vec![f.current[2]];
        let mut influences = vec![0.0];
        let moved = phase(&f, 0).run_batch(2, &mut next, &mut influences, &mut HashMap::new());
        assert_eq!(moved, 1);
        assert_eq!(next, vec![1]);
        assert_eq!(f.staged.to_vec(), vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        // Star: center 2 linked to 0, 1, 3 with equal weights, all alone.
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let _ = graph.add_edge(n[2], n[3], 1.0);
        let _ = graph.add_edge(n[2], n[1], 1.0);
        let _ = graph.add_edge(n[2], n[0], 1.0);

        let weights = vec![1.0, 1.0, 3.0, 1.0];
        let community_weights = AtomicDoubleArray::new(4, 1e9).unwrap();
        for (c, &w) in weights.iter().enumerate() {
            community_weights.set(c, w);
        }
        let staged = AtomicDoubleArray::new(4, 1e9).unwrap();
        let colors = vec![1, 1, 0, 1];
        let current = vec![0, 1, 2, 3];
        let phase = ColorPhase {
            graph: &graph,
            direction: Direction::Both,
            color: 0,
            colors: &colors,
            current: &current,
            cumulative_node_weights: &weights,
            community_weights: &community_weights,
            staged: &staged,
            total_weight: 3.0,
        };

        let mut next = current.clone();
        let mut influences = vec![0.0; 4];
        let _ = phase.run_batch(0, &mut next, &mut influences, &mut HashMap::new());
        assert_eq!(next[2], 0);
    }

    #[test]
    fn test_isolated_node_stays() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let _ = graph.add_node(());
        let community_weights = AtomicDoubleArray::new(1, 1e9).unwrap();
        let staged = AtomicDoubleArray::new(1, 1e9).unwrap();
        let phase = ColorPhase {
            graph: &graph,
            direction: Direction::Both,
            color: 0,
            colors: &[0],
            current: &[0],
            cumulative_node_weights: &[0.0],
            community_weights: &community_weights,
            staged: &staged,
            total_weight: 0.0,
        };
        let mut next = vec![0];
        let mut influences = vec![0.0];
        assert_eq!(phase.run_batch(0, &mut next, &mut influences, &mut HashMap::new()), 0);
        assert_eq!(next, vec![0]);
        assert_eq!(influences, vec![0.0]);
    }

    #[test]
    fn test_self_loop_counts_toward_influence() {
        // A unit self-loop adds 2 to the node's weight and to its influence.
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let a = graph.add_node(());
        let _ = graph.add_edge(a, a, 1.0);
        let community_weights = AtomicDoubleArray::new(1, 1e9).unwrap();
        community_weights.set(0, 2.0);
        let staged = AtomicDoubleArray::new(1, 1e9).unwrap();
        let phase = ColorPhase {
            graph: &graph,
            direction: Direction::Both,
            color: 0,
            colors: &[0],
            current: &[0],
            cumulative_node_weights: &[2.0],
            community_weights: &community_weights,
            staged: &staged,
            total_weight: 1.0,
        };
        let mut next = vec![0];
        let mut influences = vec![0.0];
        let _ = phase.run_batch(0, &mut next, &mut influences, &mut HashMap::new());
        assert_eq!(next, vec![0]);
        assert_eq!(influences, vec![2.0]);
    }
}
