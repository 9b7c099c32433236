use colormod::{
    CommunityDetection, ModularityOptimization, ModularityOptimizationConfig, TerminationFlag,
};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Run with RUST_LOG=debug to see every color phase.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Three 6-cliques in a ring, plus a weak chord between the first two.
    let mut graph = UnGraph::<(), f64>::new_undirected();
    for _ in 0..18 {
        let _ = graph.add_node(());
    }
    for c in 0..3 {
        let base = c * 6;
        for a in 0..6 {
            for b in (a + 1)..6 {
                let _ = graph.add_edge(NodeIndex::new(base + a), NodeIndex::new(base + b), 1.0);
            }
        }
        let _ = graph.add_edge(NodeIndex::new(base), NodeIndex::new((base + 7) % 18), 1.0);
    }
    let _ = graph.add_edge(NodeIndex::new(2), NodeIndex::new(9), 0.2);

    let config = ModularityOptimizationConfig::new()
        .with_min_batch_size(4)
        .with_tolerance(1e-6);
    let optimizer =
        ModularityOptimization::new(config).with_termination_flag(TerminationFlag::new());

    // Unseeded run: one community per node at the start.
    let result = optimizer.compute(&graph)?;
    println!(
        "unseeded: modularity={:.4} iterations={} converged={}",
        result.modularity(),
        result.iterations(),
        result.did_converge()
    );
    println!("dense labels: {:?}", optimizer.detect(&graph)?);

    // Seeded run: the first clique is labelled 100, node 6 is labelled 200,
    // the rest starts unseeded.
    let seeds: Vec<Option<i64>> = (0..18)
        .map(|node| match node {
            0..=5 => Some(100),
            6 => Some(200),
            _ => None,
        })
        .collect();
    let seeded = optimizer.compute_seeded(&graph, &seeds)?;

    let mut by_comm: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (node, &comm) in seeded.communities().iter().enumerate() {
        by_comm.entry(comm).or_default().push(node);
    }
    println!(
        "seeded: modularity={:.4} communities={}",
        seeded.modularity(),
        seeded.community_count()
    );
    for (label, nodes) in by_comm {
        println!("  community {}: {:?}", label, nodes);
    }

    Ok(())
}
