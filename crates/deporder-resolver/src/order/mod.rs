//! Installation ordering with Kahn's algorithm
//!
//! In-degrees count how many times a package is listed as somebody's
//! dependency. The forward pass therefore emits dependents before what they
//! depend on; the published order is that pass reversed, so the packages
//! relied upon the most come first.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use deporder_core::{DeporderError, PackageName};

use crate::graph::DependencyGraph;
use crate::ResolverResult;

/// Result of the forward Kahn pass
#[derive(Debug)]
struct ForwardPass<'g> {
    /// Packages in the order they reached in-degree zero
    forward: Vec<&'g str>,
    /// Every node seen, keys first, then dangling dependency names
    in_degree: IndexMap<&'g str, usize>,
}

fn forward_pass(graph: &DependencyGraph) -> ForwardPass<'_> {
    let mut in_degree: IndexMap<&str, usize> =
        graph.packages().map(|name| (name.as_str(), 0)).collect();
    for (_, deps) in graph.iter() {
        for dep in deps {
            *in_degree.entry(dep.as_str()).or_insert(0) += 1;
        }
    }

    let mut remaining = in_degree.clone();
    let mut queue: VecDeque<&str> = graph
        .packages()
        .map(String::as_str)
        .filter(|name| remaining[name] == 0)
        .collect();
    let mut forward = Vec::with_capacity(in_degree.len());

    while let Some(node) = queue.pop_front() {
        forward.push(node);

        for dep in graph.dependencies_of(node).unwrap_or_default() {
            if let Some(degree) = remaining.get_mut(dep.as_str()) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dep.as_str());
                }
            }
        }
    }

    ForwardPass { forward, in_degree }
}

/// Order the packages of `graph` for installation.
///
/// Returns the reverse of Kahn's forward order. Fails with
/// [`DeporderError::Cycle`] when some packages can never reach in-degree
/// zero; no partial order is returned in that case.
pub fn topological_sort(graph: &DependencyGraph) -> ResolverResult<Vec<PackageName>> {
    let pass = forward_pass(graph);

    if pass.forward.len() < pass.in_degree.len() {
        let members = cycle_members(graph, &pass);
        debug!(
            "Sorted {} of {} packages before hitting a cycle",
            pass.forward.len(),
            pass.in_degree.len()
        );
        return Err(DeporderError::Cycle { members });
    }

    Ok(pass.forward.into_iter().rev().map(str::to_string).collect())
}

/// Packages left unsorted that actually sit on a cycle
fn cycle_members(graph: &DependencyGraph, pass: &ForwardPass<'_>) -> Vec<PackageName> {
    let sorted: HashSet<&str> = pass.forward.iter().copied().collect();
    let unresolved: Vec<&str> = pass
        .in_degree
        .keys()
        .copied()
        .filter(|name| !sorted.contains(name))
        .collect();

    let mut remainder: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &name in &unresolved {
        remainder.add_node(name);
    }
    for &name in &unresolved {
        for dep in graph.dependencies_of(name).unwrap_or_default() {
            if remainder.contains_node(dep.as_str()) {
                remainder.add_edge(name, dep.as_str(), ());
            }
        }
    }

    let mut members: Vec<PackageName> = tarjan_scc(&remainder)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || remainder.contains_edge(component[0], component[0])
        })
        .flatten()
        .map(str::to_string)
        .collect();

    if members.is_empty() {
        members = unresolved.into_iter().map(str::to_string).collect();
    }
    members.sort();
    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(&str, &[&str])]) -> DependencyGraph {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_linear_chain_order() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_forward_pass_is_dependents_first() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]);
        assert_eq!(forward_pass(&g).forward, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[("A", &["B"]), ("B", &["A"])]);
        let err = topological_sort(&g).unwrap_err();
        match err {
            DeporderError::Cycle { members } => assert_eq!(members, vec!["A", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let g = graph(&[("A", &["A"])]);
        assert!(matches!(
            topological_sort(&g),
            Err(DeporderError::Cycle { members }) if members == vec!["A"]
        ));
    }

    #[test]
    fn test_cycle_members_exclude_downstream_packages() {
        // root -> x <-> y -> leaf: only x and y are on the cycle
        let g = graph(&[
            ("root", &["x"]),
            ("x", &["y"]),
            ("y", &["x", "leaf"]),
            ("leaf", &[]),
        ]);
        match topological_sort(&g).unwrap_err() {
            DeporderError::Cycle { members } => assert_eq!(members, vec!["x", "y"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_diamond_order() {
        let g = graph(&[
            ("root", &["a", "b"]),
            ("a", &["c"]),
            ("b", &["c"]),
            ("c", &[]),
        ]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["c", "b", "a", "root"]);
    }

    #[test]
    fn test_ties_follow_key_order() {
        let g = graph(&[("b", &[]), ("a", &[]), ("c", &[])]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_edges_are_counted_per_occurrence() {
        let g = graph(&[("A", &["B", "B"]), ("B", &[])]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_dangling_dependency_is_a_leaf() {
        let g = graph(&[("A", &["B"])]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["B", "A"]);
    }

    #[test]
    fn test_empty_graph() {
        assert!(topological_sort(&DependencyGraph::new()).unwrap().is_empty());
    }

    #[test]
    fn test_deterministic_across_runs() {
        let g = graph(&[
            ("app", &["z", "m", "a"]),
            ("z", &["shared"]),
            ("m", &["shared"]),
            ("a", &[]),
            ("shared", &[]),
        ]);
        let first = topological_sort(&g).unwrap();
        for _ in 0..10 {
            assert_eq!(topological_sort(&g.clone()).unwrap(), first);
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn dag(num_packages: usize, edges: &[(usize, usize)]) -> DependencyGraph {
        let mut adjacency: Vec<Vec<PackageName>> = vec![Vec::new(); num_packages];
        for &(from, to) in edges {
            // Only edges to higher indices keep the graph acyclic
            if from < num_packages && to < num_packages && from < to {
                adjacency[from].push(format!("pkg{}", to));
            }
        }
        adjacency
            .into_iter()
            .enumerate()
            .map(|(i, deps)| (format!("pkg{}", i), deps))
            .collect()
    }

    proptest! {
        #[test]
        fn acyclic_graphs_sort_completely(
            num_packages in 1usize..12,
            edges in prop::collection::vec((0usize..12, 0usize..12), 0..30)
        ) {
            let graph = dag(num_packages, &edges);
            let sorted = topological_sort(&graph).unwrap();

            // Every key exactly once
            prop_assert_eq!(sorted.len(), num_packages);
            let unique: HashSet<_> = sorted.iter().collect();
            prop_assert_eq!(unique.len(), sorted.len());

            // Dependencies come before their dependents in the published order
            let position = |name: &str| sorted.iter().position(|p| p == name).unwrap();
            for (name, deps) in graph.iter() {
                for dep in deps {
                    prop_assert!(position(dep) < position(name));
                }
            }
        }

        #[test]
        fn back_edge_is_detected(
            num_packages in 2usize..10,
            edges in prop::collection::vec((0usize..10, 0usize..10), 0..20)
        ) {
            // A chain pkg0 -> pkg1 -> ... -> pkgN closed by pkgN -> pkg0
            let mut all_edges: Vec<(usize, usize)> =
                (0..num_packages - 1).map(|i| (i, i + 1)).collect();
            all_edges.extend(edges);
            let mut graph = dag(num_packages, &all_edges);

            let last = format!("pkg{}", num_packages - 1);
            let mut entries: Vec<(PackageName, Vec<PackageName>)> = graph
                .iter()
                .map(|(name, deps)| (name.clone(), deps.clone()))
                .collect();
            for (name, deps) in entries.iter_mut() {
                if *name == last {
                    deps.push("pkg0".to_string());
                }
            }
            graph = entries.into_iter().collect();

            match topological_sort(&graph) {
                Err(DeporderError::Cycle { members }) => {
                    prop_assert!(members.contains(&"pkg0".to_string()));
                    prop_assert!(members.contains(&last));
                }
                other => prop_assert!(false, "expected a cycle, got {:?}", other),
            }
        }
    }
}
