use crate::graph::flow_graph::FlowGraph;

/// Find one elementary cycle in the residual graph, or `None` if it is acyclic.
///
/// Runs an iterative depth-first search from every not-yet-visited node
/// that still has outgoing residual flow. Each node is explored at most
/// once per call; following an edge into a node already on the current
/// path closes a cycle, returned as the contiguous path suffix starting at
/// that node. A residual self-loop is reported as a single-node cycle.
///
/// Start nodes and successors are both taken in ascending first-seen index
/// order, so the cycle chosen for a given residual graph is deterministic.
/// Runs in O(V + E) over the current residual graph.
pub fn find_cycle(graph: &FlowGraph) -> Option<Vec<usize>> {
    let n = graph.account_count();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];

    for start in 0..n {
        if visited[start] || !graph.has_outgoing(start) {
            continue;
        }

        // Each frame snapshots the node's successor indices with a cursor.
        let mut stack: Vec<(usize, Vec<usize>, usize)> = Vec::new();
        visited[start] = true;
        on_stack[start] = true;
        stack.push((start, successor_indices(graph, start), 0));

        while let Some(frame) = stack.last_mut() {
            let u = frame.0;
            if frame.2 >= frame.1.len() {
                on_stack[u] = false;
                stack.pop();
                continue;
            }
            let v = frame.1[frame.2];
            frame.2 += 1;

            if on_stack[v] {
                let pos = stack
                    .iter()
                    .position(|f| f.0 == v)
                    .expect("on-stack node must be in the path stack");
                return Some(stack[pos..].iter().map(|f| f.0).collect());
            }

            if !visited[v] && graph.has_outgoing(v) {
                visited[v] = true;
                on_stack[v] = true;
                stack.push((v, successor_indices(graph, v), 0));
            }
        }
    }

    None
}

fn successor_indices(graph: &FlowGraph, node: usize) -> Vec<usize> {
    graph.successors(node).map(|(target, _)| target).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::AccountId;
    use rust_decimal_macros::dec;

    fn account(id: &str) -> AccountId {
        AccountId::new(id)
    }

    fn cycle_edges(graph: &FlowGraph, cycle: &[usize]) -> Vec<(usize, usize)> {
        (0..cycle.len())
            .map(|i| (cycle[i], cycle[(i + 1) % cycle.len()]))
            .collect()
    }

    #[test]
    fn test_dag_has_no_cycle() {
        let mut graph = FlowGraph::new();
        graph.add_flow(&account("A"), &account("B"), dec!(100));
        graph.add_flow(&account("B"), &account("C"), dec!(100));
        graph.add_flow(&account("A"), &account("C"), dec!(40));

        assert_eq!(find_cycle(&graph), None);
    }

    #[test]
    fn test_finds_triangle() {
        let mut graph = FlowGraph::new();
        graph.add_flow(&account("A"), &account("B"), dec!(10));
        graph.add_flow(&account("B"), &account("C"), dec!(10));
        graph.add_flow(&account("C"), &account("A"), dec!(10));

        let cycle = find_cycle(&graph).expect("triangle must be found");
        assert_eq!(cycle.len(), 3);
        // Every cycle edge must exist in the residual graph
        for (u, v) in cycle_edges(&graph, &cycle) {
            assert!(graph.successors(u).any(|(t, _)| t == v));
        }
    }

    #[test]
    fn test_finds_self_loop() {
        let mut graph = FlowGraph::new();
        graph.add_flow(&account("A"), &account("B"), dec!(5));
        graph.add_flow(&account("B"), &account("B"), dec!(7));

        let cycle = find_cycle(&graph).expect("self-loop must be found");
        assert_eq!(cycle, vec![1]);
    }

    #[test]
    fn test_cycle_nodes_are_distinct() {
        let mut graph = FlowGraph::new();
        // Two overlapping cycles through B
        graph.add_flow(&account("A"), &account("B"), dec!(10));
        graph.add_flow(&account("B"), &account("A"), dec!(10));
        graph.add_flow(&account("B"), &account("C"), dec!(10));
        graph.add_flow(&account("C"), &account("B"), dec!(10));

        let cycle = find_cycle(&graph).expect("cycle must be found");
        let mut sorted = cycle.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), cycle.len(), "elementary cycle repeats a node");
    }

    #[test]
    fn test_deterministic_choice() {
        let build = || {
            let mut graph = FlowGraph::new();
            graph.add_flow(&account("A"), &account("B"), dec!(10));
            graph.add_flow(&account("B"), &account("A"), dec!(10));
            graph.add_flow(&account("C"), &account("D"), dec!(10));
            graph.add_flow(&account("D"), &account("C"), dec!(10));
            graph
        };
        assert_eq!(find_cycle(&build()), find_cycle(&build()));
    }

    #[test]
    fn test_cycle_found_after_peel() {
        let mut graph = FlowGraph::new();
        graph.add_flow(&account("A"), &account("B"), dec!(100));
        graph.add_flow(&account("B"), &account("A"), dec!(50));
        graph.add_flow(&account("B"), &account("C"), dec!(30));
        graph.add_flow(&account("C"), &account("B"), dec!(20));

        let first = find_cycle(&graph).expect("first cycle");
        graph.peel_cycle(&first);
        let second = find_cycle(&graph).expect("second cycle");
        graph.peel_cycle(&second);
        assert_eq!(find_cycle(&graph), None);
    }
}
