use crate::core::account::AccountId;
use crate::graph::flow_graph::FlowGraph;
use rust_decimal::Decimal;

/// A strongly connected component of the flow graph.
///
/// All accounts within a component can reach each other through transfer
/// chains, so every cycle the peeling loop can find lives inside one
/// component. Components with more than one account (or a self-loop)
/// form the circulating core of the network.
#[derive(Debug, Clone)]
pub struct CirculatingComponent {
    pub accounts: Vec<AccountId>,
    /// Whether the component can carry a cycle (size > 1 or a self-loop).
    circulating: bool,
}

impl CirculatingComponent {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns true if any circular flow can pass through this component.
    pub fn is_circulating(&self) -> bool {
        self.circulating
    }
}

/// Find all strongly connected components using Tarjan's algorithm.
///
/// Components are discovered over the current residual adjacency, in the
/// graph's deterministic index order, and each component's accounts are
/// returned sorted.
pub fn find_components(graph: &FlowGraph) -> Vec<CirculatingComponent> {
    let n = graph.account_count();
    let mut state = TarjanState {
        index_counter: 0,
        stack: Vec::new(),
        on_stack: vec![false; n],
        indices: vec![None; n],
        lowlinks: vec![0; n],
        result: Vec::new(),
    };

    for node in 0..n {
        if state.indices[node].is_none() {
            strongconnect(node, graph, &mut state);
        }
    }

    state
        .result
        .into_iter()
        .map(|members| {
            let circulating = members.len() > 1
                || members
                    .iter()
                    .any(|&m| graph.successors(m).any(|(t, _)| t == m));
            let mut accounts: Vec<AccountId> =
                members.iter().map(|&m| graph.account(m).clone()).collect();
            accounts.sort();
            CirculatingComponent {
                accounts,
                circulating,
            }
        })
        .collect()
}

/// Gross residual flow on edges inside circulating components.
///
/// An upper bound on how much of the remaining flow can still be peeled:
/// edges that cross component boundaries can never sit on a cycle.
pub fn circulating_capacity(graph: &FlowGraph) -> Decimal {
    let n = graph.account_count();
    let mut component_of = vec![usize::MAX; n];
    for (id, component) in find_components(graph).iter().enumerate() {
        for account in &component.accounts {
            if let Some(index) = graph.index_of(account) {
                component_of[index] = id;
            }
        }
    }

    let mut capacity = Decimal::ZERO;
    for u in 0..n {
        for (v, amount) in graph.successors(u) {
            if component_of[u] == component_of[v] {
                capacity += amount;
            }
        }
    }
    capacity
}

struct TarjanState {
    index_counter: usize,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    result: Vec<Vec<usize>>,
}

fn strongconnect(v: usize, graph: &FlowGraph, state: &mut TarjanState) {
    state.indices[v] = Some(state.index_counter);
    state.lowlinks[v] = state.index_counter;
    state.index_counter += 1;
    state.stack.push(v);
    state.on_stack[v] = true;

    let successors: Vec<usize> = graph.successors(v).map(|(t, _)| t).collect();
    for w in successors {
        if state.indices[w].is_none() {
            strongconnect(w, graph, state);
            state.lowlinks[v] = state.lowlinks[v].min(state.lowlinks[w]);
        } else if state.on_stack[w] {
            let idx_w = state.indices[w].expect("indexed node");
            state.lowlinks[v] = state.lowlinks[v].min(idx_w);
        }
    }

    // If v is a root node, pop the stack and generate an SCC
    if Some(state.lowlinks[v]) == state.indices[v] {
        let mut component = Vec::new();
        loop {
            let w = state.stack.pop().expect("stack holds the component");
            state.on_stack[w] = false;
            component.push(w);
            if w == v {
                break;
            }
        }
        state.result.push(component);
    }
}
