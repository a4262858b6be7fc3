use crate::core::account::AccountId;
use crate::core::transfer::TransferSet;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Residual amounts below this threshold are treated as fully peeled and
/// removed from the graph, so the peeling loop cannot spin on numerical dust.
pub const FLOW_EPSILON: Decimal = dec!(0.000000001);

/// A raw directed flow edge, as supplied by the upstream aggregation layer.
///
/// Multiple edges between the same ordered pair are legal and are summed
/// when the graph is built. Self-loops (`source == target`) are legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: AccountId,
    pub target: AccountId,
    pub amount: Decimal,
}

impl FlowEdge {
    pub fn new(source: impl Into<AccountId>, target: impl Into<AccountId>, amount: Decimal) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            amount,
        }
    }
}

/// The value removed from the graph by one peeling step.
///
/// `amount` is the total flow attributed to cycles of exactly `length`,
/// i.e. `bottleneck * length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeelRecord {
    pub length: usize,
    pub bottleneck: Decimal,
    pub amount: Decimal,
}

/// Residual flow graph over one reporting window.
///
/// Accounts are interned into dense indices in first-seen order; the
/// residual adjacency maps each source index to its targets and remaining
/// amounts. Successor iteration is in ascending index order, which makes
/// the whole decomposition deterministic for a fixed input edge order.
///
/// Invariant: every stored residual amount is positive. Peeling only
/// removes flow; the graph never grows after construction.
///
/// # Examples
///
/// ```
/// use circulation_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let mut graph = FlowGraph::new();
/// graph.add_flow(&AccountId::new("A"), &AccountId::new("B"), dec!(100));
/// graph.add_flow(&AccountId::new("A"), &AccountId::new("B"), dec!(50));
///
/// assert_eq!(graph.account_count(), 2);
/// assert_eq!(graph.total_flow(), dec!(150));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    /// Index -> account, in first-seen order.
    accounts: Vec<AccountId>,
    indices: HashMap<AccountId, usize>,
    /// Residual adjacency: source index -> (target index -> remaining amount).
    outgoing: Vec<BTreeMap<usize, Decimal>>,
    /// Sum of all positive input amounts, fixed at build time.
    total_flow: Decimal,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from raw edges. Edges with `amount <= 0` are ignored.
    pub fn from_edges(edges: &[FlowEdge]) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_flow(&edge.source, &edge.target, edge.amount);
        }
        graph
    }

    /// Build a graph from a transfer set (one edge per transfer, summed per pair).
    pub fn from_transfers(transfers: &TransferSet) -> Self {
        let mut graph = Self::new();
        for transfer in transfers.transfers() {
            graph.add_flow(transfer.payer(), transfer.payee(), transfer.amount());
        }
        graph
    }

    /// Add flow from `source` to `target`, summing with any existing edge.
    ///
    /// Amounts `<= 0` contribute nothing and create no adjacency entry.
    pub fn add_flow(&mut self, source: &AccountId, target: &AccountId, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        let s = self.intern(source);
        let t = self.intern(target);
        *self.outgoing[s].entry(t).or_insert(Decimal::ZERO) += amount;
        self.total_flow += amount;
    }

    fn intern(&mut self, account: &AccountId) -> usize {
        if let Some(&index) = self.indices.get(account) {
            return index;
        }
        let index = self.accounts.len();
        self.accounts.push(account.clone());
        self.indices.insert(account.clone(), index);
        self.outgoing.push(BTreeMap::new());
        index
    }

    /// Number of interned accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of residual edges currently in the graph.
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(|out| out.len()).sum()
    }

    /// Sum of all positive input amounts. Unaffected by peeling.
    pub fn total_flow(&self) -> Decimal {
        self.total_flow
    }

    /// All interned accounts in index order.
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    /// The account at a given index.
    pub fn account(&self, index: usize) -> &AccountId {
        &self.accounts[index]
    }

    /// The index of an account, if it participates in any edge.
    pub fn index_of(&self, account: &AccountId) -> Option<usize> {
        self.indices.get(account).copied()
    }

    /// Remaining flow from `source` to `target`, zero if the edge is gone.
    pub fn residual(&self, source: &AccountId, target: &AccountId) -> Decimal {
        let (Some(s), Some(t)) = (self.index_of(source), self.index_of(target)) else {
            return Decimal::ZERO;
        };
        self.outgoing[s].get(&t).copied().unwrap_or(Decimal::ZERO)
    }

    /// Residual successors of a node, in ascending index order.
    pub fn successors(&self, index: usize) -> impl Iterator<Item = (usize, Decimal)> + '_ {
        self.outgoing[index].iter().map(|(&t, &amount)| (t, amount))
    }

    /// Whether a node still has any outgoing residual flow.
    pub fn has_outgoing(&self, index: usize) -> bool {
        !self.outgoing[index].is_empty()
    }

    /// Peel the bottleneck flow off a cycle, mutating the residual graph.
    ///
    /// The cycle is a sequence of node indices interpreted cyclically: the
    /// edge `cycle[i] -> cycle[(i + 1) % len]` must exist for every `i`.
    /// A single-element cycle is a self-loop. The minimum residual amount
    /// along the cycle is subtracted from every cycle edge; edges whose
    /// remainder drops below [`FLOW_EPSILON`] are deleted. At least one
    /// edge (the bottleneck) is always deleted, so repeated peeling
    /// terminates.
    ///
    /// # Panics
    ///
    /// Panics if `cycle` is empty or references an edge not present in the
    /// residual graph.
    pub fn peel_cycle(&mut self, cycle: &[usize]) -> PeelRecord {
        assert!(!cycle.is_empty(), "cannot peel an empty cycle");

        let mut bottleneck = Decimal::MAX;
        for i in 0..cycle.len() {
            let u = cycle[i];
            let v = cycle[(i + 1) % cycle.len()];
            let amount = self.outgoing[u]
                .get(&v)
                .copied()
                .expect("cycle edge missing from residual graph");
            if amount < bottleneck {
                bottleneck = amount;
            }
        }

        for i in 0..cycle.len() {
            let u = cycle[i];
            let v = cycle[(i + 1) % cycle.len()];
            let remaining = self.outgoing[u][&v] - bottleneck;
            if remaining < FLOW_EPSILON {
                self.outgoing[u].remove(&v);
            } else {
                self.outgoing[u].insert(v, remaining);
            }
        }

        PeelRecord {
            length: cycle.len(),
            bottleneck,
            amount: bottleneck * Decimal::from(cycle.len() as u64),
        }
    }
}
