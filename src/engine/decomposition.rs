use crate::core::account::AccountId;
use crate::core::transfer::TransferSet;
use crate::engine::report::{to_f64, CircularityReport};
use crate::graph::cycle_finder::find_cycle;
use crate::graph::flow_graph::{FlowEdge, FlowGraph};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Errors arising from invalid decomposition input.
#[derive(Debug, Error)]
pub enum DecompositionError {
    #[error("edge amount must not be negative, got {amount} for {from} -> {target}")]
    NegativeAmount {
        from: AccountId,
        target: AccountId,
        amount: Decimal,
    },
    #[error("edge endpoint {account} is not in the supplied account list")]
    UnknownAccount { account: AccountId },
    #[error("at least one cycle-length threshold is required")]
    EmptyThresholds,
    #[error("cycle-length thresholds must be at least 1")]
    ZeroThreshold,
}

/// The cycle flow decomposition engine.
///
/// Repeatedly finds an elementary cycle in the residual flow graph, peels
/// its bottleneck flow, and buckets the peeled value by cycle length.
/// The per-length buckets are then reduced into cumulative circular flow
/// and circularity ratios for each configured minimum cycle length.
///
/// The decomposition is greedy and order-dependent: when several cycles
/// share an edge, which one is peeled first follows the graph's
/// deterministic first-seen exploration order, so equal inputs always
/// produce equal reports. Each call owns and discards its own residual
/// graph; concurrent calls share nothing.
///
/// # Examples
///
/// ```
/// use circulation_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let edges = vec![
///     FlowEdge::new("A", "B", dec!(10)),
///     FlowEdge::new("B", "C", dec!(10)),
///     FlowEdge::new("C", "A", dec!(10)),
/// ];
/// let report = CirculationEngine::decompose(
///     &[],
///     &edges,
///     &CirculationEngine::DEFAULT_THRESHOLDS,
/// ).unwrap();
///
/// assert_eq!(report.ratio_at(3), 1.0);
/// assert_eq!(report.circular_flow_at(3), dec!(30));
/// ```
pub struct CirculationEngine;

impl CirculationEngine {
    /// The minimum cycle lengths reported by the standard accounting reports.
    pub const DEFAULT_THRESHOLDS: [u32; 4] = [2, 3, 4, 5];

    /// Decompose a raw edge list.
    ///
    /// `nodes` is the roster of known accounts: when non-empty, every edge
    /// endpoint must appear in it; an empty roster disables the check.
    /// Edges with negative amounts are rejected; zero-amount edges are
    /// ignored. Degenerate input (no edges, or zero total flow) is not an
    /// error and yields the all-zero report.
    pub fn decompose(
        nodes: &[AccountId],
        edges: &[FlowEdge],
        thresholds: &[u32],
    ) -> Result<CircularityReport, DecompositionError> {
        validate_thresholds(thresholds)?;

        if !nodes.is_empty() {
            let roster: HashSet<&AccountId> = nodes.iter().collect();
            for edge in edges {
                for endpoint in [&edge.source, &edge.target] {
                    if !roster.contains(endpoint) {
                        return Err(DecompositionError::UnknownAccount {
                            account: endpoint.clone(),
                        });
                    }
                }
            }
        }
        for edge in edges {
            if edge.amount < Decimal::ZERO {
                return Err(DecompositionError::NegativeAmount {
                    from: edge.source.clone(),
                    target: edge.target.clone(),
                    amount: edge.amount,
                });
            }
        }

        Ok(Self::decompose_graph(FlowGraph::from_edges(edges), thresholds))
    }

    /// Decompose a transfer set (transfer amounts are positive by construction).
    pub fn decompose_transfers(
        transfers: &TransferSet,
        thresholds: &[u32],
    ) -> Result<CircularityReport, DecompositionError> {
        validate_thresholds(thresholds)?;
        Ok(Self::decompose_graph(
            FlowGraph::from_transfers(transfers),
            thresholds,
        ))
    }

    fn decompose_graph(mut graph: FlowGraph, thresholds: &[u32]) -> CircularityReport {
        let total_flow = graph.total_flow();
        let mut by_length: BTreeMap<usize, Decimal> = BTreeMap::new();
        let mut cycles_peeled = 0usize;

        if total_flow > Decimal::ZERO {
            // Each peel deletes at least the bottleneck edge, so this loop
            // runs at most once per initial edge.
            while let Some(cycle) = find_cycle(&graph) {
                let record = graph.peel_cycle(&cycle);
                debug!(
                    "peeled length-{} cycle, bottleneck {}",
                    record.length, record.bottleneck
                );
                *by_length.entry(record.length).or_insert(Decimal::ZERO) += record.amount;
                cycles_peeled += 1;
            }
            debug!(
                "decomposition done: {} cycles peeled, {} residual edges left",
                cycles_peeled,
                graph.edge_count()
            );
        }

        let mut circular_flow = BTreeMap::new();
        let mut ratio = BTreeMap::new();
        for &k in thresholds {
            let sum: Decimal = by_length
                .iter()
                .filter(|(&length, _)| length >= k as usize)
                .map(|(_, &amount)| amount)
                .sum();
            circular_flow.insert(k, sum);
            let fraction = if total_flow == Decimal::ZERO {
                0.0
            } else {
                to_f64(sum / total_flow)
            };
            ratio.insert(k, fraction);
        }

        CircularityReport::new(total_flow, circular_flow, ratio, by_length, cycles_peeled)
    }
}

fn validate_thresholds(thresholds: &[u32]) -> Result<(), DecompositionError> {
    if thresholds.is_empty() {
        return Err(DecompositionError::EmptyThresholds);
    }
    if thresholds.contains(&0) {
        return Err(DecompositionError::ZeroThreshold);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::Transfer;
    use approx::assert_relative_eq;
    use rust_decimal_macros::dec;

    fn account(id: &str) -> AccountId {
        AccountId::new(id)
    }

    fn edge(source: &str, target: &str, amount: Decimal) -> FlowEdge {
        FlowEdge::new(source, target, amount)
    }

    fn decompose(edges: &[FlowEdge]) -> CircularityReport {
        CirculationEngine::decompose(&[], edges, &CirculationEngine::DEFAULT_THRESHOLDS).unwrap()
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let report = decompose(&[]);
        for k in CirculationEngine::DEFAULT_THRESHOLDS {
            assert_eq!(report.ratio_at(k), 0.0);
            assert_eq!(report.circular_flow_at(k), Decimal::ZERO);
        }
        assert_eq!(report.total_flow(), Decimal::ZERO);
        assert_eq!(report.cycles_peeled(), 0);
    }

    #[test]
    fn test_zero_amount_edges_are_degenerate() {
        let report = decompose(&[edge("A", "B", Decimal::ZERO)]);
        assert_eq!(report.total_flow(), Decimal::ZERO);
        assert_eq!(report.ratio_at(2), 0.0);
    }

    #[test]
    fn test_pure_gradient_has_no_circular_flow() {
        let report = decompose(&[edge("A", "B", dec!(100))]);
        for k in CirculationEngine::DEFAULT_THRESHOLDS {
            assert_eq!(report.ratio_at(k), 0.0);
        }
        assert_eq!(report.acyclic_flow(), dec!(100));
    }

    #[test]
    fn test_pure_three_cycle_is_fully_circular() {
        let report = decompose(&[
            edge("A", "B", dec!(10)),
            edge("B", "C", dec!(10)),
            edge("C", "A", dec!(10)),
        ]);
        assert_relative_eq!(report.ratio_at(2), 1.0);
        assert_relative_eq!(report.ratio_at(3), 1.0);
        assert_eq!(report.circular_flow_at(2), dec!(30));
        assert_eq!(report.circular_flow_at(3), dec!(30));
        assert_eq!(report.ratio_at(4), 0.0);
    }

    #[test]
    fn test_bottleneck_peeling() {
        let report = decompose(&[
            edge("A", "B", dec!(100)),
            edge("B", "C", dec!(50)),
            edge("C", "A", dec!(10)),
        ]);
        // One cycle of bottleneck 10, peeled 30 out of 160 total
        assert_eq!(report.total_flow(), dec!(160));
        assert_eq!(report.circular_flow_at(2), dec!(30));
        assert_relative_eq!(report.ratio_at(2), 0.1875);
        assert_relative_eq!(report.ratio_at(3), 0.1875);
        assert_eq!(report.acyclic_flow(), dec!(130));
    }

    #[test]
    fn test_reciprocal_and_triangle_are_separated() {
        let report = decompose(&[
            edge("A", "B", dec!(100)),
            edge("B", "A", dec!(50)),
            edge("B", "C", dec!(30)),
            edge("C", "D", dec!(20)),
            edge("D", "B", dec!(20)),
        ]);
        // 2-cycle: bottleneck 50 -> 100; 3-cycle: bottleneck 20 -> 60
        assert_eq!(report.circular_flow_at(2), dec!(160));
        assert_eq!(report.circular_flow_at(3), dec!(60));
        assert_eq!(report.circular_flow_at(4), Decimal::ZERO);
        assert_eq!(report.circular_flow_at(5), Decimal::ZERO);
        assert_eq!(report.total_flow(), dec!(220));
    }

    #[test]
    fn test_duplicate_edges_sum_before_peeling() {
        let report = decompose(&[
            edge("A", "B", dec!(60)),
            edge("A", "B", dec!(40)),
            edge("B", "A", dec!(100)),
        ]);
        assert_eq!(report.circular_flow_at(2), dec!(200));
        assert_relative_eq!(report.ratio_at(2), 1.0);
    }

    #[test]
    fn test_self_loop_excluded_from_default_thresholds() {
        let report = decompose(&[edge("A", "A", dec!(40)), edge("A", "B", dec!(60))]);
        // The self-loop is peeled (length 1) but counts toward no k >= 2 bucket
        assert_eq!(report.cycles_peeled(), 1);
        assert_eq!(report.peeled_total(), dec!(40));
        assert_eq!(report.circular_flow_at(2), Decimal::ZERO);
        assert_eq!(report.acyclic_flow(), dec!(60));
    }

    #[test]
    fn test_self_loop_counts_toward_threshold_one() {
        let report =
            CirculationEngine::decompose(&[], &[edge("A", "A", dec!(40))], &[1, 2]).unwrap();
        assert_eq!(report.circular_flow_at(1), dec!(40));
        assert_relative_eq!(report.ratio_at(1), 1.0);
        assert_eq!(report.circular_flow_at(2), Decimal::ZERO);
    }

    #[test]
    fn test_custom_thresholds_shape_output() {
        let report = CirculationEngine::decompose(
            &[],
            &[
                edge("A", "B", dec!(10)),
                edge("B", "C", dec!(10)),
                edge("C", "A", dec!(10)),
            ],
            &[3, 6],
        )
        .unwrap();
        assert_eq!(report.circular_flow().len(), 2);
        assert_eq!(report.circular_flow_at(3), dec!(30));
        assert_eq!(report.circular_flow_at(6), Decimal::ZERO);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let result = CirculationEngine::decompose(
            &[],
            &[edge("A", "B", dec!(-5))],
            &CirculationEngine::DEFAULT_THRESHOLDS,
        );
        assert!(matches!(
            result,
            Err(DecompositionError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn test_unknown_endpoint_is_rejected_with_roster() {
        let roster = vec![account("A"), account("B")];
        let result = CirculationEngine::decompose(
            &roster,
            &[edge("A", "C", dec!(10))],
            &CirculationEngine::DEFAULT_THRESHOLDS,
        );
        assert!(matches!(
            result,
            Err(DecompositionError::UnknownAccount { .. })
        ));
    }

    #[test]
    fn test_empty_roster_skips_endpoint_check() {
        let result = CirculationEngine::decompose(
            &[],
            &[edge("A", "C", dec!(10))],
            &CirculationEngine::DEFAULT_THRESHOLDS,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_threshold_validation() {
        assert!(matches!(
            CirculationEngine::decompose(&[], &[], &[]),
            Err(DecompositionError::EmptyThresholds)
        ));
        assert!(matches!(
            CirculationEngine::decompose(&[], &[], &[0, 2]),
            Err(DecompositionError::ZeroThreshold)
        ));
    }

    #[test]
    fn test_decompose_transfers_pipeline() {
        let mut set = TransferSet::new();
        set.add(Transfer::new(account("A"), account("B"), dec!(100)));
        set.add(Transfer::new(account("B"), account("A"), dec!(50)));

        let report = CirculationEngine::decompose_transfers(
            &set,
            &CirculationEngine::DEFAULT_THRESHOLDS,
        )
        .unwrap();
        assert_eq!(report.circular_flow_at(2), dec!(100));
        assert_eq!(report.acyclic_flow(), dec!(50));
    }

    #[test]
    fn test_flow_conservation() {
        let report = decompose(&[
            edge("A", "B", dec!(77)),
            edge("B", "C", dec!(33)),
            edge("C", "A", dec!(12)),
            edge("B", "A", dec!(5)),
        ]);
        assert_eq!(report.peeled_total() + report.acyclic_flow(), report.total_flow());
        assert!(report.is_valid());
    }

    #[test]
    fn test_determinism() {
        let edges = vec![
            edge("A", "B", dec!(50)),
            edge("B", "A", dec!(30)),
            edge("B", "C", dec!(20)),
            edge("C", "D", dec!(15)),
            edge("D", "B", dec!(15)),
        ];
        let first = decompose(&edges);
        let second = decompose(&edges);
        assert_eq!(first.circular_flow(), second.circular_flow());
        assert_eq!(first.ratio(), second.ratio());
        assert_eq!(first.peeled_by_length(), second.peeled_by_length());
    }
}
