use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one cycle flow decomposition.
///
/// For each configured minimum cycle length `k`, `circular_flow[k]` is the
/// total value peeled from cycles of length `>= k` and `ratio[k]` is that
/// value as a fraction of the total input flow. The report is an immutable
/// value computed fresh per invocation; the engine keeps no state between
/// calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularityReport {
    /// Sum of all input edge amounts, fixed before any peeling.
    total_flow: Decimal,
    /// Cumulative circular flow per configured threshold.
    circular_flow: BTreeMap<u32, Decimal>,
    /// `circular_flow[k] / total_flow` per configured threshold.
    ratio: BTreeMap<u32, f64>,
    /// Peeled flow bucketed by exact cycle length.
    peeled_by_length: BTreeMap<usize, Decimal>,
    /// Number of peeling steps performed.
    cycles_peeled: usize,
}

impl CircularityReport {
    pub(crate) fn new(
        total_flow: Decimal,
        circular_flow: BTreeMap<u32, Decimal>,
        ratio: BTreeMap<u32, f64>,
        peeled_by_length: BTreeMap<usize, Decimal>,
        cycles_peeled: usize,
    ) -> Self {
        Self {
            total_flow,
            circular_flow,
            ratio,
            peeled_by_length,
            cycles_peeled,
        }
    }

    /// Sum of all input edge amounts.
    pub fn total_flow(&self) -> Decimal {
        self.total_flow
    }

    /// Cumulative circular flow per configured threshold.
    pub fn circular_flow(&self) -> &BTreeMap<u32, Decimal> {
        &self.circular_flow
    }

    /// Circular flow for cycles of length `>= k`, zero for an unknown threshold.
    pub fn circular_flow_at(&self, k: u32) -> Decimal {
        self.circular_flow.get(&k).copied().unwrap_or(Decimal::ZERO)
    }

    /// Circularity ratio per configured threshold.
    pub fn ratio(&self) -> &BTreeMap<u32, f64> {
        &self.ratio
    }

    /// Circularity ratio for cycles of length `>= k`, zero for an unknown threshold.
    pub fn ratio_at(&self, k: u32) -> f64 {
        self.ratio.get(&k).copied().unwrap_or(0.0)
    }

    /// Peeled flow by exact cycle length (length 1 holds self-loop flow).
    pub fn peeled_by_length(&self) -> &BTreeMap<usize, Decimal> {
        &self.peeled_by_length
    }

    /// Number of peeling steps performed.
    pub fn cycles_peeled(&self) -> usize {
        self.cycles_peeled
    }

    /// Total flow peeled from cycles of any length, self-loops included.
    pub fn peeled_total(&self) -> Decimal {
        self.peeled_by_length.values().copied().sum()
    }

    /// Flow left in the residual graph after peeling: the gradient part
    /// that runs from sources to sinks and never returns.
    pub fn acyclic_flow(&self) -> Decimal {
        self.total_flow - self.peeled_total()
    }

    /// Legacy single-number circularity index: all peeled flow (every cycle
    /// length, self-loops included) over total flow.
    pub fn index(&self) -> f64 {
        if self.total_flow == Decimal::ZERO {
            return 0.0;
        }
        to_f64(self.peeled_total() / self.total_flow)
    }

    /// Verify the report's invariants: ratios in `[0, 1]` and non-increasing
    /// over ascending thresholds, and peeled flow never exceeding the total.
    pub fn is_valid(&self) -> bool {
        let ratios: Vec<f64> = self.ratio.values().copied().collect();
        let in_range = ratios.iter().all(|r| (0.0..=1.0 + 1e-12).contains(r));
        let monotonic = ratios.windows(2).all(|w| w[0] >= w[1]);
        let flows: Vec<Decimal> = self.circular_flow.values().copied().collect();
        let flow_monotonic = flows.windows(2).all(|w| w[0] >= w[1]);
        let conserved = self.peeled_total() <= self.total_flow && self.acyclic_flow() >= Decimal::ZERO;
        in_range && monotonic && flow_monotonic && conserved
    }
}

/// Decimal to f64 for ratio display.
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

impl std::fmt::Display for CircularityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Circularity Report ===")?;
        writeln!(f, "Total Flow:     {}", self.total_flow)?;
        writeln!(f, "Circular Flow:  {}", self.peeled_total())?;
        writeln!(f, "Acyclic Flow:   {}", self.acyclic_flow())?;
        writeln!(f, "Cycles Peeled:  {}", self.cycles_peeled)?;
        writeln!(f, "Index:          {:.1}%", self.index() * 100.0)?;

        writeln!(f, "\nBy minimum cycle length:")?;
        for (k, flow) in &self.circular_flow {
            writeln!(
                f,
                "  k >= {}: {} ({:.1}%)",
                k,
                flow,
                self.ratio_at(*k) * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_report() -> CircularityReport {
        let mut circular_flow = BTreeMap::new();
        let mut ratio = BTreeMap::new();
        let mut by_length = BTreeMap::new();
        by_length.insert(2usize, dec!(100));
        by_length.insert(3usize, dec!(60));
        circular_flow.insert(2, dec!(160));
        circular_flow.insert(3, dec!(60));
        ratio.insert(2, 0.8);
        ratio.insert(3, 0.3);
        CircularityReport::new(dec!(200), circular_flow, ratio, by_length, 2)
    }

    #[test]
    fn test_accessors() {
        let report = sample_report();
        assert_eq!(report.total_flow(), dec!(200));
        assert_eq!(report.circular_flow_at(2), dec!(160));
        assert_eq!(report.circular_flow_at(3), dec!(60));
        assert_eq!(report.circular_flow_at(7), Decimal::ZERO);
        assert_eq!(report.ratio_at(7), 0.0);
        assert_eq!(report.peeled_total(), dec!(160));
        assert_eq!(report.acyclic_flow(), dec!(40));
        assert_eq!(report.cycles_peeled(), 2);
    }

    #[test]
    fn test_legacy_index() {
        let report = sample_report();
        assert!((report.index() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_is_valid() {
        assert!(sample_report().is_valid());
    }

    #[test]
    fn test_display_lists_thresholds() {
        let text = format!("{}", sample_report());
        assert!(text.contains("Circularity Report"));
        assert!(text.contains("k >= 2"));
        assert!(text.contains("k >= 3"));
    }

    #[test]
    fn test_serde_round_trip() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: CircularityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_flow(), report.total_flow());
        assert_eq!(back.circular_flow(), report.circular_flow());
        assert_eq!(back.cycles_peeled(), report.cycles_peeled());
    }
}
