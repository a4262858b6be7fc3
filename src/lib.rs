//! # circulation-engine
//!
//! Cycle flow decomposition engine for community currency circularity
//! reporting.
//!
//! Given a directed graph of transfers between accounts over a reporting
//! period, this engine determines what fraction of the total transacted
//! value moves in closed cycles (the payer eventually receives it back,
//! directly or through intermediaries) versus flowing linearly from
//! sources to sinks. The resulting circularity index measures how well
//! money recirculates inside a community instead of leaking out.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: accounts, transfers, report periods
//! - **graph** — Residual flow graph, cycle finding, strongly connected components
//! - **engine** — Bottleneck cycle peeling and threshold aggregation
//! - **simulation** — Random transfer network generation for testing

pub mod core;
pub mod engine;
pub mod graph;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::account::AccountId;
    pub use crate::core::period::ReportPeriod;
    pub use crate::core::transfer::{Transfer, TransferSet};
    pub use crate::engine::decomposition::{CirculationEngine, DecompositionError};
    pub use crate::engine::report::CircularityReport;
    pub use crate::graph::flow_graph::{FlowEdge, FlowGraph};
}
