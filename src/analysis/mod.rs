pub mod centrality;
pub mod cycle_detector;
pub mod engine;
pub mod graph_builder;
pub mod layering_detector;
pub mod ring;
pub mod scorer;
pub mod smurfing_detector;

pub use cycle_detector::CycleDetector;
pub use engine::{AnalysisEngine, AnalysisReport, EdgeView, Findings, GraphView, NodeView};
pub use graph_builder::{AccountStats, AdjEntry, EdgeAggregate, FlowGraph};
pub use layering_detector::LayeringDetector;
pub use ring::{dedup_rings, ring_id, Ring, RingEvidence, RingPattern, RingRoles};
pub use scorer::{AccountFlags, ScoredAccount};
pub use smurfing_detector::SmurfingDetector;
