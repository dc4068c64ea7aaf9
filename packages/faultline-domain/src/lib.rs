pub mod arn;
pub mod classify;
pub mod confidence;
pub mod hash;
pub mod model;

pub use model::{
	ConfigSnapshot, EvidenceSource, GraphEdge, GraphNode, Incident, InvestigationOutcome,
	InvestigationSummary, ObservabilityHints, ObservabilityPointer, Pattern, PatternSignatures,
	RankedPattern, Relation, ResourceType, SubGraphResult, Subgraph,
};
