use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
	Lambda,
	Dynamodb,
	S3,
	Sns,
	Sqs,
	Apigateway,
	Stepfunctions,
	Eventbridge,
	Kinesis,
	Rds,
	Unknown,
}
impl ResourceType {
	/// The service segment used when synthesizing an ARN for this kind.
	pub fn service(&self) -> &'static str {
		match self {
			Self::Lambda => "lambda",
			Self::Dynamodb => "dynamodb",
			Self::S3 => "s3",
			Self::Sns => "sns",
			Self::Sqs => "sqs",
			Self::Apigateway => "apigateway",
			Self::Stepfunctions => "states",
			Self::Eventbridge => "events",
			Self::Kinesis => "kinesis",
			Self::Rds => "rds",
			Self::Unknown => "unknown",
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Lambda => "lambda",
			Self::Dynamodb => "dynamodb",
			Self::S3 => "s3",
			Self::Sns => "sns",
			Self::Sqs => "sqs",
			Self::Apigateway => "apigateway",
			Self::Stepfunctions => "stepfunctions",
			Self::Eventbridge => "eventbridge",
			Self::Kinesis => "kinesis",
			Self::Rds => "rds",
			Self::Unknown => "unknown",
		}
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
	Calls,
	Reads,
	Writes,
	Publishes,
	Subscribes,
	Triggers,
}
impl Relation {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Calls => "CALLS",
			Self::Reads => "READS",
			Self::Writes => "WRITES",
			Self::Publishes => "PUBLISHES",
			Self::Subscribes => "SUBSCRIBES",
			Self::Triggers => "TRIGGERS",
		}
	}
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceSource {
	Trace,
	Logs,
}

/// Inline hints on a node for where its telemetry lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityHints {
	pub log_group: Option<String>,
	pub trace_name: Option<String>,
	pub metric_namespace: Option<String>,
}

/// A single AWS resource. The ARN is the only stable join key; `unknown` type is
/// a valid persisted state when classification fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub arn: String,
	pub r#type: ResourceType,
	pub name: String,
	pub account_id: String,
	pub region: String,
	#[serde(default)]
	pub tags: BTreeMap<String, String>,
	#[serde(default)]
	pub observability: ObservabilityHints,
	#[serde(default)]
	pub config_fingerprint: Option<String>,
	#[serde(default)]
	pub versions: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub last_seen: OffsetDateTime,
	#[serde(default)]
	pub stale: bool,
}

/// A directed relationship between two ARNs. Identity is the
/// `(from_arn, rel, to_arn)` triple; everything else is a mutable attribute of
/// the same logical edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub edge_id: String,
	pub from_arn: String,
	pub to_arn: String,
	pub rel: Relation,
	pub evidence_sources: BTreeSet<EvidenceSource>,
	pub confidence: f32,
	#[serde(with = "time::serde::rfc3339")]
	pub first_seen: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_seen: OffsetDateTime,
	pub account_id: String,
	pub region: String,
}
impl GraphEdge {
	/// Folds a repeated observation of the same triple into this edge: evidence
	/// set widens, confidence keeps its maximum, and the seen-window stretches.
	pub fn merge_observation(&mut self, other: &GraphEdge) {
		for source in &other.evidence_sources {
			self.evidence_sources.insert(*source);
		}

		self.confidence = self.confidence.max(other.confidence);
		self.first_seen = self.first_seen.min(other.first_seen);
		self.last_seen = self.last_seen.max(other.last_seen);

		if self.account_id.is_empty() {
			self.account_id = other.account_id.clone();
		}
		if self.region.is_empty() {
			self.region = other.region.clone();
		}
	}
}

/// Per-ARN pointers for where to look next: one document per ARN, last write
/// wins per field, recent trace ids kept newest-first and bounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityPointer {
	pub arn: String,
	#[serde(default)]
	pub log_group: Option<String>,
	#[serde(default)]
	pub trace_name: Option<String>,
	#[serde(default)]
	pub recent_trace_ids: Vec<String>,
	#[serde(default)]
	pub metric_namespace: Option<String>,
	#[serde(default)]
	pub metric_names: Vec<String>,
}
impl ObservabilityPointer {
	pub fn merge_from(&mut self, newer: &ObservabilityPointer, trace_ids_cap: usize) {
		if newer.log_group.is_some() {
			self.log_group = newer.log_group.clone();
		}
		if newer.trace_name.is_some() {
			self.trace_name = newer.trace_name.clone();
		}
		if newer.metric_namespace.is_some() {
			self.metric_namespace = newer.metric_namespace.clone();
		}

		for name in &newer.metric_names {
			if !self.metric_names.contains(name) {
				self.metric_names.push(name.clone());
			}
		}

		let mut ids = newer.recent_trace_ids.clone();

		for id in &self.recent_trace_ids {
			if !ids.contains(id) {
				ids.push(id.clone());
			}
		}

		ids.truncate(trace_ids_cap);

		self.recent_trace_ids = ids;
	}
}

/// A content-addressed configuration capture: `config_id = arn + "|" + hash`, so
/// re-collecting identical configuration is a no-op write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
	pub config_id: String,
	pub arn: String,
	pub hash: String,
	pub current: bool,
	pub r#type: ResourceType,
	pub attrs: Value,
	#[serde(with = "time::serde::rfc3339")]
	pub collected_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSignatures {
	pub topology_signature: String,
	#[serde(default)]
	pub resource_types: Vec<ResourceType>,
	#[serde(default)]
	pub relationship_types: Vec<Relation>,
	#[serde(default)]
	pub depth: u32,
}

/// A reusable incident signature, written by the curation path and only read
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
	pub pattern_id: String,
	pub title: String,
	#[serde(default)]
	pub tags: Vec<String>,
	pub signatures: PatternSignatures,
	#[serde(default)]
	pub playbook_steps: Vec<String>,
	#[serde(default)]
	pub popularity: f32,
	#[serde(default)]
	pub match_count: u32,
}

/// A closed investigation record, correlated against live subgraphs by node
/// intersection within a recency window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
	pub incident_id: String,
	#[serde(default)]
	pub nodes: Vec<String>,
	pub root_cause: String,
	#[serde(default)]
	pub signals: Vec<String>,
	pub fix: String,
	#[serde(default)]
	pub pattern_ids: Vec<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPattern {
	pub pattern: Pattern,
	pub score: f32,
}

/// The read-only composite handed back to the reasoning layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGraphResult {
	pub anchor_arn: String,
	pub focus_node: Option<GraphNode>,
	pub subgraph: Subgraph,
	pub observability: BTreeMap<String, ObservabilityPointer>,
	pub config_diff: Vec<ConfigSnapshot>,
	pub patterns: Vec<RankedPattern>,
	pub related_incidents: Vec<Incident>,
}

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InvestigationOutcome {
	Resolved,
	Partial,
	Unresolved,
}

/// A past-investigation summary from the separate similarity corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationSummary {
	pub investigation_id: String,
	pub error_message: String,
	pub root_cause_summary: String,
	pub resource_name: String,
	pub outcome: InvestigationOutcome,
	pub quality: f32,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
