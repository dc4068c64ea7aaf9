//! Graph construction from raw telemetry. Extraction is pure (payload in,
//! delta out); persistence goes through `upsert_delta`, which merges with what
//! the store already holds so repeated observations converge instead of
//! duplicating.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use faultline_domain::{
	ConfigSnapshot, EvidenceSource, GraphEdge, GraphNode, ObservabilityHints,
	ObservabilityPointer, Relation, ResourceType, arn, classify, confidence, hash,
};

use crate::{FaultlineService, Result};

/// One distributed trace as delivered by the telemetry collaborator: ordered
/// segments whose bodies arrive as JSON strings still needing a parse.
#[derive(Debug, Clone, Deserialize)]
pub struct TracePayload {
	pub trace_id: String,
	pub segments: Vec<RawSegment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
	pub id: String,
	pub document: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDocument {
	pub name: String,
	#[serde(default)]
	pub origin: Option<String>,
	#[serde(default)]
	pub resource_arn: Option<String>,
	#[serde(default)]
	pub aws: Option<AwsMeta>,
	#[serde(default)]
	pub fault: bool,
	#[serde(default)]
	pub error: bool,
	#[serde(default)]
	pub subsegments: Vec<SubsegmentDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsegmentDocument {
	pub name: String,
	#[serde(default)]
	pub namespace: Option<String>,
	#[serde(default)]
	pub resource_arn: Option<String>,
	#[serde(default)]
	pub aws: Option<AwsMeta>,
	#[serde(default)]
	pub fault: bool,
	#[serde(default)]
	pub error: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsMeta {
	#[serde(default)]
	pub account_id: Option<String>,
	#[serde(default)]
	pub region: Option<String>,
	#[serde(default)]
	pub operation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
	pub message: String,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

/// Candidate graph writes from one extraction run.
#[derive(Debug, Clone, Default)]
pub struct GraphDelta {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	pub pointers: Vec<ObservabilityPointer>,
}

/// Walks a trace's segments into nodes, edges, and observability pointers.
/// A segment whose document fails to parse is skipped with a warning; partial
/// extraction is success, not error.
pub fn extract_from_trace(payload: &TracePayload, now: OffsetDateTime) -> GraphDelta {
	let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();
	let mut edges: BTreeMap<String, GraphEdge> = BTreeMap::new();
	let mut pointers: Vec<ObservabilityPointer> = Vec::new();

	for segment in &payload.segments {
		let doc: SegmentDocument = match serde_json::from_str(&segment.document) {
			Ok(doc) => doc,
			Err(err) => {
				tracing::warn!(
					trace_id = %payload.trace_id,
					segment_id = %segment.id,
					error = %err,
					"Skipping unparseable trace segment.",
				);

				continue;
			},
		};
		let origin = doc.origin.as_deref().unwrap_or("");
		let (resource, name) =
			classify::classify_resource(&doc.name, origin, doc.resource_arn.as_deref());
		let meta = doc.aws.clone().unwrap_or_default();
		let Some(node) =
			build_node(resource, &name, doc.resource_arn.as_deref(), &meta, now)
		else {
			continue;
		};
		let parent_arn = node.arn.clone();

		pointers.push(pointer_for(&node, &payload.trace_id));
		nodes.entry(parent_arn.clone()).or_insert(node);

		for sub in &doc.subsegments {
			let namespace = sub.namespace.as_deref().unwrap_or("");
			let (child_resource, child_name) =
				classify::classify_resource(&sub.name, namespace, sub.resource_arn.as_deref());
			let child_meta = sub.aws.clone().unwrap_or_default();
			let child_meta = AwsMeta {
				account_id: child_meta.account_id.or(meta.account_id.clone()),
				region: child_meta.region.or(meta.region.clone()),
				operation: child_meta.operation,
			};
			// A child that resolves to no ARN-like identity carries nothing to
			// join on; drop it rather than fabricate a node.
			let Some(child_node) = build_node(
				child_resource,
				&child_name,
				sub.resource_arn.as_deref(),
				&child_meta,
				now,
			) else {
				continue;
			};
			let rel = classify::classify_relationship(&sub.name, child_meta.operation.as_deref());
			let edge = GraphEdge {
				edge_id: hash::edge_id(&parent_arn, rel, &child_node.arn),
				from_arn: parent_arn.clone(),
				to_arn: child_node.arn.clone(),
				rel,
				evidence_sources: [EvidenceSource::Trace].into(),
				confidence: confidence::trace_confidence(sub.fault, sub.error),
				first_seen: now,
				last_seen: now,
				account_id: child_node.account_id.clone(),
				region: child_node.region.clone(),
			};

			nodes.entry(child_node.arn.clone()).or_insert(child_node);
			edges
				.entry(edge.edge_id.clone())
				.and_modify(|existing| existing.merge_observation(&edge))
				.or_insert(edge);
		}
	}

	GraphDelta {
		nodes: nodes.into_values().collect(),
		edges: edges.into_values().collect(),
		pointers,
	}
}

/// Scans log messages for ARN-shaped substrings and turns each hit into one
/// low-confidence edge from the emitting resource. Messages without an ARN
/// yield nothing; multiple ARNs resolve to the first match.
pub fn extract_from_logs(entries: &[LogEntry], source_arn: &str) -> Vec<GraphEdge> {
	let mut edges: BTreeMap<String, GraphEdge> = BTreeMap::new();

	for entry in entries {
		let Some(target_arn) = arn::find_first_arn(&entry.message) else { continue };

		if target_arn == source_arn {
			continue;
		}

		let rel = classify::classify_relationship(&entry.message, None);
		let (account_id, region) = match arn::parse(target_arn) {
			Some(parts) => (parts.account_id, parts.region),
			None => (String::new(), String::new()),
		};
		let edge = GraphEdge {
			edge_id: hash::edge_id(source_arn, rel, target_arn),
			from_arn: source_arn.to_string(),
			to_arn: target_arn.to_string(),
			rel,
			evidence_sources: [EvidenceSource::Logs].into(),
			confidence: confidence::log_confidence(&entry.message),
			first_seen: entry.timestamp,
			last_seen: entry.timestamp,
			account_id,
			region,
		};

		edges
			.entry(edge.edge_id.clone())
			.and_modify(|existing| existing.merge_observation(&edge))
			.or_insert(edge);
	}

	edges.into_values().collect()
}

/// Normalizes a configuration payload into a content-addressed snapshot.
/// Key order in the source payload never changes the hash.
pub fn extract_from_config(
	attrs: &Value,
	resource_arn: &str,
	resource: ResourceType,
	now: OffsetDateTime,
) -> ConfigSnapshot {
	let fingerprint = hash::config_fingerprint(attrs);

	ConfigSnapshot {
		config_id: hash::config_id(resource_arn, &fingerprint),
		arn: resource_arn.to_string(),
		hash: fingerprint,
		current: true,
		r#type: resource,
		attrs: attrs.clone(),
		collected_at: now,
	}
}

fn build_node(
	resource: ResourceType,
	name: &str,
	resource_arn: Option<&str>,
	meta: &AwsMeta,
	now: OffsetDateTime,
) -> Option<GraphNode> {
	let region = meta.region.clone().unwrap_or_default();
	let account_id = meta.account_id.clone().unwrap_or_default();
	let node_arn = match resource_arn.filter(|candidate| arn::is_arn(candidate)) {
		Some(existing) => existing.to_string(),
		None => {
			if resource == ResourceType::Unknown || name.trim().is_empty() {
				return None;
			}

			arn::synthesize(resource, &region, &account_id, name)
		},
	};
	let (account_id, region) = match arn::parse(&node_arn) {
		Some(parts) if !parts.account_id.is_empty() || !parts.region.is_empty() => {
			(parts.account_id, parts.region)
		},
		_ => (account_id, region),
	};

	Some(GraphNode {
		arn: node_arn,
		r#type: resource,
		name: name.to_string(),
		account_id,
		region,
		tags: BTreeMap::new(),
		observability: ObservabilityHints {
			log_group: log_group_for(resource, name),
			trace_name: Some(name.to_string()),
			metric_namespace: metric_namespace_for(resource).map(str::to_string),
		},
		config_fingerprint: None,
		versions: 0,
		last_seen: now,
		stale: false,
	})
}

fn pointer_for(node: &GraphNode, trace_id: &str) -> ObservabilityPointer {
	ObservabilityPointer {
		arn: node.arn.clone(),
		log_group: node.observability.log_group.clone(),
		trace_name: Some(node.name.clone()),
		recent_trace_ids: vec![trace_id.to_string()],
		metric_namespace: node.observability.metric_namespace.clone(),
		metric_names: Vec::new(),
	}
}

fn log_group_for(resource: ResourceType, name: &str) -> Option<String> {
	match resource {
		ResourceType::Lambda => Some(format!("/aws/lambda/{name}")),
		ResourceType::Apigateway => Some(format!("/aws/apigateway/{name}")),
		ResourceType::Stepfunctions => Some(format!("/aws/states/{name}")),
		_ => None,
	}
}

fn metric_namespace_for(resource: ResourceType) -> Option<&'static str> {
	match resource {
		ResourceType::Lambda => Some("AWS/Lambda"),
		ResourceType::Dynamodb => Some("AWS/DynamoDB"),
		ResourceType::S3 => Some("AWS/S3"),
		ResourceType::Sns => Some("AWS/SNS"),
		ResourceType::Sqs => Some("AWS/SQS"),
		ResourceType::Apigateway => Some("AWS/ApiGateway"),
		ResourceType::Stepfunctions => Some("AWS/States"),
		ResourceType::Eventbridge => Some("AWS/Events"),
		ResourceType::Kinesis => Some("AWS/Kinesis"),
		ResourceType::Rds => Some("AWS/RDS"),
		ResourceType::Unknown => None,
	}
}

impl FaultlineService {
	/// Extracts one trace and persists the delta.
	pub async fn ingest_trace(&self, payload: &TracePayload) -> Result<GraphDelta> {
		let delta = extract_from_trace(payload, OffsetDateTime::now_utc());

		tracing::debug!(
			trace_id = %payload.trace_id,
			nodes = delta.nodes.len(),
			edges = delta.edges.len(),
			"Extracted trace delta.",
		);

		self.upsert_delta(&delta).await?;

		Ok(delta)
	}

	/// Extracts edges from a log batch attributed to `source_arn` and persists
	/// them.
	pub async fn ingest_logs(&self, source_arn: &str, entries: &[LogEntry]) -> Result<Vec<GraphEdge>> {
		if source_arn.trim().is_empty() {
			return Err(crate::Error::InvalidRequest {
				message: "Log ingestion requires a source ARN.".to_string(),
			});
		}

		let edges = extract_from_logs(entries, source_arn);
		let delta = GraphDelta { nodes: Vec::new(), edges: edges.clone(), pointers: Vec::new() };

		self.upsert_delta(&delta).await?;

		Ok(edges)
	}

	/// Captures a configuration snapshot. Identical configuration is a no-op;
	/// changed configuration demotes the previous `current` snapshot and bumps
	/// the node's fingerprint and version count.
	pub async fn ingest_config(
		&self,
		resource_arn: &str,
		resource: ResourceType,
		attrs: &Value,
	) -> Result<ConfigSnapshot> {
		let now = OffsetDateTime::now_utc();
		let snapshot = extract_from_config(attrs, resource_arn, resource, now);
		let indices = self.store.indices.clone();
		let existing = self
			.store
			.search_or_empty(
				&indices.config_snapshots,
				faultline_storage::query::search_body(
					faultline_storage::query::bool_query(
						vec![
							faultline_storage::query::term("arn", resource_arn),
							serde_json::json!({ "term": { "current": true } }),
						],
						Vec::new(),
					),
					1,
				),
			)
			.await;
		let previous: Option<ConfigSnapshot> = existing
			.into_iter()
			.next()
			.and_then(|hit| serde_json::from_value(hit.source).ok());

		if previous.as_ref().is_some_and(|prev| prev.hash == snapshot.hash) {
			// Content-addressed: same attributes, same id, nothing to write.
			return Ok(snapshot);
		}

		let mut docs = vec![(snapshot.config_id.clone(), serde_json::to_value(&snapshot)?)];

		if let Some(mut prev) = previous {
			prev.current = false;

			docs.push((prev.config_id.clone(), serde_json::to_value(&prev)?));
		}

		self.store.upsert_quietly(&indices.config_snapshots, &docs).await;
		self.bump_node_fingerprint(resource_arn, &snapshot.hash, now).await?;

		Ok(snapshot)
	}

	/// Merge-on-write persistence for a delta: existing edges widen their
	/// evidence and keep max confidence, pointers merge field-wise, nodes keep
	/// their accumulated fingerprint history. Deterministic ids make the whole
	/// write idempotent, so concurrent builder runs converge without locks.
	pub async fn upsert_delta(&self, delta: &GraphDelta) -> Result<()> {
		let indices = self.store.indices.clone();

		if !delta.edges.is_empty() {
			let ids: Vec<String> = delta.edges.iter().map(|edge| edge.edge_id.clone()).collect();
			let existing = self.store.multi_get_or_empty(&indices.edges, &ids).await;
			let existing: BTreeMap<String, GraphEdge> = existing
				.into_iter()
				.filter_map(|(id, doc)| {
					serde_json::from_value::<GraphEdge>(doc).ok().map(|edge| (id, edge))
				})
				.collect();
			let mut docs = Vec::new();

			for edge in &delta.edges {
				let merged = match existing.get(&edge.edge_id) {
					Some(stored) => {
						let mut merged = stored.clone();

						merged.merge_observation(edge);
						merged
					},
					None => edge.clone(),
				};

				docs.push((merged.edge_id.clone(), serde_json::to_value(&merged)?));
			}

			self.store.upsert_quietly(&indices.edges, &docs).await;
		}
		if !delta.nodes.is_empty() {
			let ids: Vec<String> = delta.nodes.iter().map(|node| node.arn.clone()).collect();
			let existing = self.store.multi_get_or_empty(&indices.nodes, &ids).await;
			let existing: BTreeMap<String, GraphNode> = existing
				.into_iter()
				.filter_map(|(id, doc)| {
					serde_json::from_value::<GraphNode>(doc).ok().map(|node| (id, node))
				})
				.collect();
			let mut docs = Vec::new();

			for node in &delta.nodes {
				let merged = match existing.get(&node.arn) {
					Some(stored) => merge_node(stored, node),
					None => node.clone(),
				};

				docs.push((merged.arn.clone(), serde_json::to_value(&merged)?));
			}

			self.store.upsert_quietly(&indices.nodes, &docs).await;
		}
		if !delta.pointers.is_empty() {
			let cap = self.cfg.retrieval.recent_trace_ids_cap as usize;
			let ids: Vec<String> =
				delta.pointers.iter().map(|pointer| pointer.arn.clone()).collect();
			let existing = self.store.multi_get_or_empty(&indices.pointers, &ids).await;
			let existing: BTreeMap<String, ObservabilityPointer> = existing
				.into_iter()
				.filter_map(|(id, doc)| {
					serde_json::from_value::<ObservabilityPointer>(doc)
						.ok()
						.map(|pointer| (id, pointer))
				})
				.collect();
			let mut docs = Vec::new();

			for pointer in &delta.pointers {
				let merged = match existing.get(&pointer.arn) {
					Some(stored) => {
						let mut merged = stored.clone();

						merged.merge_from(pointer, cap);
						merged
					},
					None => {
						let mut fresh = pointer.clone();

						fresh.recent_trace_ids.truncate(cap);
						fresh
					},
				};

				docs.push((merged.arn.clone(), serde_json::to_value(&merged)?));
			}

			self.store.upsert_quietly(&indices.pointers, &docs).await;
		}

		Ok(())
	}

	async fn bump_node_fingerprint(
		&self,
		resource_arn: &str,
		fingerprint: &str,
		now: OffsetDateTime,
	) -> Result<()> {
		let indices = self.store.indices.clone();
		let ids = vec![resource_arn.to_string()];
		let existing = self.store.multi_get_or_empty(&indices.nodes, &ids).await;
		let Some(mut node) = existing
			.into_iter()
			.next()
			.and_then(|(_, doc)| serde_json::from_value::<GraphNode>(doc).ok())
		else {
			return Ok(());
		};

		if node.config_fingerprint.as_deref() != Some(fingerprint) {
			node.config_fingerprint = Some(fingerprint.to_string());
			node.versions += 1;
			node.last_seen = now;

			let docs = vec![(node.arn.clone(), serde_json::to_value(&node)?)];

			self.store.upsert_quietly(&indices.nodes, &docs).await;
		}

		Ok(())
	}
}

fn merge_node(stored: &GraphNode, fresh: &GraphNode) -> GraphNode {
	let mut merged = fresh.clone();

	for (key, value) in &stored.tags {
		merged.tags.entry(key.clone()).or_insert(value.clone());
	}

	if merged.observability.log_group.is_none() {
		merged.observability.log_group = stored.observability.log_group.clone();
	}
	if merged.observability.trace_name.is_none() {
		merged.observability.trace_name = stored.observability.trace_name.clone();
	}
	if merged.observability.metric_namespace.is_none() {
		merged.observability.metric_namespace = stored.observability.metric_namespace.clone();
	}
	if merged.config_fingerprint.is_none() {
		merged.config_fingerprint = stored.config_fingerprint.clone();
		merged.versions = merged.versions.max(stored.versions);
	}

	merged.last_seen = merged.last_seen.max(stored.last_seen);
	merged.stale = false;

	merged
}
