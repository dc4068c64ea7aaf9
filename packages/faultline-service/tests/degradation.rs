//! Every remote failure must degrade to an empty slice of the composite
//! result, never to an error or a panic.

mod common;

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use faultline_domain::{Incident, Pattern, PatternSignatures, Relation, ResourceType};
use faultline_storage::Indices;
use faultline_testkit::{FlakyBackend, MemoryBackend};

use common::{LAMBDA_ARN, TABLE_ARN};

fn seeded_backend() -> MemoryBackend {
	let backend = MemoryBackend::new();
	let indices = Indices::new("faultline");

	common::seed_chain(&backend);

	let pattern = Pattern {
		pattern_id: "p-1".to_string(),
		title: "Lambda chain".to_string(),
		tags: vec!["lambda".to_string()],
		signatures: PatternSignatures {
			topology_signature: "sig".to_string(),
			resource_types: vec![ResourceType::Lambda],
			relationship_types: vec![Relation::Reads],
			depth: 1,
		},
		playbook_steps: Vec::new(),
		popularity: 1.0,
		match_count: 1,
	};
	let incident = Incident {
		incident_id: "inc-1".to_string(),
		nodes: vec![TABLE_ARN.to_string()],
		root_cause: "Throttling.".to_string(),
		signals: Vec::new(),
		fix: "Raised capacity.".to_string(),
		pattern_ids: Vec::new(),
		created_at: OffsetDateTime::now_utc() - Duration::days(2),
	};

	common::insert(&backend, &indices.patterns, "p-1", &pattern);
	common::insert(&backend, &indices.incidents, "inc-1", &incident);

	backend
}

async fn retrieve_with_failing(
	index: impl Fn(&Indices) -> String,
) -> faultline_domain::SubGraphResult {
	let indices = Indices::new("faultline");
	let backend = FlakyBackend::new(seeded_backend(), [index(&indices)]);
	let service = common::service(Arc::new(backend));

	service
		.retrieve_context(LAMBDA_ARN)
		.await
		.expect("A resolved seed must always yield a composite result.")
}

#[tokio::test]
async fn full_result_when_nothing_fails() {
	let service = common::service(Arc::new(seeded_backend()));
	let result = service.retrieve_context(LAMBDA_ARN).await.expect("Retrieval failed.");

	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.subgraph.nodes.is_empty());
	assert!(!result.observability.is_empty());
	assert!(!result.patterns.is_empty());
	assert!(!result.related_incidents.is_empty());
}

#[tokio::test]
async fn edge_index_failure_empties_the_subgraph_only() {
	let result = retrieve_with_failing(|indices| indices.edges.clone()).await;

	assert!(result.subgraph.edges.is_empty());
	// The anchor node itself still hydrates.
	assert_eq!(result.subgraph.nodes.len(), 1);
	assert!(!result.observability.is_empty());
	assert!(!result.patterns.is_empty());
}

#[tokio::test]
async fn node_index_failure_keeps_edges() {
	let result = retrieve_with_failing(|indices| indices.nodes.clone()).await;

	assert!(result.subgraph.nodes.is_empty());
	assert!(result.focus_node.is_none());
	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.related_incidents.is_empty());
}

#[tokio::test]
async fn pointer_index_failure_empties_observability_only() {
	let result = retrieve_with_failing(|indices| indices.pointers.clone()).await;

	assert!(result.observability.is_empty());
	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.patterns.is_empty());
}

#[tokio::test]
async fn config_index_failure_empties_the_history_only() {
	let result = retrieve_with_failing(|indices| indices.config_snapshots.clone()).await;

	assert!(result.config_diff.is_empty());
	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.related_incidents.is_empty());
}

#[tokio::test]
async fn pattern_index_failure_empties_patterns_only() {
	let result = retrieve_with_failing(|indices| indices.patterns.clone()).await;

	assert!(result.patterns.is_empty());
	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.related_incidents.is_empty());
}

#[tokio::test]
async fn incident_index_failure_empties_incidents_only() {
	let result = retrieve_with_failing(|indices| indices.incidents.clone()).await;

	assert!(result.related_incidents.is_empty());
	assert!(!result.subgraph.edges.is_empty());
	assert!(!result.patterns.is_empty());
}

#[tokio::test]
async fn pointer_failure_also_blocks_trace_seed_resolution() {
	let indices = Indices::new("faultline");
	let backend = FlakyBackend::new(seeded_backend(), [indices.pointers.clone()]);
	let service = common::service(Arc::new(backend));

	// The trace id can only resolve through the pointer index.
	assert!(service.retrieve_context("trace-123").await.is_none());
}
