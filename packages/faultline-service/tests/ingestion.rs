mod common;

use std::sync::Arc;

use serde_json::json;

use faultline_domain::{EvidenceSource, GraphEdge, GraphNode, Relation, ResourceType};
use faultline_service::{LogEntry, RawSegment, TracePayload};
use faultline_storage::Indices;
use faultline_testkit::MemoryBackend;

use common::{LAMBDA_ARN, TABLE_ARN, ts};

fn trace_payload() -> TracePayload {
	let document = json!({
		"name": "checkout",
		"origin": "AWS::Lambda::Function",
		"aws": { "account_id": "123456789012", "region": "eu-west-1" },
		"subsegments": [{
			"name": "DynamoDB",
			"namespace": "aws",
			"resource_arn": TABLE_ARN,
			"aws": { "operation": "GetItem" },
		}],
	});

	TracePayload {
		trace_id: "trace-123".to_string(),
		segments: vec![RawSegment { id: "seg-1".to_string(), document: document.to_string() }],
	}
}

#[tokio::test]
async fn trace_ingestion_persists_nodes_edges_and_pointers() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");

	service.ingest_trace(&trace_payload()).await.expect("Trace ingestion failed.");

	assert_eq!(backend.doc_count(&indices.nodes), 2);
	assert_eq!(backend.doc_count(&indices.edges), 1);
	assert_eq!(backend.doc_count(&indices.pointers), 1);

	let pointer =
		backend.doc(&indices.pointers, LAMBDA_ARN).expect("Lambda pointer must be stored.");

	assert_eq!(pointer["recent_trace_ids"][0], "trace-123");
}

#[tokio::test]
async fn repeated_ingestion_merges_instead_of_duplicating() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");

	service.ingest_trace(&trace_payload()).await.expect("First ingestion failed.");
	service.ingest_trace(&trace_payload()).await.expect("Second ingestion failed.");

	assert_eq!(backend.doc_count(&indices.edges), 1);
	assert_eq!(backend.doc_count(&indices.nodes), 2);
}

#[tokio::test]
async fn trace_and_log_evidence_merge_on_the_same_edge() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");

	service.ingest_trace(&trace_payload()).await.expect("Trace ingestion failed.");

	// Same (from, READS, to) triple observed through logs.
	let entries = vec![LogEntry {
		message: format!("GetItem against {TABLE_ARN} returned 200"),
		timestamp: ts(),
	}];

	service.ingest_logs(LAMBDA_ARN, &entries).await.expect("Log ingestion failed.");

	assert_eq!(backend.doc_count(&indices.edges), 1);

	let doc = backend
		.doc(&indices.edges, &faultline_domain::hash::edge_id(LAMBDA_ARN, Relation::Reads, TABLE_ARN))
		.expect("Merged edge must be stored.");
	let edge: GraphEdge = serde_json::from_value(doc).expect("Edge must deserialize.");

	assert!(edge.evidence_sources.contains(&EvidenceSource::Trace));
	assert!(edge.evidence_sources.contains(&EvidenceSource::Logs));
	// Trace confidence dominates the lower log score.
	assert!(edge.confidence >= 0.8);
}

#[tokio::test]
async fn pointer_trace_ids_stay_bounded_and_newest_first() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");
	let cap = service.cfg.retrieval.recent_trace_ids_cap as usize;

	for i in 0..(cap + 5) {
		let mut payload = trace_payload();

		payload.trace_id = format!("trace-{i}");

		service.ingest_trace(&payload).await.expect("Ingestion failed.");
	}

	let doc =
		backend.doc(&indices.pointers, LAMBDA_ARN).expect("Lambda pointer must be stored.");
	let ids = doc["recent_trace_ids"].as_array().expect("Trace ids must be an array.");

	assert_eq!(ids.len(), cap);
	assert_eq!(ids[0], format!("trace-{}", cap + 4));
}

#[tokio::test]
async fn identical_config_recollection_is_a_noop() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");
	let attrs = json!({ "memory": 512, "timeout": 30 });
	let permuted = json!({ "timeout": 30, "memory": 512 });

	let first = service
		.ingest_config(LAMBDA_ARN, ResourceType::Lambda, &attrs)
		.await
		.expect("First snapshot failed.");
	let second = service
		.ingest_config(LAMBDA_ARN, ResourceType::Lambda, &permuted)
		.await
		.expect("Second snapshot failed.");

	assert_eq!(first.config_id, second.config_id);
	assert_eq!(backend.doc_count(&indices.config_snapshots), 1);
}

#[tokio::test]
async fn changed_config_demotes_the_previous_current_snapshot() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend.clone());
	let indices = Indices::new("faultline");

	service.ingest_trace(&trace_payload()).await.expect("Trace ingestion failed.");

	let first = service
		.ingest_config(LAMBDA_ARN, ResourceType::Lambda, &json!({ "memory": 512 }))
		.await
		.expect("First snapshot failed.");
	let second = service
		.ingest_config(LAMBDA_ARN, ResourceType::Lambda, &json!({ "memory": 1024 }))
		.await
		.expect("Second snapshot failed.");

	assert_ne!(first.config_id, second.config_id);
	assert_eq!(backend.doc_count(&indices.config_snapshots), 2);

	let demoted = backend
		.doc(&indices.config_snapshots, &first.config_id)
		.expect("First snapshot must remain stored.");

	assert_eq!(demoted["current"], false);

	let node_doc = backend.doc(&indices.nodes, LAMBDA_ARN).expect("Node must be stored.");
	let node: GraphNode = serde_json::from_value(node_doc).expect("Node must deserialize.");

	assert_eq!(node.config_fingerprint.as_deref(), Some(second.hash.as_str()));
	assert_eq!(node.versions, 2);
}

#[tokio::test]
async fn empty_source_arn_is_rejected() {
	let backend = Arc::new(MemoryBackend::new());
	let service = common::service(backend);

	let result = service.ingest_logs("  ", &[]).await;

	assert!(result.is_err());
}
