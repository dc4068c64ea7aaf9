#![allow(dead_code)]

use std::sync::Arc;

use time::OffsetDateTime;

use faultline_config::{Config, SearchEngine, Service, Storage};
use faultline_domain::{
	EvidenceSource, GraphEdge, GraphNode, ObservabilityHints, ObservabilityPointer, Relation,
	ResourceType, hash,
};
use faultline_service::FaultlineService;
use faultline_storage::SearchBackend;
use faultline_testkit::MemoryBackend;

pub const LAMBDA_ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:checkout";
pub const TABLE_ARN: &str = "arn:aws:dynamodb:eu-west-1:123456789012:table/orders";
pub const TOPIC_ARN: &str = "arn:aws:sns:eu-west-1:123456789012:my-topic";
pub const QUEUE_ARN: &str = "arn:aws:sqs:eu-west-1:123456789012:orders-queue";

pub fn config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			search: SearchEngine {
				url: "http://localhost:9200".to_string(),
				index_prefix: "faultline".to_string(),
				timeout_ms: 2_000,
			},
		},
		retrieval: Default::default(),
		patterns: Default::default(),
		similarity: Default::default(),
	}
}

pub fn service(backend: Arc<dyn SearchBackend>) -> FaultlineService {
	FaultlineService::new(config(), backend)
}

pub fn ts() -> OffsetDateTime {
	OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp must be valid")
}

pub fn node(arn: &str, resource: ResourceType, name: &str) -> GraphNode {
	GraphNode {
		arn: arn.to_string(),
		r#type: resource,
		name: name.to_string(),
		account_id: "123456789012".to_string(),
		region: "eu-west-1".to_string(),
		tags: Default::default(),
		observability: ObservabilityHints::default(),
		config_fingerprint: None,
		versions: 0,
		last_seen: ts(),
		stale: false,
	}
}

pub fn edge(from: &str, rel: Relation, to: &str) -> GraphEdge {
	GraphEdge {
		edge_id: hash::edge_id(from, rel, to),
		from_arn: from.to_string(),
		to_arn: to.to_string(),
		rel,
		evidence_sources: [EvidenceSource::Trace].into(),
		confidence: 0.8,
		first_seen: ts(),
		last_seen: ts(),
		account_id: "123456789012".to_string(),
		region: "eu-west-1".to_string(),
	}
}

pub fn pointer(arn: &str, trace_ids: &[&str]) -> ObservabilityPointer {
	ObservabilityPointer {
		arn: arn.to_string(),
		log_group: Some("/aws/lambda/checkout".to_string()),
		trace_name: Some("checkout".to_string()),
		recent_trace_ids: trace_ids.iter().map(|id| id.to_string()).collect(),
		metric_namespace: Some("AWS/Lambda".to_string()),
		metric_names: Vec::new(),
	}
}

pub fn insert<T: serde::Serialize>(backend: &MemoryBackend, index: &str, id: &str, doc: &T) {
	let value = serde_json::to_value(doc).expect("document must serialize");

	backend.insert(index, id, value);
}

/// Seeds a three-hop chain lambda -> table -> topic -> queue with full node
/// records and a pointer on the lambda.
pub fn seed_chain(backend: &MemoryBackend) {
	let indices = faultline_storage::Indices::new("faultline");

	for (arn, resource, name) in [
		(LAMBDA_ARN, ResourceType::Lambda, "checkout"),
		(TABLE_ARN, ResourceType::Dynamodb, "orders"),
		(TOPIC_ARN, ResourceType::Sns, "my-topic"),
		(QUEUE_ARN, ResourceType::Sqs, "orders-queue"),
	] {
		insert(backend, &indices.nodes, arn, &node(arn, resource, name));
	}

	for (from, rel, to) in [
		(LAMBDA_ARN, Relation::Reads, TABLE_ARN),
		(TABLE_ARN, Relation::Publishes, TOPIC_ARN),
		(TOPIC_ARN, Relation::Triggers, QUEUE_ARN),
	] {
		let edge = edge(from, rel, to);

		insert(backend, &indices.edges, &edge.edge_id.clone(), &edge);
	}

	insert(backend, &indices.pointers, LAMBDA_ARN, &pointer(LAMBDA_ARN, &["trace-123"]));
}
