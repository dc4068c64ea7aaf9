//! Anchor-centered context retrieval. One request is a short pipeline: resolve
//! the seed to an anchor ARN, expand a bounded k-hop subgraph, hydrate nodes,
//! then fan out for pointers, config history, patterns, and recent incidents.
//! Traversal rounds are sequential (each frontier depends on the last); the
//! fan-out is concurrent. Every remote call degrades to empty on failure, so a
//! resolved seed always yields a composite result, just possibly an emptier
//! one.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};

use faultline_domain::{
	ConfigSnapshot, GraphEdge, GraphNode, Incident, ObservabilityPointer, Pattern, RankedPattern,
	SubGraphResult, Subgraph, arn,
};
use faultline_storage::query;

use crate::{FaultlineService, patterns};

impl FaultlineService {
	/// Resolves `seed` and assembles the read-only context composite. An
	/// unresolvable seed is a valid terminal state, not an error.
	pub async fn retrieve_context(&self, seed: &str) -> Option<SubGraphResult> {
		let anchor = self.resolve_seed(seed).await?;
		let edges = self.traverse(&anchor).await;
		let nodes = self.hydrate_nodes(&anchor, &edges).await;
		let subgraph = Subgraph { nodes, edges };
		let shape = patterns::subgraph_shape(&subgraph);
		let subgraph_arns: Vec<String> = subgraph_arns(&anchor, &subgraph);
		let (observability, config_diff, ranked, related_incidents) = tokio::join!(
			self.fetch_pointer(&anchor),
			self.fetch_config_history(&anchor),
			self.fetch_patterns(&shape),
			self.fetch_incidents(&subgraph_arns),
		);
		let focus_node = subgraph.nodes.iter().find(|node| node.arn == anchor).cloned();

		Some(SubGraphResult {
			anchor_arn: anchor,
			focus_node,
			subgraph,
			observability,
			config_diff,
			patterns: ranked,
			related_incidents,
		})
	}

	/// An ARN-shaped seed is its own anchor; anything else is treated as a
	/// trace id and matched against the pointers' recent-trace-id lists.
	async fn resolve_seed(&self, seed: &str) -> Option<String> {
		let seed = seed.trim();

		if seed.is_empty() {
			return None;
		}
		if arn::is_arn(seed) {
			return Some(seed.to_string());
		}

		let body = query::search_body(
			query::bool_query(vec![query::term("recent_trace_ids", seed)], Vec::new()),
			1,
		);
		let hits = self.store.search_or_empty(&self.store.indices.pointers, body).await;

		hits.into_iter()
			.next()
			.and_then(|hit| hit.source.get("arn").and_then(Value::as_str).map(str::to_string))
	}

	/// Breadth-first edge expansion, hard-bounded to `k_hop` rounds. The bound
	/// keeps subgraphs small and store load predictable regardless of how
	/// dense the graph is; a non-empty frontier after the last round is
	/// intentionally abandoned.
	async fn traverse(&self, anchor: &str) -> Vec<GraphEdge> {
		let max_per_hop = self.cfg.retrieval.max_edges_per_hop as usize;
		let mut visited: BTreeSet<String> = BTreeSet::from([anchor.to_string()]);
		let mut frontier: Vec<String> = vec![anchor.to_string()];
		let mut edges: BTreeMap<String, GraphEdge> = BTreeMap::new();

		for _ in 0..self.cfg.retrieval.k_hop {
			if frontier.is_empty() {
				break;
			}

			let body = query::search_body(
				query::bool_query(
					Vec::new(),
					vec![
						query::terms("from_arn", &frontier),
						query::terms("to_arn", &frontier),
					],
				),
				max_per_hop,
			);
			let hits = self.store.search_or_empty(&self.store.indices.edges, body).await;
			let mut next_frontier: Vec<String> = Vec::new();

			for hit in hits {
				let edge: GraphEdge = match serde_json::from_value(hit.source) {
					Ok(edge) => edge,
					Err(err) => {
						tracing::warn!(edge_id = %hit.id, error = %err, "Skipping malformed edge document.");

						continue;
					},
				};

				for endpoint in [&edge.from_arn, &edge.to_arn] {
					if visited.insert(endpoint.clone()) {
						next_frontier.push(endpoint.clone());
					}
				}

				edges.entry(edge.edge_id.clone()).or_insert(edge);
			}

			frontier = next_frontier;
		}

		edges.into_values().collect()
	}

	/// Batch-fetches node records for every ARN the edge set touches plus the
	/// anchor. ARNs with no stored node are dropped silently; their edges stay.
	async fn hydrate_nodes(&self, anchor: &str, edges: &[GraphEdge]) -> Vec<GraphNode> {
		let mut ids: BTreeSet<String> = BTreeSet::from([anchor.to_string()]);

		for edge in edges {
			ids.insert(edge.from_arn.clone());
			ids.insert(edge.to_arn.clone());
		}

		let ids: Vec<String> = ids.into_iter().collect();
		let docs = self.store.multi_get_or_empty(&self.store.indices.nodes, &ids).await;

		docs.into_iter()
			.filter_map(|(_, doc)| serde_json::from_value::<GraphNode>(doc).ok())
			.collect()
	}

	/// Pointer lookup is anchor-scoped: it answers "where do I look next for
	/// this resource", not for the whole subgraph.
	async fn fetch_pointer(&self, anchor: &str) -> BTreeMap<String, ObservabilityPointer> {
		let ids = vec![anchor.to_string()];
		let docs = self.store.multi_get_or_empty(&self.store.indices.pointers, &ids).await;
		let mut out = BTreeMap::new();

		for (_, doc) in docs {
			if let Ok(pointer) = serde_json::from_value::<ObservabilityPointer>(doc) {
				out.insert(pointer.arn.clone(), pointer);
			}
		}

		out
	}

	async fn fetch_config_history(&self, anchor: &str) -> Vec<ConfigSnapshot> {
		let body = query::search_body_sorted(
			query::bool_query(vec![query::term("arn", anchor)], Vec::new()),
			50,
			"collected_at",
			true,
		);
		let hits =
			self.store.search_or_empty(&self.store.indices.config_snapshots, body).await;

		hits.into_iter()
			.filter_map(|hit| serde_json::from_value::<ConfigSnapshot>(hit.source).ok())
			.collect()
	}

	async fn fetch_patterns(&self, shape: &patterns::SubgraphShape) -> Vec<RankedPattern> {
		if shape.resource_types.is_empty() {
			return Vec::new();
		}

		let type_names: Vec<String> = shape
			.resource_types
			.iter()
			.map(|resource| resource.as_str().to_string())
			.collect();
		let body = query::search_body(
			query::bool_query(
				Vec::new(),
				vec![
					query::terms("tags", &type_names),
					query::terms("signatures.resource_types", &type_names),
				],
			),
			50,
		);
		let hits = self.store.search_or_empty(&self.store.indices.patterns, body).await;
		let candidates: Vec<Pattern> = hits
			.into_iter()
			.filter_map(|hit| serde_json::from_value(hit.source).ok())
			.collect();

		patterns::rank_patterns(&self.cfg.patterns, shape, candidates)
	}

	/// Recent incidents touching any node of the live subgraph, bounded by the
	/// configured recency window.
	async fn fetch_incidents(&self, subgraph_arns: &[String]) -> Vec<Incident> {
		if subgraph_arns.is_empty() {
			return Vec::new();
		}

		let window_start = OffsetDateTime::now_utc()
			- Duration::days(self.cfg.retrieval.incident_window_days);
		let Ok(window_start) = window_start.format(&Rfc3339) else { return Vec::new() };
		let body = query::search_body(
			query::bool_query(
				vec![query::range_gte("created_at", &window_start)],
				vec![query::terms("nodes", subgraph_arns)],
			),
			20,
		);
		let hits = self.store.search_or_empty(&self.store.indices.incidents, body).await;

		hits.into_iter()
			.filter_map(|hit| serde_json::from_value::<Incident>(hit.source).ok())
			.collect()
	}
}

fn subgraph_arns(anchor: &str, subgraph: &Subgraph) -> Vec<String> {
	let mut arns: BTreeSet<String> = BTreeSet::from([anchor.to_string()]);

	for edge in &subgraph.edges {
		arns.insert(edge.from_arn.clone());
		arns.insert(edge.to_arn.clone());
	}

	arns.into_iter().collect()
}
