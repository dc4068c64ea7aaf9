use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub patterns: PatternRanking,
	#[serde(default)]
	pub similarity: Similarity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub search: SearchEngine,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEngine {
	pub url: String,
	pub index_prefix: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Hard bound on traversal rounds; the subgraph never grows past this depth.
	pub k_hop: u32,
	pub max_edges_per_hop: u32,
	pub recent_trace_ids_cap: u32,
	pub incident_window_days: i64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { k_hop: 2, max_edges_per_hop: 200, recent_trace_ids_cap: 20, incident_window_days: 30 }
	}
}

/// Tunable rerank weights. The contract is the relative ordering they produce
/// (signature match > type overlap > tag overlap > popularity tiebreak), not the
/// literal values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternRanking {
	pub signature_match_weight: f32,
	pub resource_overlap_weight: f32,
	pub relationship_overlap_weight: f32,
	pub tag_overlap_weight: f32,
	pub popularity_weight: f32,
}
impl Default for PatternRanking {
	fn default() -> Self {
		Self {
			signature_match_weight: 10.0,
			resource_overlap_weight: 3.0,
			relationship_overlap_weight: 2.0,
			tag_overlap_weight: 1.0,
			popularity_weight: 0.01,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Similarity {
	pub oversample_factor: u32,
	pub min_quality: f32,
	pub name_match_boost: f32,
	pub resolved_boost: f32,
	pub partial_boost: f32,
	pub recent_week_boost: f32,
	pub recent_month_boost: f32,
}
impl Default for Similarity {
	fn default() -> Self {
		Self {
			oversample_factor: 4,
			min_quality: 0.3,
			name_match_boost: 1.5,
			resolved_boost: 1.3,
			partial_boost: 1.1,
			recent_week_boost: 1.2,
			recent_month_boost: 1.1,
		}
	}
}
