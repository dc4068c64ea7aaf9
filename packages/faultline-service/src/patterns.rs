//! Structural pattern matching: recall by tag overlap happens remotely, the
//! precision ranking happens here. Exact topology-signature matches dominate,
//! then resource/relationship type-set overlap, then tag overlap, with
//! popularity as the tiebreak. The weights are tunable; the ordering they
//! induce is the contract.

use std::collections::BTreeSet;

use faultline_config::PatternRanking;
use faultline_domain::{Pattern, RankedPattern, Relation, ResourceType, Subgraph, hash};

#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphShape {
	pub topology_signature: String,
	pub resource_types: Vec<ResourceType>,
	pub relationship_types: Vec<Relation>,
}

/// The structural summary a pattern is matched against: node-type and
/// edge-relation multisets plus their order-independent signature.
pub fn subgraph_shape(subgraph: &Subgraph) -> SubgraphShape {
	let node_types: Vec<ResourceType> = subgraph.nodes.iter().map(|node| node.r#type).collect();
	let relations: Vec<Relation> = subgraph.edges.iter().map(|edge| edge.rel).collect();

	SubgraphShape {
		topology_signature: hash::topology_signature(&node_types, &relations),
		resource_types: node_types,
		relationship_types: relations,
	}
}

pub fn rank_patterns(
	cfg: &PatternRanking,
	shape: &SubgraphShape,
	candidates: Vec<Pattern>,
) -> Vec<RankedPattern> {
	let resource_set: BTreeSet<ResourceType> = shape.resource_types.iter().copied().collect();
	let relation_set: BTreeSet<Relation> = shape.relationship_types.iter().copied().collect();
	let tag_set: BTreeSet<String> =
		resource_set.iter().map(|resource| resource.as_str().to_string()).collect();
	let mut ranked: Vec<RankedPattern> = candidates
		.into_iter()
		.map(|pattern| {
			let score = score_pattern(cfg, shape, &resource_set, &relation_set, &tag_set, &pattern);

			RankedPattern { pattern, score }
		})
		.collect();

	ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

	ranked
}

fn score_pattern(
	cfg: &PatternRanking,
	shape: &SubgraphShape,
	resource_set: &BTreeSet<ResourceType>,
	relation_set: &BTreeSet<Relation>,
	tag_set: &BTreeSet<String>,
	pattern: &Pattern,
) -> f32 {
	let mut score = 0.0;

	if pattern.signatures.topology_signature == shape.topology_signature {
		score += cfg.signature_match_weight;
	}

	let pattern_resources: BTreeSet<ResourceType> =
		pattern.signatures.resource_types.iter().copied().collect();
	let pattern_relations: BTreeSet<Relation> =
		pattern.signatures.relationship_types.iter().copied().collect();
	let pattern_tags: BTreeSet<String> = pattern.tags.iter().cloned().collect();

	score += cfg.resource_overlap_weight * jaccard(resource_set, &pattern_resources);
	score += cfg.relationship_overlap_weight * jaccard(relation_set, &pattern_relations);
	score += cfg.tag_overlap_weight * jaccard(tag_set, &pattern_tags);
	score += cfg.popularity_weight * pattern.popularity;

	score
}

fn jaccard<T: Ord>(left: &BTreeSet<T>, right: &BTreeSet<T>) -> f32 {
	if left.is_empty() && right.is_empty() {
		return 0.0;
	}

	let intersection = left.intersection(right).count() as f32;
	let union = left.union(right).count() as f32;

	intersection / union
}
