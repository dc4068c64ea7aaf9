//! Past-investigation similarity search: cheap recall remotely, precise
//! ranking locally. The remote engine gets one boosted multi-field query and
//! returns an oversampled candidate set; the boosts applied here encode what
//! its relevance score cannot — proven outcomes, operator-judged quality, and
//! recency.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use faultline_config::Similarity;
use faultline_domain::{InvestigationOutcome, InvestigationSummary};
use faultline_storage::query;

use crate::FaultlineService;

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarQuery {
	pub query_text: String,
	#[serde(default)]
	pub resource_name: Option<String>,
	pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarResult {
	pub summary: InvestigationSummary,
	pub score: f32,
}

impl FaultlineService {
	pub async fn find_similar(&self, request: &SimilarQuery) -> Vec<SimilarResult> {
		if request.query_text.trim().is_empty() || request.limit == 0 {
			return Vec::new();
		}

		let cfg = &self.cfg.similarity;
		let oversample = request.limit * cfg.oversample_factor as usize;
		let body = query::search_body(
			query::bool_query(
				vec![serde_json::json!({
					"range": { "quality": { "gte": cfg.min_quality } }
				})],
				vec![query::multi_match(
					&request.query_text,
					&[
						("error_message", 3.0),
						("root_cause_summary", 2.0),
						("resource_name", 1.0),
					],
				)],
			),
			oversample,
		);
		let hits = self.store.search_or_empty(&self.store.indices.investigations, body).await;
		let now = OffsetDateTime::now_utc();
		let mut results: Vec<SimilarResult> = hits
			.into_iter()
			.filter_map(|hit| {
				let summary: InvestigationSummary = serde_json::from_value(hit.source).ok()?;
				let score =
					boost(cfg, request.resource_name.as_deref(), &summary, hit.score, now);

				Some(SimilarResult { summary, score })
			})
			.collect();

		results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		results.truncate(request.limit);

		results
	}
}

/// Multiplicative rerank over the remote relevance score. Each factor is
/// independent: resource-name hit, investigation outcome, quality, recency.
pub fn boost(
	cfg: &Similarity,
	resource_name: Option<&str>,
	summary: &InvestigationSummary,
	base_score: f32,
	now: OffsetDateTime,
) -> f32 {
	let mut score = base_score;

	if let Some(name) = resource_name {
		let name = name.to_lowercase();

		if !name.is_empty() && summary.resource_name.to_lowercase().contains(&name) {
			score *= cfg.name_match_boost;
		}
	}

	score *= match summary.outcome {
		InvestigationOutcome::Resolved => cfg.resolved_boost,
		InvestigationOutcome::Partial => cfg.partial_boost,
		InvestigationOutcome::Unresolved => 1.0,
	};
	score *= 0.5 + 0.5 * summary.quality.clamp(0.0, 1.0);

	let age_days = (now - summary.created_at).as_seconds_f32() / 86_400.0;

	if age_days < 7.0 {
		score *= cfg.recent_week_boost;
	} else if age_days < 30.0 {
		score *= cfg.recent_month_boost;
	}

	score
}
