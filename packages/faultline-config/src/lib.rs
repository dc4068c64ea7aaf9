mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, PatternRanking, Retrieval, SearchEngine, Service, Similarity, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.search.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.search.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.search.index_prefix.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.search.index_prefix must be non-empty.".to_string(),
		});
	}
	if cfg.storage.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.k_hop == 0 {
		return Err(Error::Validation {
			message: "retrieval.k_hop must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_edges_per_hop == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_edges_per_hop must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.recent_trace_ids_cap == 0 {
		return Err(Error::Validation {
			message: "retrieval.recent_trace_ids_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.incident_window_days <= 0 {
		return Err(Error::Validation {
			message: "retrieval.incident_window_days must be greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("patterns.signature_match_weight", cfg.patterns.signature_match_weight),
		("patterns.resource_overlap_weight", cfg.patterns.resource_overlap_weight),
		("patterns.relationship_overlap_weight", cfg.patterns.relationship_overlap_weight),
		("patterns.tag_overlap_weight", cfg.patterns.tag_overlap_weight),
		("patterns.popularity_weight", cfg.patterns.popularity_weight),
		("similarity.name_match_boost", cfg.similarity.name_match_boost),
		("similarity.resolved_boost", cfg.similarity.resolved_boost),
		("similarity.partial_boost", cfg.similarity.partial_boost),
		("similarity.recent_week_boost", cfg.similarity.recent_week_boost),
		("similarity.recent_month_boost", cfg.similarity.recent_month_boost),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be zero or greater."),
			});
		}
	}

	if cfg.similarity.oversample_factor == 0 {
		return Err(Error::Validation {
			message: "similarity.oversample_factor must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.similarity.min_quality) {
		return Err(Error::Validation {
			message: "similarity.min_quality must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let url = cfg.storage.search.url.trim_end_matches('/').to_string();

	cfg.storage.search.url = url;
	cfg.storage.search.index_prefix = cfg.storage.search.index_prefix.trim().to_string();
}
