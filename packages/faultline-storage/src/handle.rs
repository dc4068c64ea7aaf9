use std::sync::Arc;

use serde_json::Value;

use crate::{
	backend::{SearchBackend, SearchHit},
	indices::Indices,
};

/// The single place where remote-store failures turn into empty results. Every
/// read and write from the core goes through these methods, so the
/// degrade-on-failure policy is enforced here rather than at each call site.
/// A timed-out or refused call costs the caller one empty field, never an
/// aborted investigation.
#[derive(Clone)]
pub struct StoreHandle {
	backend: Arc<dyn SearchBackend>,
	pub indices: Indices,
}
impl StoreHandle {
	pub fn new(backend: Arc<dyn SearchBackend>, indices: Indices) -> Self {
		Self { backend, indices }
	}

	pub async fn ensure_indices(&self) {
		for index in self.indices.all() {
			if let Err(err) = self.backend.ensure_index(index).await {
				tracing::warn!(index, error = %err, "Failed to ensure index; continuing.");
			}
		}
	}

	pub async fn search_or_empty(&self, index: &str, body: Value) -> Vec<SearchHit> {
		match self.backend.search(index, body).await {
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(index, error = %err, "Search degraded to empty result.");

				Vec::new()
			},
		}
	}

	pub async fn multi_get_or_empty(&self, index: &str, ids: &[String]) -> Vec<(String, Value)> {
		match self.backend.multi_get(index, ids).await {
			Ok(docs) => docs,
			Err(err) => {
				tracing::warn!(index, error = %err, "Multi-get degraded to empty result.");

				Vec::new()
			},
		}
	}

	/// Best-effort write; a failed upsert is logged and dropped. Ids are
	/// deterministic and writes merge-on-write, so the next builder run
	/// converges to the same documents.
	pub async fn upsert_quietly(&self, index: &str, docs: &[(String, Value)]) {
		if docs.is_empty() {
			return;
		}
		if let Err(err) = self.backend.bulk_upsert(index, docs).await {
			tracing::warn!(index, count = docs.len(), error = %err, "Bulk upsert dropped.");
		}
	}
}
