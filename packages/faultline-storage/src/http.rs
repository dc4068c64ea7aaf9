use std::time::Duration as StdDuration;

use reqwest::Client;
use serde_json::Value;

use crate::{
	BoxFuture, Error, Result,
	backend::{SearchBackend, SearchHit},
};

/// HTTP client for an OpenSearch-compatible engine. Built once by the caller
/// and passed into every component; timeouts are per-call and short, with no
/// retry loop — a timed-out call surfaces as an error for the degrade wrapper
/// to absorb.
pub struct HttpSearchBackend {
	client: Client,
	base_url: String,
}
impl HttpSearchBackend {
	pub fn new(cfg: &faultline_config::SearchEngine) -> Result<Self> {
		let client =
			Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, base_url: cfg.url.trim_end_matches('/').to_string() })
	}

	async fn ensure_index_inner(&self, index: &str) -> Result<()> {
		let url = format!("{}/{index}", self.base_url);
		let res = self.client.put(&url).json(&serde_json::json!({})).send().await?;
		let status = res.status();

		if status.is_success() {
			return Ok(());
		}

		let body = res.text().await.unwrap_or_default();

		// Concurrent creators race; an existing index is the desired state.
		if body.contains("resource_already_exists_exception") {
			return Ok(());
		}

		Err(Error::Status { status: status.as_u16(), body })
	}

	async fn bulk_upsert_inner(&self, index: &str, docs: &[(String, Value)]) -> Result<()> {
		if docs.is_empty() {
			return Ok(());
		}

		let mut body = String::new();

		for (id, doc) in docs {
			let action = serde_json::json!({ "index": { "_index": index, "_id": id } });

			body.push_str(&action.to_string());
			body.push('\n');
			body.push_str(&doc.to_string());
			body.push('\n');
		}

		let url = format!("{}/_bulk", self.base_url);
		let res = self
			.client
			.post(&url)
			.header("content-type", "application/x-ndjson")
			.body(body)
			.send()
			.await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status: status.as_u16(), body });
		}

		let json: Value = res.json().await?;

		if json.get("errors").and_then(Value::as_bool).unwrap_or(false) {
			return Err(Error::Status {
				status: status.as_u16(),
				body: "Bulk response reported item errors.".to_string(),
			});
		}

		Ok(())
	}

	async fn multi_get_inner(&self, index: &str, ids: &[String]) -> Result<Vec<(String, Value)>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let url = format!("{}/{index}/_mget", self.base_url);
		let res =
			self.client.post(&url).json(&serde_json::json!({ "ids": ids })).send().await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status: status.as_u16(), body });
		}

		let json: Value = res.json().await?;
		let docs = json
			.get("docs")
			.and_then(Value::as_array)
			.ok_or_else(|| Error::InvalidArgument("Mget response is missing docs.".to_string()))?;
		let mut out = Vec::new();

		for doc in docs {
			if !doc.get("found").and_then(Value::as_bool).unwrap_or(false) {
				continue;
			}

			let Some(id) = doc.get("_id").and_then(Value::as_str) else { continue };
			let Some(source) = doc.get("_source") else { continue };

			out.push((id.to_string(), source.clone()));
		}

		Ok(out)
	}

	async fn search_inner(&self, index: &str, body: Value) -> Result<Vec<SearchHit>> {
		let url = format!("{}/{index}/_search", self.base_url);
		let res = self.client.post(&url).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::Status { status: status.as_u16(), body });
		}

		let json: Value = res.json().await?;
		let hits = json
			.pointer("/hits/hits")
			.and_then(Value::as_array)
			.ok_or_else(|| Error::InvalidArgument("Search response is missing hits.".to_string()))?;
		let mut out = Vec::new();

		for hit in hits {
			let Some(id) = hit.get("_id").and_then(Value::as_str) else { continue };
			let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
			let source = hit.get("_source").cloned().unwrap_or(Value::Null);

			out.push(SearchHit { id: id.to_string(), score, source });
		}

		Ok(out)
	}
}

impl SearchBackend for HttpSearchBackend {
	fn ensure_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.ensure_index_inner(index))
	}

	fn bulk_upsert<'a>(
		&'a self,
		index: &'a str,
		docs: &'a [(String, Value)],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.bulk_upsert_inner(index, docs))
	}

	fn multi_get<'a>(
		&'a self,
		index: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<(String, Value)>>> {
		Box::pin(self.multi_get_inner(index, ids))
	}

	fn search<'a>(&'a self, index: &'a str, body: Value) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(self.search_inner(index, body))
	}
}
