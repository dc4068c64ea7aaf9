//! In-process stand-ins for the remote search engine. `MemoryBackend`
//! implements enough of the query surface (term/terms/range filters, boolean
//! composition, naive boosted multi-field matching, sort, size) for the service
//! suites; `FlakyBackend` fails chosen indices to exercise the
//! degrade-on-failure boundary.

use std::{
	collections::{BTreeMap, HashMap, HashSet},
	sync::Mutex,
};

use serde_json::Value;

use faultline_storage::{BoxFuture, Error, Result, SearchBackend, SearchHit};

#[derive(Default)]
pub struct MemoryBackend {
	indices: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}
impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn doc(&self, index: &str, id: &str) -> Option<Value> {
		let indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());

		indices.get(index).and_then(|docs| docs.get(id)).cloned()
	}

	pub fn doc_count(&self, index: &str) -> usize {
		let indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());

		indices.get(index).map(BTreeMap::len).unwrap_or(0)
	}

	pub fn insert(&self, index: &str, id: &str, doc: Value) {
		let mut indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());

		indices.entry(index.to_string()).or_default().insert(id.to_string(), doc);
	}
}

impl SearchBackend for MemoryBackend {
	fn ensure_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());

			indices.entry(index.to_string()).or_default();

			Ok(())
		})
	}

	fn bulk_upsert<'a>(
		&'a self,
		index: &'a str,
		docs: &'a [(String, Value)],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());
			let stored = indices.entry(index.to_string()).or_default();

			for (id, doc) in docs {
				stored.insert(id.clone(), doc.clone());
			}

			Ok(())
		})
	}

	fn multi_get<'a>(
		&'a self,
		index: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<(String, Value)>>> {
		Box::pin(async move {
			let indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());
			let Some(stored) = indices.get(index) else { return Ok(Vec::new()) };
			let mut out = Vec::new();

			for id in ids {
				if let Some(doc) = stored.get(id) {
					out.push((id.clone(), doc.clone()));
				}
			}

			Ok(out)
		})
	}

	fn search<'a>(&'a self, index: &'a str, body: Value) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			let indices = self.indices.lock().unwrap_or_else(|err| err.into_inner());
			let Some(stored) = indices.get(index) else { return Ok(Vec::new()) };
			let query = body.get("query").cloned().unwrap_or(Value::Null);
			let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
			let mut hits = Vec::new();

			for (id, doc) in stored {
				if let Some(score) = eval_query(&query, doc) {
					hits.push(SearchHit { id: id.clone(), score, source: doc.clone() });
				}
			}

			if let Some(sort) = body.get("sort").and_then(Value::as_array).and_then(|s| s.first())
			{
				apply_sort(&mut hits, sort);
			} else {
				hits.sort_by(|a, b| {
					b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
				});
			}

			hits.truncate(size);

			Ok(hits)
		})
	}
}

/// Delegates to an inner backend but fails every call touching the configured
/// indices, for simulating a remote store that times out on one collection.
pub struct FlakyBackend<B> {
	inner: B,
	failing: HashSet<String>,
}
impl<B: SearchBackend> FlakyBackend<B> {
	pub fn new(inner: B, failing: impl IntoIterator<Item = String>) -> Self {
		Self { inner, failing: failing.into_iter().collect() }
	}

	fn check(&self, index: &str) -> Result<()> {
		if self.failing.contains(index) {
			return Err(Error::Status {
				status: 503,
				body: format!("Injected failure for index {index}."),
			});
		}

		Ok(())
	}
}
impl<B: SearchBackend> SearchBackend for FlakyBackend<B> {
	fn ensure_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.check(index)?;
			self.inner.ensure_index(index).await
		})
	}

	fn bulk_upsert<'a>(
		&'a self,
		index: &'a str,
		docs: &'a [(String, Value)],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.check(index)?;
			self.inner.bulk_upsert(index, docs).await
		})
	}

	fn multi_get<'a>(
		&'a self,
		index: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<(String, Value)>>> {
		Box::pin(async move {
			self.check(index)?;
			self.inner.multi_get(index, ids).await
		})
	}

	fn search<'a>(&'a self, index: &'a str, body: Value) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			self.check(index)?;
			self.inner.search(index, body).await
		})
	}
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
	let mut current = doc;

	for part in path.split('.') {
		current = current.get(part)?;
	}

	Some(current)
}

fn value_matches(field_value: &Value, wanted: &Value) -> bool {
	match field_value {
		Value::Array(items) => items.iter().any(|item| item == wanted),
		other => other == wanted,
	}
}

fn eval_query(query: &Value, doc: &Value) -> Option<f32> {
	match query {
		Value::Null => Some(1.0),
		Value::Object(map) => {
			if let Some(term) = map.get("term") {
				return eval_term(term, doc);
			}
			if let Some(terms) = map.get("terms") {
				return eval_terms(terms, doc);
			}
			if let Some(range) = map.get("range") {
				return eval_range(range, doc);
			}
			if let Some(multi) = map.get("multi_match") {
				return eval_multi_match(multi, doc);
			}
			if let Some(bool_query) = map.get("bool") {
				return eval_bool(bool_query, doc);
			}
			if map.contains_key("match_all") {
				return Some(1.0);
			}

			None
		},
		_ => None,
	}
}

fn eval_term(term: &Value, doc: &Value) -> Option<f32> {
	let (field, wanted) = term.as_object()?.iter().next()?;
	let field_value = lookup(doc, field)?;

	value_matches(field_value, wanted).then_some(1.0)
}

fn eval_terms(terms: &Value, doc: &Value) -> Option<f32> {
	let (field, wanted_list) = terms.as_object()?.iter().next()?;
	let wanted_list = wanted_list.as_array()?;
	let field_value = lookup(doc, field)?;

	wanted_list.iter().any(|wanted| value_matches(field_value, wanted)).then_some(1.0)
}

fn eval_range(range: &Value, doc: &Value) -> Option<f32> {
	let (field, bounds) = range.as_object()?.iter().next()?;
	let field_value = lookup(doc, field)?;

	if let Some(gte) = bounds.get("gte") {
		let ok = match (field_value, gte) {
			(Value::String(actual), Value::String(bound)) => actual.as_str() >= bound.as_str(),
			(Value::Number(actual), Value::Number(bound)) => {
				actual.as_f64().unwrap_or(f64::MIN) >= bound.as_f64().unwrap_or(f64::MAX)
			},
			_ => false,
		};

		if !ok {
			return None;
		}
	}

	Some(1.0)
}

fn eval_multi_match(multi: &Value, doc: &Value) -> Option<f32> {
	let query_text = multi.get("query")?.as_str()?.to_lowercase();
	let tokens: Vec<&str> = query_text.split_whitespace().collect();
	let fields = multi.get("fields")?.as_array()?;
	let mut score = 0.0f32;

	for field in fields {
		let field = field.as_str()?;
		let (name, boost) = match field.split_once('^') {
			Some((name, boost)) => (name, boost.parse::<f32>().unwrap_or(1.0)),
			None => (field, 1.0),
		};
		let Some(text) = lookup(doc, name).and_then(Value::as_str) else { continue };
		let text = text.to_lowercase();
		let matched = tokens.iter().filter(|token| text.contains(**token)).count();

		score += boost * matched as f32;
	}

	(score > 0.0).then_some(score)
}

fn eval_bool(bool_query: &Value, doc: &Value) -> Option<f32> {
	let mut score = 0.0f32;

	if let Some(filters) = bool_query.get("filter").and_then(Value::as_array) {
		for filter in filters {
			eval_query(filter, doc)?;
		}
	}
	if let Some(should) = bool_query.get("should").and_then(Value::as_array) {
		let mut matched = 0_usize;

		for clause in should {
			if let Some(clause_score) = eval_query(clause, doc) {
				matched += 1;
				score += clause_score;
			}
		}

		let minimum = bool_query
			.get("minimum_should_match")
			.and_then(Value::as_u64)
			.unwrap_or(0) as usize;

		if matched < minimum {
			return None;
		}
	}

	Some(if score > 0.0 { score } else { 1.0 })
}

fn apply_sort(hits: &mut [SearchHit], sort: &Value) {
	let Some((field, spec)) = sort.as_object().and_then(|map| map.iter().next()) else { return };
	let descending = spec.get("order").and_then(Value::as_str) == Some("desc");

	hits.sort_by(|a, b| {
		let left = lookup(&a.source, field).and_then(Value::as_str).unwrap_or("");
		let right = lookup(&b.source, field).and_then(Value::as_str).unwrap_or("");

		if descending { right.cmp(left) } else { left.cmp(right) }
	});
}
