use serde_json::Value;

use crate::{BoxFuture, Result};

/// One scored hit from the remote engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
	pub id: String,
	pub score: f32,
	pub source: Value,
}

/// The remote document engine as the core sees it: id-addressed collections
/// with bulk upsert, batched get, and filtered/boosted full-text search. The
/// production implementation speaks HTTP; tests substitute an in-memory one.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn ensure_index<'a>(&'a self, index: &'a str) -> BoxFuture<'a, Result<()>>;

	fn bulk_upsert<'a>(
		&'a self,
		index: &'a str,
		docs: &'a [(String, Value)],
	) -> BoxFuture<'a, Result<()>>;

	fn multi_get<'a>(
		&'a self,
		index: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<(String, Value)>>>;

	fn search<'a>(&'a self, index: &'a str, body: Value) -> BoxFuture<'a, Result<Vec<SearchHit>>>;
}
