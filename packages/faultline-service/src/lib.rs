pub mod builder;
pub mod patterns;
pub mod retrieval;
pub mod similar;

mod error;

pub use builder::{
	AwsMeta, GraphDelta, LogEntry, RawSegment, SegmentDocument, SubsegmentDocument, TracePayload,
};
pub use error::{Error, Result};
pub use similar::{SimilarQuery, SimilarResult};

use std::sync::Arc;

use faultline_config::Config;
use faultline_storage::{Indices, SearchBackend, StoreHandle};

/// The investigation core: builds the infrastructure graph from telemetry and
/// reads it back as bounded, anchor-centered context. Stateless between calls;
/// every method takes its input explicitly and concurrent investigations never
/// interfere.
pub struct FaultlineService {
	pub cfg: Config,
	pub store: StoreHandle,
}
impl FaultlineService {
	pub fn new(cfg: Config, backend: Arc<dyn SearchBackend>) -> Self {
		let indices = Indices::new(&cfg.storage.search.index_prefix);

		Self { cfg, store: StoreHandle::new(backend, indices) }
	}

	pub async fn ensure_indices(&self) {
		self.store.ensure_indices().await;
	}
}
