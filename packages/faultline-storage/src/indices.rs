/// Index names for each collection, derived from one configured prefix so that
/// several deployments can share an engine.
#[derive(Debug, Clone)]
pub struct Indices {
	pub nodes: String,
	pub edges: String,
	pub pointers: String,
	pub config_snapshots: String,
	pub patterns: String,
	pub incidents: String,
	pub investigations: String,
}
impl Indices {
	pub fn new(prefix: &str) -> Self {
		Self {
			nodes: format!("{prefix}-nodes"),
			edges: format!("{prefix}-edges"),
			pointers: format!("{prefix}-pointers"),
			config_snapshots: format!("{prefix}-config-snapshots"),
			patterns: format!("{prefix}-patterns"),
			incidents: format!("{prefix}-incidents"),
			investigations: format!("{prefix}-investigations"),
		}
	}

	pub fn all(&self) -> [&str; 7] {
		[
			&self.nodes,
			&self.edges,
			&self.pointers,
			&self.config_snapshots,
			&self.patterns,
			&self.incidents,
			&self.investigations,
		]
	}
}
