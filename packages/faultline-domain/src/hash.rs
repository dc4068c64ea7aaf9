//! Content-derived identities: edge ids, config fingerprints, and topology
//! signatures. All three must be stable across process restarts and input
//! ordering, so everything is hashed from a canonical text form.

use serde_json::Value;

use crate::model::{Relation, ResourceType};

/// Identity of a directed relationship. Depends on the
/// `(from_arn, rel, to_arn)` triple only; confidence, evidence, and timestamps
/// never change it.
pub fn edge_id(from_arn: &str, rel: Relation, to_arn: &str) -> String {
	let input = format!("{from_arn}|{}|{to_arn}", rel.as_str());

	blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Hash of a configuration attribute payload with recursively sorted object
/// keys, so field order in the source payload never matters.
pub fn config_fingerprint(attrs: &Value) -> String {
	let canonical = canonical_json(attrs);

	blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

pub fn config_id(arn: &str, hash: &str) -> String {
	format!("{arn}|{hash}")
}

/// Order-independent structural summary of a subgraph: the multiset of node
/// types plus the multiset of edge relations, sorted before hashing so that
/// discovery order and concrete ARNs play no part.
pub fn topology_signature(node_types: &[ResourceType], relations: &[Relation]) -> String {
	let mut nodes: Vec<&str> = node_types.iter().map(ResourceType::as_str).collect();
	let mut edges: Vec<&str> = relations.iter().map(Relation::as_str).collect();

	nodes.sort_unstable();
	edges.sort_unstable();

	let mut input = String::new();

	for node in nodes {
		input.push_str("node:");
		input.push_str(node);
		input.push('\n');
	}
	for edge in edges {
		input.push_str("edge:");
		input.push_str(edge);
		input.push('\n');
	}

	blake3::hash(input.as_bytes()).to_hex().to_string()
}

fn canonical_json(value: &Value) -> String {
	let mut out = String::new();

	write_canonical(value, &mut out);

	out
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Object(map) => {
			let mut keys: Vec<&String> = map.keys().collect();

			keys.sort();

			out.push('{');

			for (i, key) in keys.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}

				out.push_str(&Value::String((*key).clone()).to_string());
				out.push(':');
				write_canonical(&map[*key], out);
			}

			out.push('}');
		},
		Value::Array(items) => {
			out.push('[');

			for (i, item) in items.iter().enumerate() {
				if i > 0 {
					out.push(',');
				}

				write_canonical(item, out);
			}

			out.push(']');
		},
		other => out.push_str(&other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn edge_id_ignores_mutable_attributes() {
		let a = "arn:aws:lambda:eu-west-1:123456789012:function:checkout";
		let b = "arn:aws:dynamodb:eu-west-1:123456789012:table/orders";

		// The id is a pure function of the triple; callers carrying different
		// confidence or timestamps still land on the same document.
		assert_eq!(edge_id(a, Relation::Reads, b), edge_id(a, Relation::Reads, b));
		assert_ne!(edge_id(a, Relation::Reads, b), edge_id(a, Relation::Writes, b));
		assert_ne!(edge_id(a, Relation::Reads, b), edge_id(b, Relation::Reads, a));
	}

	#[test]
	fn config_fingerprint_is_order_insensitive() {
		let first = json!({ "timeout": 30, "memory": 512, "env": { "A": "1", "B": "2" } });
		let second = json!({ "env": { "B": "2", "A": "1" }, "memory": 512, "timeout": 30 });

		assert_eq!(config_fingerprint(&first), config_fingerprint(&second));
	}

	#[test]
	fn config_fingerprint_tracks_value_changes() {
		let first = json!({ "timeout": 30, "memory": 512 });
		let second = json!({ "timeout": 30, "memory": 1024 });

		assert_ne!(config_fingerprint(&first), config_fingerprint(&second));
	}

	#[test]
	fn config_id_is_content_addressed() {
		let arn = "arn:aws:lambda:eu-west-1:123456789012:function:checkout";
		let attrs = json!({ "memory": 512 });
		let hash = config_fingerprint(&attrs);

		assert_eq!(config_id(arn, &hash), config_id(arn, &config_fingerprint(&attrs)));
	}

	#[test]
	fn topology_signature_ignores_order() {
		let forward = topology_signature(
			&[ResourceType::Lambda, ResourceType::Dynamodb],
			&[Relation::Reads, Relation::Calls],
		);
		let reversed = topology_signature(
			&[ResourceType::Dynamodb, ResourceType::Lambda],
			&[Relation::Calls, Relation::Reads],
		);

		assert_eq!(forward, reversed);
	}

	#[test]
	fn topology_signature_tracks_multiplicity() {
		let single = topology_signature(&[ResourceType::Lambda], &[Relation::Calls]);
		let double = topology_signature(
			&[ResourceType::Lambda, ResourceType::Lambda],
			&[Relation::Calls],
		);

		assert_ne!(single, double);
	}
}
