//! JSON query builders for the remote engine. Pure functions; the service layer
//! composes these and hands the finished body to the backend.

use serde_json::{Value, json};

pub fn term(field: &str, value: &str) -> Value {
	json!({ "term": { field: value } })
}

pub fn terms(field: &str, values: &[String]) -> Value {
	json!({ "terms": { field: values } })
}

pub fn range_gte(field: &str, value: &str) -> Value {
	json!({ "range": { field: { "gte": value } } })
}

/// Boolean query with mandatory filters and optional scored `should` clauses.
pub fn bool_query(filters: Vec<Value>, should: Vec<Value>) -> Value {
	let mut bool_body = serde_json::Map::new();

	if !filters.is_empty() {
		bool_body.insert("filter".to_string(), Value::Array(filters));
	}
	if !should.is_empty() {
		bool_body.insert("should".to_string(), Value::Array(should));
		bool_body.insert("minimum_should_match".to_string(), json!(1));
	}

	json!({ "bool": bool_body })
}

/// Boosted multi-field full-text match with fuzziness, e.g.
/// `["error_message^3", "root_cause_summary^2"]`.
pub fn multi_match(query_text: &str, fields: &[(&str, f32)]) -> Value {
	let fields: Vec<String> =
		fields.iter().map(|(field, boost)| format!("{field}^{boost}")).collect();

	json!({
		"multi_match": {
			"query": query_text,
			"fields": fields,
			"fuzziness": "AUTO",
		}
	})
}

pub fn search_body(query: Value, size: usize) -> Value {
	json!({ "query": query, "size": size })
}

pub fn search_body_sorted(query: Value, size: usize, sort_field: &str, descending: bool) -> Value {
	let order = if descending { "desc" } else { "asc" };

	json!({
		"query": query,
		"size": size,
		"sort": [{ sort_field: { "order": order } }],
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bool_query_carries_filters_and_should() {
		let body = bool_query(
			vec![term("arn", "arn:aws:s3:::bucket")],
			vec![terms("tags", &["timeout".to_string()])],
		);

		assert_eq!(body["bool"]["filter"][0]["term"]["arn"], "arn:aws:s3:::bucket");
		assert_eq!(body["bool"]["minimum_should_match"], 1);
	}

	#[test]
	fn multi_match_renders_boosts() {
		let body = multi_match("task timed out", &[("error_message", 3.0), ("resource_name", 1.0)]);
		let fields = body["multi_match"]["fields"].as_array().expect("fields must be an array.");

		assert_eq!(fields[0], "error_message^3");
		assert_eq!(body["multi_match"]["fuzziness"], "AUTO");
	}

	#[test]
	fn sorted_body_orders_descending() {
		let body = search_body_sorted(term("arn", "a"), 50, "collected_at", true);

		assert_eq!(body["sort"][0]["collected_at"]["order"], "desc");
		assert_eq!(body["size"], 50);
	}
}
