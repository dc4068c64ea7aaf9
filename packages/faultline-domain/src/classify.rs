use crate::{arn, model::{Relation, ResourceType}};

/// Ordered substring rules, evaluated top to bottom over a lowercased haystack.
/// First hit wins; no hit falls through to the caller's default.
struct ResourceRule {
	needle: &'static str,
	resource: ResourceType,
}

const ORIGIN_RULES: &[ResourceRule] = &[
	ResourceRule { needle: "aws::lambda", resource: ResourceType::Lambda },
	ResourceRule { needle: "aws::dynamodb", resource: ResourceType::Dynamodb },
	ResourceRule { needle: "aws::s3", resource: ResourceType::S3 },
	ResourceRule { needle: "aws::sns", resource: ResourceType::Sns },
	ResourceRule { needle: "aws::sqs", resource: ResourceType::Sqs },
	ResourceRule { needle: "aws::apigateway", resource: ResourceType::Apigateway },
	ResourceRule { needle: "aws::stepfunctions", resource: ResourceType::Stepfunctions },
	ResourceRule { needle: "aws::events", resource: ResourceType::Eventbridge },
	ResourceRule { needle: "aws::kinesis", resource: ResourceType::Kinesis },
	ResourceRule { needle: "aws::rds", resource: ResourceType::Rds },
];

const NAME_RULES: &[ResourceRule] = &[
	ResourceRule { needle: "lambda", resource: ResourceType::Lambda },
	ResourceRule { needle: "dynamodb", resource: ResourceType::Dynamodb },
	ResourceRule { needle: "dynamo", resource: ResourceType::Dynamodb },
	ResourceRule { needle: "s3", resource: ResourceType::S3 },
	ResourceRule { needle: "sns", resource: ResourceType::Sns },
	ResourceRule { needle: "sqs", resource: ResourceType::Sqs },
	ResourceRule { needle: "api gateway", resource: ResourceType::Apigateway },
	ResourceRule { needle: "apigateway", resource: ResourceType::Apigateway },
	ResourceRule { needle: "stepfunctions", resource: ResourceType::Stepfunctions },
	ResourceRule { needle: "states", resource: ResourceType::Stepfunctions },
	ResourceRule { needle: "eventbridge", resource: ResourceType::Eventbridge },
	ResourceRule { needle: "events", resource: ResourceType::Eventbridge },
	ResourceRule { needle: "kinesis", resource: ResourceType::Kinesis },
	ResourceRule { needle: "rds", resource: ResourceType::Rds },
];

struct RelationRule {
	needle: &'static str,
	relation: Relation,
}

const RELATION_RULES: &[RelationRule] = &[
	RelationRule { needle: "publish", relation: Relation::Publishes },
	RelationRule { needle: "subscribe", relation: Relation::Subscribes },
	RelationRule { needle: "invoke", relation: Relation::Triggers },
	RelationRule { needle: "trigger", relation: Relation::Triggers },
	RelationRule { needle: "startexecution", relation: Relation::Triggers },
	RelationRule { needle: "getitem", relation: Relation::Reads },
	RelationRule { needle: "batchget", relation: Relation::Reads },
	RelationRule { needle: "get", relation: Relation::Reads },
	RelationRule { needle: "query", relation: Relation::Reads },
	RelationRule { needle: "scan", relation: Relation::Reads },
	RelationRule { needle: "receive", relation: Relation::Reads },
	RelationRule { needle: "read", relation: Relation::Reads },
	RelationRule { needle: "putitem", relation: Relation::Writes },
	RelationRule { needle: "put", relation: Relation::Writes },
	RelationRule { needle: "send", relation: Relation::Writes },
	RelationRule { needle: "update", relation: Relation::Writes },
	RelationRule { needle: "delete", relation: Relation::Writes },
	RelationRule { needle: "write", relation: Relation::Writes },
	RelationRule { needle: "insert", relation: Relation::Writes },
];

/// Maps a segment's declared identity to a resource kind and display name.
/// Never fails: unmatched input degrades to `unknown` with the given name.
pub fn classify_resource(name: &str, origin: &str, arn: Option<&str>) -> (ResourceType, String) {
	if let Some(arn) = arn
		&& let Some(parts) = arn::parse(arn)
	{
		let resource = arn::resource_type_from_service(&parts.service);

		if resource != ResourceType::Unknown {
			return (resource, arn::resource_name(arn));
		}
	}

	let origin = origin.to_lowercase();

	for rule in ORIGIN_RULES {
		if origin.contains(rule.needle) {
			return (rule.resource, name.to_string());
		}
	}

	let lowered = name.to_lowercase();

	for rule in NAME_RULES {
		if lowered.contains(rule.needle) {
			return (rule.resource, name.to_string());
		}
	}

	(ResourceType::Unknown, name.to_string())
}

/// Maps a sub-call's name and optional declared operation to a relationship
/// verb. Defaults to `CALLS` rather than failing.
pub fn classify_relationship(child_name: &str, operation: Option<&str>) -> Relation {
	let haystack = match operation {
		Some(operation) => format!("{} {}", child_name, operation).to_lowercase(),
		None => child_name.to_lowercase(),
	};

	for rule in RELATION_RULES {
		if haystack.contains(rule.needle) {
			return rule.relation;
		}
	}

	Relation::Calls
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_by_arn_service_first() {
		let (resource, name) = classify_resource(
			"whatever",
			"",
			Some("arn:aws:dynamodb:eu-west-1:123456789012:table/orders"),
		);

		assert_eq!(resource, ResourceType::Dynamodb);
		assert_eq!(name, "orders");
	}

	#[test]
	fn classifies_by_origin() {
		let (resource, name) = classify_resource("checkout", "AWS::Lambda::Function", None);

		assert_eq!(resource, ResourceType::Lambda);
		assert_eq!(name, "checkout");
	}

	#[test]
	fn classifies_by_name_keyword() {
		let (resource, _) = classify_resource("orders-dynamodb", "", None);

		assert_eq!(resource, ResourceType::Dynamodb);
	}

	#[test]
	fn unmatched_input_degrades_to_unknown() {
		let (resource, name) = classify_resource("mystery-dependency", "", None);

		assert_eq!(resource, ResourceType::Unknown);
		assert_eq!(name, "mystery-dependency");
	}

	#[test]
	fn classifies_read_verbs() {
		assert_eq!(classify_relationship("DynamoDB", Some("GetItem")), Relation::Reads);
		assert_eq!(classify_relationship("orders-query", None), Relation::Reads);
	}

	#[test]
	fn classifies_write_and_publish_verbs() {
		assert_eq!(classify_relationship("DynamoDB", Some("PutItem")), Relation::Writes);
		assert_eq!(classify_relationship("SNS", Some("Publish")), Relation::Publishes);
		assert_eq!(classify_relationship("SQS", Some("SendMessage")), Relation::Writes);
	}

	#[test]
	fn classifies_trigger_verbs() {
		assert_eq!(classify_relationship("Lambda", Some("Invoke")), Relation::Triggers);
	}

	#[test]
	fn unmatched_verb_defaults_to_calls() {
		assert_eq!(classify_relationship("downstream-service", None), Relation::Calls);
	}
}
