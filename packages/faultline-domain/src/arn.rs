use std::sync::LazyLock;

use regex::Regex;

use crate::model::ResourceType;

static ARN_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"arn:aws[a-z-]*:[a-z0-9-]*:[a-z0-9-]*:\d*:[A-Za-z0-9:/._+=@-]+")
		.expect("ARN pattern must compile.")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArnParts {
	pub partition: String,
	pub service: String,
	pub region: String,
	pub account_id: String,
	pub resource: String,
}

pub fn is_arn(input: &str) -> bool {
	input.starts_with("arn:") && input.splitn(6, ':').count() == 6
}

/// First ARN-shaped substring of a free-text message. Multiple matches resolve
/// deterministically to the first.
pub fn find_first_arn(text: &str) -> Option<&str> {
	ARN_RE.find(text).map(|found| found.as_str())
}

pub fn parse(arn: &str) -> Option<ArnParts> {
	let mut parts = arn.splitn(6, ':');

	if parts.next() != Some("arn") {
		return None;
	}

	let partition = parts.next()?.to_string();
	let service = parts.next()?.to_string();
	let region = parts.next()?.to_string();
	let account_id = parts.next()?.to_string();
	let resource = parts.next()?.to_string();

	if resource.is_empty() {
		return None;
	}

	Some(ArnParts { partition, service, region, account_id, resource })
}

/// The trailing human-readable name of an ARN's resource part, e.g.
/// `function:my-fn` -> `my-fn`, `table/orders` -> `orders`.
pub fn resource_name(arn: &str) -> String {
	let resource = match parse(arn) {
		Some(parts) => parts.resource,
		None => arn.to_string(),
	};

	resource
		.rsplit(|ch| ch == '/' || ch == ':')
		.next()
		.map(str::to_string)
		.unwrap_or(resource)
}

/// Deterministic ARN for a resource observed without one. Uses the real layout
/// for the services that have a well-known one and a generic layout otherwise.
pub fn synthesize(resource: ResourceType, region: &str, account_id: &str, name: &str) -> String {
	match resource {
		ResourceType::S3 => format!("arn:aws:s3:::{name}"),
		ResourceType::Lambda => {
			format!("arn:aws:lambda:{region}:{account_id}:function:{name}")
		},
		ResourceType::Dynamodb => {
			format!("arn:aws:dynamodb:{region}:{account_id}:table/{name}")
		},
		ResourceType::Stepfunctions => {
			format!("arn:aws:states:{region}:{account_id}:stateMachine:{name}")
		},
		_ => format!("arn:aws:{}:{region}:{account_id}:{name}", resource.service()),
	}
}

pub fn resource_type_from_service(service: &str) -> ResourceType {
	match service {
		"lambda" => ResourceType::Lambda,
		"dynamodb" => ResourceType::Dynamodb,
		"s3" => ResourceType::S3,
		"sns" => ResourceType::Sns,
		"sqs" => ResourceType::Sqs,
		"apigateway" | "execute-api" => ResourceType::Apigateway,
		"states" => ResourceType::Stepfunctions,
		"events" => ResourceType::Eventbridge,
		"kinesis" => ResourceType::Kinesis,
		"rds" => ResourceType::Rds,
		_ => ResourceType::Unknown,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_first_arn_in_text() {
		let text = "Publishing message to arn:aws:sns:eu-west-1:123456789012:my-topic now";

		assert_eq!(find_first_arn(text), Some("arn:aws:sns:eu-west-1:123456789012:my-topic"));
	}

	#[test]
	fn first_match_wins_with_multiple_arns() {
		let text = "from arn:aws:sqs:us-east-1:111111111111:a to arn:aws:sqs:us-east-1:111111111111:b";

		assert_eq!(find_first_arn(text), Some("arn:aws:sqs:us-east-1:111111111111:a"));
	}

	#[test]
	fn no_arn_yields_none() {
		assert_eq!(find_first_arn("plain log message without identifiers"), None);
	}

	#[test]
	fn parses_standard_arn() {
		let parts = parse("arn:aws:dynamodb:eu-west-1:123456789012:table/orders")
			.expect("ARN must parse.");

		assert_eq!(parts.service, "dynamodb");
		assert_eq!(parts.region, "eu-west-1");
		assert_eq!(parts.account_id, "123456789012");
		assert_eq!(parts.resource, "table/orders");
	}

	#[test]
	fn resource_name_strips_layout() {
		assert_eq!(resource_name("arn:aws:lambda:eu-west-1:123456789012:function:checkout"), "checkout");
		assert_eq!(resource_name("arn:aws:dynamodb:eu-west-1:123456789012:table/orders"), "orders");
		assert_eq!(resource_name("arn:aws:s3:::my-bucket"), "my-bucket");
	}

	#[test]
	fn synthesized_arns_are_deterministic() {
		let first = synthesize(ResourceType::Dynamodb, "eu-west-1", "123456789012", "orders");
		let second = synthesize(ResourceType::Dynamodb, "eu-west-1", "123456789012", "orders");

		assert_eq!(first, second);
		assert!(is_arn(&first));
	}
}
