// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Annotation records and the parse/validate stages that produce them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A suggestion attached to a 1-based source line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
	pub line: u32,
	pub suggestion: String,
}

impl AnnotationRecord {
	pub fn new(line: u32, suggestion: impl Into<String>) -> Self {
		Self {
			line,
			suggestion: suggestion.into(),
		}
	}
}

/// How a syntactically valid JSON value becomes a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapePolicy {
	/// Require a positive integer `line` and a non-empty string `suggestion`.
	#[default]
	Validated,
	/// Emit a record for every parsed value. Missing or malformed fields
	/// become `line = 0` and an empty suggestion.
	Legacy,
}

impl fmt::Display for ShapePolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ShapePolicy::Validated => write!(f, "validated"),
			ShapePolicy::Legacy => write!(f, "legacy"),
		}
	}
}

impl FromStr for ShapePolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"validated" => Ok(ShapePolicy::Validated),
			"legacy" => Ok(ShapePolicy::Legacy),
			_ => Err(format!(
				"unknown shape policy '{s}', expected 'validated' or 'legacy'"
			)),
		}
	}
}

/// Parses `text` as exactly one JSON value.
///
/// Leading and trailing whitespace is accepted; anything else after the value
/// is a failure.
pub fn parse_attempt(text: &str) -> Option<Value> {
	serde_json::from_str(text).ok()
}

/// Turns a parsed value into a record according to `policy`.
pub fn validate_shape(value: &Value, policy: ShapePolicy) -> Option<AnnotationRecord> {
	let line = value.get("line").and_then(line_number);
	let suggestion = value.get("suggestion").and_then(Value::as_str);

	match policy {
		ShapePolicy::Validated => {
			let line = line?;
			let suggestion = suggestion.filter(|s| !s.trim().is_empty())?;
			Some(AnnotationRecord::new(line, suggestion))
		}
		ShapePolicy::Legacy => Some(AnnotationRecord::new(
			line.unwrap_or(0),
			suggestion.unwrap_or_default(),
		)),
	}
}

fn line_number(value: &Value) -> Option<u32> {
	let n = match value.as_u64() {
		Some(n) => n,
		None => {
			let f = value.as_f64()?;
			if f.fract() != 0.0 || f < 0.0 || f > u32::MAX as f64 {
				return None;
			}
			f as u64
		}
	};
	u32::try_from(n).ok().filter(|&n| n >= 1)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn parse_attempt_accepts_single_value_only() {
		assert!(parse_attempt(r#" {"line": 1} "#).is_some());
		assert!(parse_attempt(r#"{"line": 1}{"line": 2}"#).is_none());
		assert!(parse_attempt(r#"{"line": 1"#).is_none());
		assert!(parse_attempt("").is_none());
	}

	#[test]
	fn validated_accepts_well_formed_record_and_ignores_extra_fields() {
		let value = json!({"line": 3, "suggestion": "use a loop", "severity": "low"});
		assert_eq!(
			validate_shape(&value, ShapePolicy::Validated),
			Some(AnnotationRecord::new(3, "use a loop"))
		);
	}

	#[test]
	fn validated_accepts_integral_float_line() {
		let value = json!({"line": 4.0, "suggestion": "rename"});
		assert_eq!(
			validate_shape(&value, ShapePolicy::Validated),
			Some(AnnotationRecord::new(4, "rename"))
		);
	}

	#[test]
	fn validated_rejects_wrong_shapes() {
		let rejected = [
			json!({"foo": "bar"}),
			json!({"line": 0, "suggestion": "x"}),
			json!({"line": -2, "suggestion": "x"}),
			json!({"line": 1.5, "suggestion": "x"}),
			json!({"line": "3", "suggestion": "x"}),
			json!({"line": 3, "suggestion": "   "}),
			json!({"line": 3, "suggestion": 7}),
			json!([1, 2]),
			json!(42),
		];
		for value in rejected {
			assert_eq!(validate_shape(&value, ShapePolicy::Validated), None, "{value}");
		}
	}

	#[test]
	fn legacy_emits_placeholder_fields() {
		assert_eq!(
			validate_shape(&json!({"foo": "bar"}), ShapePolicy::Legacy),
			Some(AnnotationRecord::new(0, ""))
		);
		assert_eq!(
			validate_shape(&json!("text"), ShapePolicy::Legacy),
			Some(AnnotationRecord::new(0, ""))
		);
		assert_eq!(
			validate_shape(&json!({"line": 2}), ShapePolicy::Legacy),
			Some(AnnotationRecord::new(2, ""))
		);
	}

	#[test]
	fn shape_policy_parses_from_str() {
		assert_eq!("Legacy".parse::<ShapePolicy>(), Ok(ShapePolicy::Legacy));
		assert_eq!("validated".parse::<ShapePolicy>(), Ok(ShapePolicy::Validated));
		assert!("strict".parse::<ShapePolicy>().is_err());
	}
}
