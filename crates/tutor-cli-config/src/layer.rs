// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layers and their merge rules.
//!
//! Every field is optional so that each source can set only what it knows.
//! Merging is field-by-field; values present in the overlay win.

use serde::{Deserialize, Serialize};
use tutor_annotate::{ShapePolicy, TriggerMode};

use crate::runtime::{LogFormat, LogLevel};
use crate::secret::SecretString;

macro_rules! merge_fields {
	($self:ident, $other:ident, $($field:ident),+ $(,)?) => {
		$(
			if $other.$field.is_some() {
				$self.$field = $other.$field;
			}
		)+
	};
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
	#[serde(default)]
	pub model: Option<ModelLayer>,
	#[serde(default)]
	pub provider: Option<ProviderLayer>,
	#[serde(default)]
	pub annotation: Option<AnnotationLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

impl ConfigLayer {
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_section(&mut self.model, other.model, ModelLayer::merge);
		merge_section(&mut self.provider, other.provider, ProviderLayer::merge);
		merge_section(&mut self.annotation, other.annotation, AnnotationLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, overlay: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), overlay) {
		(Some(base), Some(overlay)) => merge(base, overlay),
		(None, Some(overlay)) => *base = Some(overlay),
		(_, None) => {}
	}
}

/// `[model]`: which vendor and family to ask for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelLayer {
	pub vendor: Option<String>,
	pub family: Option<String>,
}

impl ModelLayer {
	pub fn merge(&mut self, other: ModelLayer) {
		merge_fields!(self, other, vendor, family);
	}
}

/// `[provider]`: the chat completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderLayer {
	pub base_url: Option<String>,
	pub api_key: Option<SecretString>,
	pub model: Option<String>,
	pub organization: Option<String>,
}

impl ProviderLayer {
	pub fn merge(&mut self, other: ProviderLayer) {
		merge_fields!(self, other, base_url, api_key, model, organization);
	}
}

/// `[annotation]`: extraction and decoration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationLayer {
	pub trigger: Option<TriggerMode>,
	pub shape_policy: Option<ShapePolicy>,
	pub max_buffer_bytes: Option<usize>,
	pub max_decorations: Option<usize>,
	pub preview_chars: Option<usize>,
}

impl AnnotationLayer {
	pub fn merge(&mut self, other: AnnotationLayer) {
		merge_fields!(
			self,
			other,
			trigger,
			shape_policy,
			max_buffer_bytes,
			max_decorations,
			preview_chars,
		);
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingLayer {
	pub level: Option<LogLevel>,
	pub format: Option<LogFormat>,
}

impl LoggingLayer {
	pub fn merge(&mut self, other: LoggingLayer) {
		merge_fields!(self, other, level, format);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn overlay_wins_field_by_field() {
		let mut base: ConfigLayer = toml::from_str(
			r#"
			[model]
			vendor = "openai"
			family = "gpt-4o"

			[annotation]
			trigger = "closing-brace"
			preview_chars = 40
			"#,
		)
		.unwrap();
		let overlay: ConfigLayer = toml::from_str(
			r#"
			[model]
			family = "gpt-4o-mini"

			[annotation]
			preview_chars = 10
			"#,
		)
		.unwrap();

		base.merge(overlay);

		let model = base.model.unwrap();
		assert_eq!(model.vendor.as_deref(), Some("openai"));
		assert_eq!(model.family.as_deref(), Some("gpt-4o-mini"));
		let annotation = base.annotation.unwrap();
		assert_eq!(annotation.trigger, Some(TriggerMode::ClosingBrace));
		assert_eq!(annotation.preview_chars, Some(10));
	}

	#[test]
	fn absent_overlay_section_keeps_base() {
		let mut base = ConfigLayer {
			logging: Some(LoggingLayer {
				level: Some(LogLevel::Debug),
				format: None,
			}),
			..Default::default()
		};
		base.merge(ConfigLayer::default());
		assert_eq!(base.logging.unwrap().level, Some(LogLevel::Debug));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let result: Result<ConfigLayer, _> = toml::from_str("[annotation]\ntriger = \"depth\"\n");
		assert!(result.is_err());
	}

	#[test]
	fn api_key_is_redacted_in_debug() {
		let layer: ConfigLayer = toml::from_str("[provider]\napi_key = \"sk-live-123\"\n").unwrap();
		assert!(!format!("{layer:?}").contains("sk-live-123"));
		assert_eq!(
			layer.provider.unwrap().api_key.unwrap().expose(),
			"sk-live-123"
		);
	}
}
