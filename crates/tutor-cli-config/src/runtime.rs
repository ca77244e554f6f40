// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fully resolved configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tutor_annotate::{
	ExtractorConfig, ShapePolicy, TriggerMode, DEFAULT_MAX_DECORATIONS, DEFAULT_PREVIEW_CHARS,
};

use crate::error::ConfigError;
use crate::layer::{AnnotationLayer, ConfigLayer, LoggingLayer, ModelLayer, ProviderLayer};
use crate::secret::SecretString;

pub const DEFAULT_VENDOR: &str = "openai";
pub const DEFAULT_FAMILY: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorConfig {
	pub model: ModelConfig,
	pub provider: ProviderConfig,
	pub annotation: AnnotationConfig,
	pub logging: LoggingConfig,
}

impl Default for TutorConfig {
	fn default() -> Self {
		Self::from_layer(ConfigLayer::default())
	}
}

impl TutorConfig {
	/// Fills every unset field with its default.
	pub fn from_layer(layer: ConfigLayer) -> Self {
		Self {
			model: ModelConfig::from(layer.model.unwrap_or_default()),
			provider: ProviderConfig::from(layer.provider.unwrap_or_default()),
			annotation: AnnotationConfig::from(layer.annotation.unwrap_or_default()),
			logging: LoggingConfig::from(layer.logging.unwrap_or_default()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
	pub vendor: String,
	pub family: String,
}

impl From<ModelLayer> for ModelConfig {
	fn from(layer: ModelLayer) -> Self {
		Self {
			vendor: layer.vendor.unwrap_or_else(|| DEFAULT_VENDOR.to_string()),
			family: layer.family.unwrap_or_else(|| DEFAULT_FAMILY.to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
	pub base_url: String,
	pub api_key: Option<SecretString>,
	/// Model name sent on the wire. Defaults to the selected family.
	pub model: Option<String>,
	pub organization: Option<String>,
}

impl From<ProviderLayer> for ProviderConfig {
	fn from(layer: ProviderLayer) -> Self {
		Self {
			base_url: layer.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
			api_key: layer.api_key.filter(|k| !k.is_empty()),
			model: layer.model,
			organization: layer.organization,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationConfig {
	pub trigger: TriggerMode,
	pub shape_policy: ShapePolicy,
	pub max_buffer_bytes: Option<usize>,
	pub max_decorations: usize,
	pub preview_chars: usize,
}

impl From<AnnotationLayer> for AnnotationConfig {
	fn from(layer: AnnotationLayer) -> Self {
		Self {
			trigger: layer.trigger.unwrap_or_default(),
			shape_policy: layer.shape_policy.unwrap_or_default(),
			max_buffer_bytes: layer.max_buffer_bytes,
			max_decorations: layer.max_decorations.unwrap_or(DEFAULT_MAX_DECORATIONS),
			preview_chars: layer.preview_chars.unwrap_or(DEFAULT_PREVIEW_CHARS),
		}
	}
}

impl AnnotationConfig {
	pub fn extractor_config(&self) -> ExtractorConfig {
		ExtractorConfig {
			trigger: self.trigger,
			shape_policy: self.shape_policy,
			max_buffer_bytes: self.max_buffer_bytes,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

impl From<LoggingLayer> for LoggingConfig {
	fn from(layer: LoggingLayer) -> Self {
		Self {
			level: layer.level.unwrap_or_default(),
			format: layer.format.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}

impl fmt::Display for LogLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LogLevel {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"trace" => Ok(LogLevel::Trace),
			"debug" => Ok(LogLevel::Debug),
			"info" => Ok(LogLevel::Info),
			"warn" | "warning" => Ok(LogLevel::Warn),
			"error" => Ok(LogLevel::Error),
			_ => Err(ConfigError::invalid_value(
				"logging.level",
				format!("unknown level '{s}'"),
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Compact,
	Json,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"compact" => Ok(LogFormat::Compact),
			"json" => Ok(LogFormat::Json),
			_ => Err(ConfigError::invalid_value(
				"logging.format",
				format!("unknown format '{s}', expected 'pretty', 'compact', or 'json'"),
			)),
		}
	}
}
