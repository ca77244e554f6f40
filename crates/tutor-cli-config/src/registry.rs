// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered collection of configuration sources.

use tracing::debug;

use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::runtime::TutorConfig;
use crate::sources::ConfigSource;
use crate::validation::validate;

#[derive(Default)]
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		self.sources.push(source);
	}

	pub fn len(&self) -> usize {
		self.sources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}

	/// Merges every source from lowest to highest precedence. Sources with
	/// equal precedence apply in registration order.
	pub fn merged(&self) -> Result<ConfigLayer, ConfigError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|s| s.precedence());

		let mut merged = ConfigLayer::default();
		for source in ordered {
			debug!(source = source.name(), precedence = ?source.precedence(), "loading configuration source");
			merged.merge(source.load()?);
		}
		Ok(merged)
	}

	/// Merges, fills defaults and validates.
	pub fn load(&self) -> Result<TutorConfig, ConfigError> {
		let config = TutorConfig::from_layer(self.merged()?);
		validate(&config)?;
		debug!(
			vendor = %config.model.vendor,
			family = %config.model.family,
			trigger = %config.annotation.trigger,
			shape_policy = %config.annotation.shape_policy,
			"configuration resolved"
		);
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::paths::paths_under;
	use crate::runtime::LogLevel;
	use crate::sources::{CliOverrides, CliSource, DefaultsSource, EnvSource, FileSource};
	use tutor_annotate::{ShapePolicy, TriggerMode};

	fn write(path: &std::path::Path, content: &str) {
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(path, content).unwrap();
	}

	#[test]
	fn later_sources_override_earlier_ones() {
		let home = tempfile::tempdir().unwrap();
		let workspace = tempfile::tempdir().unwrap();
		let paths = paths_under(home.path(), workspace.path());

		write(
			&paths.user_config_file,
			"[model]\nfamily = \"gpt-4o-mini\"\n\n[annotation]\ntrigger = \"closing-brace\"\npreview_chars = 40\n",
		);
		write(
			&paths.workspace_config_file,
			"[annotation]\nshape_policy = \"legacy\"\npreview_chars = 30\n",
		);

		let mut registry = ConfigRegistry::new();
		// registration order does not matter
		registry.register(Box::new(CliSource::new(CliOverrides {
			log_level: Some(LogLevel::Trace),
			..Default::default()
		})));
		registry.register(Box::new(EnvSource::from_vars([(
			"TUTOR_ANNOTATION_PREVIEW_CHARS",
			"20",
		)])));
		registry.register(Box::new(FileSource::workspace(&paths)));
		registry.register(Box::new(FileSource::user(&paths)));
		registry.register(Box::new(DefaultsSource));

		let config = registry.load().unwrap();
		assert_eq!(config.model.vendor, "openai");
		assert_eq!(config.model.family, "gpt-4o-mini");
		assert_eq!(config.annotation.trigger, TriggerMode::ClosingBrace);
		assert_eq!(config.annotation.shape_policy, ShapePolicy::Legacy);
		assert_eq!(config.annotation.preview_chars, 20);
		assert_eq!(config.logging.level, LogLevel::Trace);
	}

	#[test]
	fn invalid_merged_config_is_rejected() {
		let mut registry = ConfigRegistry::new();
		registry.register(Box::new(DefaultsSource));
		registry.register(Box::new(EnvSource::from_vars([(
			"TUTOR_ANNOTATION_MAX_DECORATIONS",
			"0",
		)])));
		assert!(matches!(registry.load(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn empty_registry_yields_defaults() {
		let registry = ConfigRegistry::new();
		assert!(registry.is_empty());
		assert_eq!(registry.load().unwrap(), TutorConfig::default());
	}
}
