// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the code tutor CLI.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - Layered configuration from multiple sources
//! - TOML configuration file parsing
//! - Environment variable overrides
//! - Configuration validation
//!
//! Precedence, lowest first: defaults, user file, workspace file, an
//! explicit `--config` file, environment, command-line flags.

pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod secret;
pub mod sources;
pub mod validation;

pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::{
	AnnotationConfig, LogFormat, LogLevel, LoggingConfig, ModelConfig, ProviderConfig, TutorConfig,
};
pub use secret::SecretString;
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Load configuration from all sources with default precedence.
pub fn load_config() -> Result<TutorConfig, ConfigError> {
	load_config_with_cli(CliOverrides::default())
}

/// Load configuration with command-line overrides on top.
pub fn load_config_with_cli(cli: CliOverrides) -> Result<TutorConfig, ConfigError> {
	let paths = paths::resolve_paths()?;
	standard_registry(&paths, cli).load()
}

/// The registry `load_config_with_cli` uses, rooted at `paths`.
pub fn standard_registry(paths: &PathsConfig, cli: CliOverrides) -> ConfigRegistry {
	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::user(paths)));
	registry.register(Box::new(sources::FileSource::workspace(paths)));
	if let Some(path) = &cli.config_file {
		registry.register(Box::new(sources::FileSource::explicit(path)));
	}
	registry.register(Box::new(sources::EnvSource::new()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry
}
