// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment, CLI flags.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};
use tutor_annotate::{ShapePolicy, TriggerMode};

use crate::error::ConfigError;
use crate::layer::{AnnotationLayer, ConfigLayer, LoggingLayer, ModelLayer, ProviderLayer};
use crate::paths::PathsConfig;
use crate::runtime::{LogFormat, LogLevel};
use crate::secret::SecretString;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	UserFile = 20,
	WorkspaceFile = 30,
	ExplicitFile = 40,
	Environment = 50,
	Cli = 60,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults. Every field is filled at finalization, so the layer
/// itself is empty.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ConfigLayer::default())
	}
}

/// A TOML config file.
pub struct FileSource {
	name: &'static str,
	path: PathBuf,
	precedence: Precedence,
	required: bool,
}

impl FileSource {
	pub fn user(paths: &PathsConfig) -> Self {
		Self {
			name: "user-file",
			path: paths.user_config_file.clone(),
			precedence: Precedence::UserFile,
			required: false,
		}
	}

	pub fn workspace(paths: &PathsConfig) -> Self {
		Self {
			name: "workspace-file",
			path: paths.workspace_config_file.clone(),
			precedence: Precedence::WorkspaceFile,
			required: false,
		}
	}

	/// A file named on the command line; it must exist.
	pub fn explicit(path: impl Into<PathBuf>) -> Self {
		Self {
			name: "explicit-file",
			path: path.into(),
			precedence: Precedence::ExplicitFile,
			required: true,
		}
	}

	pub fn path(&self) -> &PathBuf {
		&self.path
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables.
///
/// Convention: `TUTOR_<SECTION>_<FIELD>`. `OPENAI_API_KEY` is honoured when
/// `TUTOR_PROVIDER_API_KEY` is unset.
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|e| ConfigError::invalid_value(name, format!("'{v}': {e}"))),
			None => Ok(None),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let api_key = self
			.var("TUTOR_PROVIDER_API_KEY")
			.or_else(|| self.var("OPENAI_API_KEY"))
			.map(SecretString::new);

		Ok(ConfigLayer {
			model: Some(ModelLayer {
				vendor: self.var("TUTOR_MODEL_VENDOR"),
				family: self.var("TUTOR_MODEL_FAMILY"),
			}),
			provider: Some(ProviderLayer {
				base_url: self.var("TUTOR_PROVIDER_BASE_URL"),
				api_key,
				model: self.var("TUTOR_PROVIDER_MODEL"),
				organization: self.var("TUTOR_PROVIDER_ORGANIZATION"),
			}),
			annotation: Some(AnnotationLayer {
				trigger: self.parsed::<TriggerMode>("TUTOR_ANNOTATION_TRIGGER")?,
				shape_policy: self.parsed::<ShapePolicy>("TUTOR_ANNOTATION_SHAPE_POLICY")?,
				max_buffer_bytes: self.parsed("TUTOR_ANNOTATION_MAX_BUFFER_BYTES")?,
				max_decorations: self.parsed("TUTOR_ANNOTATION_MAX_DECORATIONS")?,
				preview_chars: self.parsed("TUTOR_ANNOTATION_PREVIEW_CHARS")?,
			}),
			logging: Some(LoggingLayer {
				level: self.parsed::<LogLevel>("TUTOR_LOG_LEVEL")?,
				format: self.parsed::<LogFormat>("TUTOR_LOG_FORMAT")?,
			}),
		})
	}
}

/// Values passed as command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub config_file: Option<PathBuf>,
	pub vendor: Option<String>,
	pub family: Option<String>,
	pub base_url: Option<String>,
	pub provider_model: Option<String>,
	pub trigger: Option<TriggerMode>,
	pub shape_policy: Option<ShapePolicy>,
	pub log_level: Option<LogLevel>,
	pub log_format: Option<LogFormat>,
}

pub struct CliSource {
	overrides: CliOverrides,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let o = self.overrides.clone();
		Ok(ConfigLayer {
			model: Some(ModelLayer {
				vendor: o.vendor,
				family: o.family,
			}),
			provider: Some(ProviderLayer {
				base_url: o.base_url,
				model: o.provider_model,
				..Default::default()
			}),
			annotation: Some(AnnotationLayer {
				trigger: o.trigger,
				shape_policy: o.shape_policy,
				..Default::default()
			}),
			logging: Some(LoggingLayer {
				level: o.log_level,
				format: o.log_format,
			}),
		})
	}
}
