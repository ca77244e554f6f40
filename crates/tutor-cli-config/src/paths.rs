// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::{Path, PathBuf};

use crate::ConfigError;

pub const APP_DIR: &str = "code-tutor";
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved config file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// `$XDG_CONFIG_HOME/code-tutor/config.toml`
	pub user_config_file: PathBuf,
	/// `<cwd>/.code-tutor/config.toml`
	pub workspace_config_file: PathBuf,
}

impl PathsConfig {
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| self.user_config_file.clone())
	}
}

/// Resolves paths from `XDG_CONFIG_HOME` (or `~/.config`) and the current
/// directory.
pub fn resolve_paths() -> Result<PathsConfig, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
		Some(dir) => PathBuf::from(dir),
		None => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};
	let cwd = std::env::current_dir()?;
	let paths = paths_under(&config_home, &cwd);

	tracing::debug!(
			user = %paths.user_config_file.display(),
			workspace = %paths.workspace_config_file.display(),
			"resolved config paths"
	);
	Ok(paths)
}

pub fn paths_under(config_home: &Path, workspace: &Path) -> PathsConfig {
	PathsConfig {
		user_config_file: config_home.join(APP_DIR).join(CONFIG_FILE),
		workspace_config_file: workspace_config_path(workspace),
	}
}

pub fn workspace_config_path(workspace: &Path) -> PathBuf {
	workspace.join(format!(".{APP_DIR}")).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_are_rooted_at_config_home_and_workspace() {
		let paths = paths_under(Path::new("/home/u/.config"), Path::new("/src/project"));
		assert_eq!(
			paths.user_config_file,
			PathBuf::from("/home/u/.config/code-tutor/config.toml")
		);
		assert_eq!(
			paths.workspace_config_file,
			PathBuf::from("/src/project/.code-tutor/config.toml")
		);
		assert_eq!(paths.config_dir(), PathBuf::from("/home/u/.config/code-tutor"));
	}
}
