// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `tutor`: chat lessons and inline code annotations from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tutor_annotate::{ShapePolicy, TriggerMode};
use tutor_chat::TutorParticipant;
use tutor_cli_config::{CliOverrides, LogFormat, LogLevel};

mod annotate;
mod chat;
mod interrupt;
mod logging;
mod models;
mod terminal;
mod version;

#[derive(Parser, Debug)]
#[command(
	name = "tutor",
	about = "A code tutor: interactive lessons and inline suggestions",
	version
)]
struct Args {
	/// Extra config file, applied over the user and workspace files
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Model vendor to select
	#[arg(long, global = true)]
	vendor: Option<String>,

	/// Model family to select
	#[arg(long, global = true)]
	family: Option<String>,

	/// Chat completions base URL
	#[arg(long, global = true, value_name = "URL")]
	base_url: Option<String>,

	/// Model name sent to the provider
	#[arg(long, global = true)]
	model: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, global = true)]
	log_level: Option<LogLevel>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Start an interactive tutoring chat
	Chat {
		/// Replace the tutor instruction with the contents of this file
		#[arg(long, value_name = "PATH")]
		instruction: Option<PathBuf>,
	},
	/// Stream suggestions onto the lines of a source file
	Annotate {
		file: PathBuf,

		/// First line to send (1-based)
		#[arg(long)]
		start: Option<usize>,

		/// Last line to send (1-based, inclusive)
		#[arg(long)]
		end: Option<usize>,

		/// Language identifier; inferred from the extension by default
		#[arg(long)]
		language: Option<String>,

		/// When to attempt a parse (depth, closing-brace)
		#[arg(long)]
		trigger: Option<TriggerMode>,

		/// Record shape checking (validated, legacy)
		#[arg(long)]
		shape_policy: Option<ShapePolicy>,
	},
	/// Show version and build information
	Version,
}

impl Args {
	fn overrides(&self) -> CliOverrides {
		let (trigger, shape_policy) = match &self.command {
			Command::Annotate {
				trigger,
				shape_policy,
				..
			} => (*trigger, *shape_policy),
			_ => (None, None),
		};
		CliOverrides {
			config_file: self.config.clone(),
			vendor: self.vendor.clone(),
			family: self.family.clone(),
			base_url: self.base_url.clone(),
			provider_model: self.model.clone(),
			trigger,
			shape_policy,
			log_level: self.log_level,
			log_format: self.json_logs.then_some(LogFormat::Json),
		}
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config = tutor_cli_config::load_config_with_cli(args.overrides())
		.context("failed to load configuration")?;
	logging::init_tracing(&config.logging);

	tracing::debug!(
		vendor = %config.model.vendor,
		family = %config.model.family,
		"starting tutor"
	);

	let catalog = Arc::new(models::build_registry(&config)?);
	let selector = models::selector(&config);

	match args.command {
		Command::Chat { instruction } => {
			let mut participant = TutorParticipant::new(catalog, selector);
			if let Some(path) = instruction {
				let text = std::fs::read_to_string(&path)
					.with_context(|| format!("failed to read {}", path.display()))?;
				participant = participant.with_instruction(text);
			}
			chat::run(participant).await
		}
		Command::Annotate {
			file,
			start,
			end,
			language,
			..
		} => {
			annotate::run(
				&config,
				catalog,
				annotate::AnnotateOptions {
					file: &file,
					language,
					start,
					end,
				},
			)
			.await
		}
		Command::Version => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn args_are_well_formed() {
		Args::command().debug_assert();
	}

	#[test]
	fn annotate_flags_become_overrides() {
		let args = Args::try_parse_from([
			"tutor",
			"annotate",
			"main.py",
			"--trigger",
			"closing-brace",
			"--shape-policy",
			"legacy",
			"--family",
			"gpt-4o-mini",
			"--json-logs",
		])
		.unwrap();

		let overrides = args.overrides();
		assert_eq!(overrides.trigger, Some(TriggerMode::ClosingBrace));
		assert_eq!(overrides.shape_policy, Some(ShapePolicy::Legacy));
		assert_eq!(overrides.family.as_deref(), Some("gpt-4o-mini"));
		assert_eq!(overrides.log_format, Some(LogFormat::Json));
		assert!(overrides.config_file.is_none());
	}

	#[test]
	fn chat_has_no_annotation_overrides() {
		let args = Args::try_parse_from(["tutor", "--log-level", "debug", "chat"]).unwrap();
		let overrides = args.overrides();
		assert_eq!(overrides.log_level, Some(LogLevel::Debug));
		assert!(overrides.trigger.is_none());
		assert!(overrides.log_format.is_none());
	}

	#[test]
	fn unknown_trigger_is_rejected() {
		assert!(Args::try_parse_from(["tutor", "annotate", "a.py", "--trigger", "eager"]).is_err());
	}
}
