// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `tutor chat`: an interactive tutoring session on stdin/stdout.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tutor_chat::{ChatHistory, ChatRequest, TutorParticipant};
use tutor_common_core::TutorError;

use crate::interrupt::run_interruptible;
use crate::terminal::WriterSink;

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

pub async fn run(participant: TutorParticipant) -> Result<()> {
	println!("Ask the tutor anything, or start a lesson with /teach <topic>. /exit to leave.");
	let stdin = BufReader::new(tokio::io::stdin());
	repl(&participant, stdin, std::io::stdout()).await
}

/// Reads prompts line by line until end of input or an exit command.
pub async fn repl<R, W>(participant: &TutorParticipant, input: R, out: W) -> Result<()>
where
	R: AsyncBufRead + Unpin,
	W: Write,
{
	let mut lines = input.lines();
	let mut history = ChatHistory::new();
	let mut sink = WriterSink::new(out);

	loop {
		prompt(&mut sink)?;
		let Some(line) = lines.next_line().await.context("failed to read input")? else {
			break;
		};

		let request = ChatRequest::parse(&line);
		if request.prompt.is_empty() && request.command.is_none() {
			continue;
		}
		if let Some(command) = &request.command {
			if EXIT_COMMANDS.contains(&command.as_str()) {
				break;
			}
		}

		let cancel = CancellationToken::new();
		let result = run_interruptible(
			participant.handle(&request, history.turns(), &mut sink, cancel.clone()),
			&cancel,
		)
		.await;

		match result {
			Ok(response) => {
				history.push_request(request.prompt, request.command);
				history.push_response(response);
				debug!(turns = history.len(), "turn recorded");
				writeln!(sink.writer())?;
			}
			Err(e @ TutorError::NoModelAvailable { .. }) => {
				writeln!(sink.writer(), "{e}. Check the [model] and [provider] settings.")?;
			}
			Err(e) => {
				warn!(error = %e, "chat request failed");
				writeln!(sink.writer(), "\nerror: {e}")?;
			}
		}
	}
	Ok(())
}

fn prompt<W: Write>(sink: &mut WriterSink<W>) -> Result<()> {
	let out = sink.writer();
	write!(out, "> ")?;
	out.flush()?;
	Ok(())
}
