//! Asynchronous reader of ATM command files
//!
//! # Design
//!
//! The CommandReader uses csv-async configured for space-separated,
//! headerless, unquoted records of varying length: one record per command
//! line. Each record's tokens go through [`parse_tokens`]; malformed lines are
//! logged and skipped so a single bad line never stops an ATM stream.
//!
//! ```text
//! command file → csv-async records → tokens → parse_tokens → Command
//! ```

use crate::io::command_parser::parse_tokens;
use crate::types::{Command, EngineError};
use csv_async::{AsyncReaderBuilder, StringRecord};
use futures::io::AsyncRead;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

/// Streams typed commands out of one ATM command file
pub struct CommandReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
    record: StringRecord,
}

impl CommandReader<Compat<tokio::fs::File>> {
    /// Open the command file at `path`
    ///
    /// # Errors
    ///
    /// `FileNotFound` when the file does not exist, `IoError` for any other
    /// open failure.
    pub async fn open(path: &Path) -> Result<Self, EngineError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                EngineError::from(e)
            }
        })?;

        // Wrap tokio file in a compatibility layer for csv-async
        Ok(Self::new(file.compat()))
    }
}

impl<R: AsyncRead + Unpin + Send> CommandReader<R> {
    /// Create a new CommandReader over an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .has_headers(false)
            .delimiter(b' ')
            .quoting(false)
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_reader(reader);

        Self {
            csv_reader,
            record: StringRecord::new(),
        }
    }

    /// Read the next well-formed command
    ///
    /// Blank and malformed lines are skipped (malformed ones with a
    /// warning). Returns `None` at end of input.
    pub async fn next_command(&mut self) -> Option<Command> {
        loop {
            match self.csv_reader.read_record(&mut self.record).await {
                Ok(false) => return None,
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!("Command file read error: {}", e);
                    continue;
                }
            }

            let tokens: Vec<&str> = self.record.iter().filter(|t| !t.is_empty()).collect();
            if tokens.is_empty() {
                continue;
            }

            let raw = tokens.join(" ");
            match parse_tokens(&raw, &tokens) {
                Ok(command) => return Some(command),
                Err(e) => {
                    let line = self.record.position().map(|p| p.line());
                    tracing::warn!(?line, command = %raw, "Skipping malformed command: {}", e);
                }
            }
        }
    }
}
