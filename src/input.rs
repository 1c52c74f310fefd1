//! Sources of command lines for the read loop.

use crate::signals;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// What a single read from a [`LineSource`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A complete line, without its trailing newline.
    Line(String),
    /// The user pressed Ctrl-C while the line was being edited, or SIGINT
    /// arrived while the read was blocked.
    Interrupted,
    /// No more input will arrive.
    Eof,
}

/// Something the shell can read command lines from.
pub trait LineSource {
    /// Shows `prompt` (which may be empty) and blocks until an event is available.
    ///
    /// An `Err` means the input can no longer be read and is fatal to the shell.
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent>;
}

/// Interactive line editor backed by `rustyline`.
///
/// Non-empty lines are kept in the editor's in-memory history for the session.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(ReadEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::Interrupted => {
                // Reported here, so the loop must not announce it a second time.
                signals::take_pending();
                Ok(ReadEvent::Interrupted)
            }
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(err) => Err(err).context("error reading line"),
        }
    }
}

/// Reader for input that is not a terminal, such as a pipe or a redirected file.
///
/// The prompt is written to `out` before every read. Lines are decoded lossily, so
/// bytes that are not valid UTF-8 become U+FFFD instead of ending the session. A
/// final line without a trailing newline is still returned.
pub struct PipedSource<R, W> {
    reader: R,
    out: W,
    partial: Vec<u8>,
}

impl<R: BufRead, W: Write> PipedSource<R, W> {
    pub fn new(reader: R, out: W) -> Self {
        Self {
            reader,
            out,
            partial: Vec::new(),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        line
    }
}

impl<R: BufRead, W: Write> LineSource for PipedSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        self.out
            .write_all(prompt.as_bytes())
            .and_then(|()| self.out.flush())
            .context("failed to write prompt")?;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                // A SIGINT interrupts the blocked read. Bytes already collected stay
                // in `partial` for the next call.
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    if signals::take_pending() {
                        return Ok(ReadEvent::Interrupted);
                    }
                    continue;
                }
                Err(err) => return Err(err).context("error reading line"),
            };

            if available.is_empty() {
                if self.partial.is_empty() {
                    return Ok(ReadEvent::Eof);
                }
                return Ok(ReadEvent::Line(self.take_line()));
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.partial.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    return Ok(ReadEvent::Line(self.take_line()));
                }
                None => {
                    let len = available.len();
                    self.partial.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// A fixed sequence of events, for driving the shell without a terminal.
///
/// Every prompt passed to [`LineSource::read_line`] is recorded. Once the script
/// runs out, further reads report [`ReadEvent::Eof`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    events: VecDeque<ReadEvent>,
    prompts: Vec<String>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = ReadEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    /// A script made only of lines.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().map(|l| ReadEvent::Line(l.to_string())))
    }

    /// The prompts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of events not consumed yet.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(ReadEvent::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    /// Fails every other read with `Interrupted`, like a read hit by an unrelated signal.
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        fail_next: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.fail_next = !self.fail_next;
            if self.fail_next {
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_piped_source_writes_prompt_before_each_read() {
        let mut src = PipedSource::new(Cursor::new(b"ls -l\nexit\n".to_vec()), Vec::new());
        assert_eq!(src.read_line("a> ").unwrap(), ReadEvent::Line("ls -l".into()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line("exit".into()));
        assert_eq!(src.read_line("b> ").unwrap(), ReadEvent::Eof);
        assert_eq!(String::from_utf8(src.out).unwrap(), "a> b> ");
    }

    #[test]
    fn test_piped_source_decodes_invalid_utf8_lossily() {
        let input = b"echo \xff\xfe\necho after\n".to_vec();
        let mut src = PipedSource::new(Cursor::new(input), Vec::new());
        assert_eq!(
            src.read_line("").unwrap(),
            ReadEvent::Line("echo \u{fffd}\u{fffd}".into())
        );
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line("echo after".into()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Eof);
    }

    #[test]
    fn test_piped_source_returns_last_line_without_newline() {
        let mut src = PipedSource::new(Cursor::new(b"\npwd".to_vec()), Vec::new());
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line(String::new()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line("pwd".into()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Eof);
    }

    #[test]
    fn test_piped_source_retries_reads_interrupted_without_sigint() {
        let reader = Flaky {
            inner: Cursor::new(b"echo one\necho two\n".to_vec()),
            fail_next: false,
        };
        // A tiny buffer forces several reads per line.
        let mut src = PipedSource::new(BufReader::with_capacity(3, reader), Vec::new());
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line("echo one".into()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Line("echo two".into()));
        assert_eq!(src.read_line("").unwrap(), ReadEvent::Eof);
    }

    #[test]
    fn test_scripted_source_records_prompts_and_ends_with_eof() {
        let mut src = ScriptedSource::from_lines(["ls", "exit"]);
        assert_eq!(src.read_line("a> ").unwrap(), ReadEvent::Line("ls".into()));
        assert_eq!(src.read_line("b> ").unwrap(), ReadEvent::Line("exit".into()));
        assert_eq!(src.remaining(), 0);
        assert_eq!(src.read_line("c> ").unwrap(), ReadEvent::Eof);
        assert_eq!(src.prompts(), ["a> ", "b> ", "c> "]);
    }
}
