use crate::command::{Stdin, Stdout, Streams};
use std::cell::RefCell;
use std::io::{Cursor, Read, Result as IoResult, Write};
use std::process::Stdio;
use std::rc::Rc;

/// Hands out the standard streams for each command invocation and for the
/// shell's own messages.
pub trait StreamProvider {
    /// Fresh handles to the standard streams.
    fn streams(&self) -> Streams;
}

/// The streams of the shell process itself; children inherit them.
#[derive(Debug, Default, Clone, Copy)]
pub struct InheritedStreams;

impl StreamProvider for InheritedStreams {
    fn streams(&self) -> Streams {
        Streams {
            stdin: Box::new(InheritedStdin(std::io::stdin())),
            stdout: Box::new(std::io::stdout()),
            stderr: Box::new(std::io::stderr()),
        }
    }
}

struct InheritedStdin(std::io::Stdin);

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::inherit()
    }
}

/// Streams that collect everything written to stdout and stderr in memory.
///
/// External programs started with these streams get null handles.
#[derive(Debug, Default, Clone)]
pub struct CapturedStreams {
    stdout: Rc<RefCell<Vec<u8>>>,
    stderr: Rc<RefCell<Vec<u8>>>,
}

impl CapturedStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to stdout so far, lossily decoded.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout.borrow()).into_owned()
    }

    /// Everything written to stderr so far, lossily decoded.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr.borrow()).into_owned()
    }
}

impl StreamProvider for CapturedStreams {
    fn streams(&self) -> Streams {
        Streams {
            stdin: Box::new(MemReader::new(Vec::new())),
            stdout: Box::new(MemWriter::sharing(self.stdout.clone())),
            stderr: Box::new(MemWriter::sharing(self.stderr.clone())),
        }
    }
}

/// Memory-backed reader for builtins.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl Stdin for MemReader {
    /// External programs cannot read from process memory, so they get a null handle.
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

/// Memory-backed writer for capturing output.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Writer appending to a buffer that others may hold as well.
    pub fn sharing(buf: Rc<RefCell<Vec<u8>>>) -> Self {
        Self { buf }
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let rc = Rc::new(RefCell::new(Vec::new()));
        (Self::sharing(rc.clone()), rc)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Stdout for MemWriter {
    fn stdio(&mut self) -> Stdio {
        Stdio::null()
    }
}
