//! # I/O Adapter for the IPPcode23 VM
//!
//! This module is the "I/O adapter" collaborator from spec §1: a
//! line-oriented blocking reader for `READ`, and unbuffered writers for
//! `WRITE`/`DPRINT`/`BREAK`.
//!
//! ## Design
//! The dispatcher never touches `std::io` directly; it goes through the
//! small [`LineReader`]/[`LineWriter`] traits here instead of scattering
//! raw `fs`/`io` calls through the VM loop. This keeps the dispatcher
//! testable with an in-memory adapter instead of real stdio.

use std::fs;
use std::io::{self, BufRead, Write};

/// Blocking line-oriented input, used by `READ`.
pub trait LineReader {
    /// Read one line, with the trailing newline stripped. Returns `None`
    /// at end of input (spec: "Empty-or-unreadable input yields Nil").
    fn read_line(&mut self) -> Option<String>;
}

/// Unbuffered text output, used by `WRITE`/`DPRINT`/`BREAK`.
pub trait LineWriter {
    fn write_str(&mut self, s: &str);
}

/// Reads lines from any `BufRead`, e.g. stdin or an opened file.
pub struct BufLineReader<R: BufRead> {
    inner: R,
}

impl<R: BufRead> BufLineReader<R> {
    pub fn new(inner: R) -> Self {
        BufLineReader { inner }
    }
}

impl<R: BufRead> LineReader for BufLineReader<R> {
    fn read_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        match self.inner.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.ends_with('\n') {
                    buf.pop();
                    if buf.ends_with('\r') {
                        buf.pop();
                    }
                }
                Some(buf)
            }
            Err(_) => None,
        }
    }
}

/// Writes straight to any `Write`, flushing after every write so output
/// interleaves correctly with a program's own process (spec: "unbuffered
/// write of a string").
pub struct StreamWriter<W: Write> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        StreamWriter { inner }
    }
}

impl<W: Write> LineWriter for StreamWriter<W> {
    fn write_str(&mut self, s: &str) {
        let _ = self.inner.write_all(s.as_bytes());
        let _ = self.inner.flush();
    }
}

/// Build the `READ` input source: a path if given, else stdin.
pub fn open_input(path: Option<&str>) -> io::Result<Box<dyn LineReader>> {
    match path {
        Some(p) => {
            let file = fs::File::open(p)?;
            Ok(Box::new(BufLineReader::new(io::BufReader::new(file))))
        }
        None => Ok(Box::new(BufLineReader::new(io::BufReader::new(io::stdin())))),
    }
}

/// The standard output writer for `WRITE`.
pub fn stdout_writer() -> impl LineWriter {
    StreamWriter::new(io::stdout())
}

/// The standard error writer for `DPRINT`/`BREAK`/fault diagnostics.
pub fn stderr_writer() -> impl LineWriter {
    StreamWriter::new(io::stderr())
}

/// An in-memory reader/writer pair for tests, avoiding real stdio.
#[cfg(test)]
pub mod test_support {
    use super::{LineReader, LineWriter};

    pub struct VecLineReader {
        lines: std::collections::VecDeque<String>,
    }

    impl VecLineReader {
        pub fn new(lines: Vec<&str>) -> Self {
            VecLineReader {
                lines: lines.into_iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl LineReader for VecLineReader {
        fn read_line(&mut self) -> Option<String> {
            self.lines.pop_front()
        }
    }

    #[derive(Default)]
    pub struct BufferWriter {
        pub buf: String,
    }

    impl LineWriter for BufferWriter {
        fn write_str(&mut self, s: &str) {
            self.buf.push_str(s);
        }
    }
}
