//! In-memory stream for unit tests
//!
//! Scripted reads (data chunks, errors, end of stream) and captured writes.
//! With nothing queued, reads report `WouldBlock` like a drained non-blocking
//! socket.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

#[derive(Debug, Default)]
pub struct MockStream {
    reads: VecDeque<io::Result<Vec<u8>>>,
    eof: bool,
    written: Vec<u8>,
    fail_writes: bool,
}

impl MockStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the next read
    pub fn push_read(&mut self, data: &[u8]) {
        self.reads.push_back(Ok(data.to_vec()));
    }

    /// Queue an error for the next read
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.reads.push_back(Err(kind.into()));
    }

    /// Report end of stream once queued reads are consumed
    pub fn close(&mut self) {
        self.eof = true;
    }

    /// Make every write fail with a broken pipe
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Lines written so far, without delimiters
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines written so far; clears the capture
    pub fn take_lines(&mut self) -> Vec<String> {
        let lines = self.lines();
        self.written.clear();
        lines
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(Ok(data.split_off(n)));
                }
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None if self.eof => Ok(0),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
