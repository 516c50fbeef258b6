//! Per-connection inbound line buffer
//!
//! Accumulates raw bytes from non-blocking reads and hands out one complete
//! `\n`-terminated frame at a time. Bytes after the last delimiter stay in
//! place until the rest of their line arrives.

use tracing::trace;

use crate::error::FrameError;

/// Frame delimiter
pub const DELIMITER: u8 = b'\n';

/// Framed inbound buffer
///
/// `max_frame_len` bounds the length of every line, delimiter excluded. The
/// limit is checked as frames are extracted, so complete lines ahead of an
/// oversized one are still handed out first.
#[derive(Debug)]
pub struct FramedBuffer {
    bytes: Vec<u8>,
    max_frame_len: usize,
}

impl FramedBuffer {
    /// Create an empty buffer with the given line limit
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max_frame_len,
        }
    }

    /// Append bytes to the tail
    ///
    /// Fails only if the buffer cannot grow.
    pub fn append(&mut self, data: &[u8]) -> Result<(), FrameError> {
        self.bytes.try_reserve(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Extract the next complete frame, without its delimiter
    ///
    /// Returns `Ok(None)` when no delimiter is buffered yet. Call repeatedly
    /// to drain every frame from one read. Fails with `FrameTooLarge` when
    /// the next line, complete or not, is longer than the limit.
    pub fn extract_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(pos) = self.bytes.iter().position(|&b| b == DELIMITER) else {
            if self.bytes.len() > self.max_frame_len {
                return Err(self.too_large());
            }
            return Ok(None);
        };
        if pos > self.max_frame_len {
            return Err(self.too_large());
        }

        let mut frame: Vec<u8> = self.bytes.drain(..=pos).collect();
        frame.pop();
        trace!(len = frame.len(), remaining = self.bytes.len(), "Extracted frame");
        Ok(Some(frame))
    }

    fn too_large(&self) -> FrameError {
        FrameError::FrameTooLarge {
            limit: self.max_frame_len,
        }
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Buffered bytes not yet returned as a frame
    pub fn pending(&self) -> &[u8] {
        &self.bytes
    }

    /// Discard everything buffered
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
