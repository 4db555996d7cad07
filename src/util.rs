//! # Buffer Writing Utilities
//!
//! Helpers shared by the topic and payload builders for writing text into
//! caller-supplied byte buffers.

use core::fmt;

use crate::error::Error;

/// A cursor over a fixed byte buffer that refuses to write past its end.
///
/// Builders push their fields and call [`SliceWriter::terminate`], which
/// appends the NUL terminator and yields the text length.
pub(crate) struct SliceWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> SliceWriter<'b> {
    pub(crate) fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn push_str(&mut self, s: &str) -> Result<(), Error> {
        let bytes = s.as_bytes();
        let end = self.pos + bytes.len();
        let slot = self.buf.get_mut(self.pos..end).ok_or(Error::BufferTooSmall)?;
        slot.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub(crate) fn push_byte(&mut self, byte: u8) -> Result<(), Error> {
        *self.buf.get_mut(self.pos).ok_or(Error::BufferTooSmall)? = byte;
        self.pos += 1;
        Ok(())
    }

    /// Writes the NUL terminator and returns the length of the text before it.
    pub(crate) fn terminate(mut self) -> Result<usize, Error> {
        let len = self.pos;
        self.push_byte(0)?;
        Ok(len)
    }
}

impl fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

/// Runs a builder over `buf`, leaving an empty string behind if it fails so a
/// truncated prefix is never mistaken for valid output.
pub(crate) fn build_into<F>(buf: &mut [u8], build: F) -> Result<usize, Error>
where
    F: FnOnce(&mut SliceWriter<'_>) -> Result<(), Error>,
{
    let mut writer = SliceWriter::new(buf);
    let result = build(&mut writer).and_then(|()| writer.terminate());
    if result.is_err()
        && let Some(first) = buf.first_mut()
    {
        *first = 0;
    }
    result
}

/// Returns the bytes before the first NUL, or the whole slice if there is none.
pub(crate) fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}
