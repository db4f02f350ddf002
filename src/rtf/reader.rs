//! Byte source with pushback.
//!
//! The lexer needs to look one or two bytes ahead (control word terminators,
//! `\*` after `{`, malformed hex escapes) and put them back unconsumed.

use smallvec::SmallVec;
use std::io::{self, BufRead, BufReader, Read};

/// Buffered reader that can return bytes to the front of the stream.
#[derive(Debug)]
pub(crate) struct PushbackReader<R> {
    inner: BufReader<R>,
    /// Pushed-back bytes, the next byte to read is the last element
    pushed: SmallVec<[u8; 4]>,
}

impl<R: Read> PushbackReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pushed: SmallVec::new(),
        }
    }

    /// Read the next byte, `None` at end of input.
    pub(crate) fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed.pop() {
            return Ok(Some(byte));
        }

        loop {
            match self.inner.fill_buf() {
                Ok(buf) => {
                    let byte = buf.first().copied();
                    if byte.is_some() {
                        self.inner.consume(1);
                    }
                    return Ok(byte);
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Push a byte back; it is returned by the next `read_byte`.
    #[inline]
    pub(crate) fn unread(&mut self, byte: u8) {
        self.pushed.push(byte);
    }

    /// Skip up to `count` bytes, stopping early at end of input.
    pub(crate) fn skip(&mut self, mut count: u64) -> io::Result<()> {
        while count > 0 {
            if self.pushed.pop().is_some() {
                count -= 1;
                continue;
            }
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf.len(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available == 0 {
                break;
            }
            let step = available.min(usize::try_from(count).unwrap_or(usize::MAX));
            self.inner.consume(step);
            count -= step as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_and_unread() {
        let mut reader = PushbackReader::new(Cursor::new(b"ab".to_vec()));
        assert_eq!(reader.read_byte().unwrap(), Some(b'a'));
        reader.unread(b'a');
        assert_eq!(reader.read_byte().unwrap(), Some(b'a'));
        assert_eq!(reader.read_byte().unwrap(), Some(b'b'));
        assert_eq!(reader.read_byte().unwrap(), None);
    }

    #[test]
    fn test_unread_is_lifo() {
        let mut reader = PushbackReader::new(Cursor::new(b"z".to_vec()));
        reader.unread(b'*');
        reader.unread(b'\\');
        assert_eq!(reader.read_byte().unwrap(), Some(b'\\'));
        assert_eq!(reader.read_byte().unwrap(), Some(b'*'));
        assert_eq!(reader.read_byte().unwrap(), Some(b'z'));
    }

    #[test]
    fn test_skip_past_end() {
        let mut reader = PushbackReader::new(Cursor::new(b"abcdef".to_vec()));
        reader.unread(b'x');
        reader.skip(3).unwrap();
        assert_eq!(reader.read_byte().unwrap(), Some(b'c'));
        reader.skip(100).unwrap();
        assert_eq!(reader.read_byte().unwrap(), None);
    }

    #[test]
    fn test_read_error_propagates() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }
        let mut reader = PushbackReader::new(Failing);
        assert!(reader.read_byte().is_err());
    }
}
