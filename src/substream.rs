//! A bounded, position-independent window over a backing byte source.
//!
//! The view carries its own cursor and rebases every operation onto an
//! absolute offset in the base source, saving and restoring the base's
//! position around its own I/O. Other holders of the base source never
//! observe the view seeking underneath them, and the view keeps working
//! even if they seek the base themselves.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::errors::CodecError;

/// A window of `length` bytes starting at `offset` in a base source.
#[derive(Debug)]
pub struct SubStream<S> {
    base: S,
    offset: u64,
    len: u64,
    /// Fixed-length cap; writes may never extend the view past it.
    cap: Option<u64>,
    pos: u64,
}

impl<S: Seek> SubStream<S> {
    /// A fixed window over existing data.
    ///
    /// Fails with [`CodecError::InvalidRange`] unless
    /// `length > 0 && offset + length <= base.length`.
    pub fn new(mut base: S, offset: u64, length: u64) -> Result<Self, CodecError> {
        let base_len = measured_len(&mut base)?;
        if length == 0 || offset.checked_add(length).map_or(true, |end| end > base_len) {
            return Err(CodecError::InvalidRange {
                offset,
                length,
                base: base_len,
            });
        }
        Ok(Self {
            base,
            offset,
            len: length,
            cap: Some(length),
            pos: 0,
        })
    }

    /// An initially empty window that grows as it is written, up to an
    /// optional cap.
    pub fn growable(mut base: S, offset: u64, cap: Option<u64>) -> Result<Self, CodecError> {
        let base_len = measured_len(&mut base)?;
        if offset > base_len {
            return Err(CodecError::InvalidRange {
                offset,
                length: 0,
                base: base_len,
            });
        }
        Ok(Self {
            base,
            offset,
            len: 0,
            cap,
            pos: 0,
        })
    }

    pub fn length(&self) -> u64 {
        self.len
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Adjust the view's logical length without touching the base.
    pub fn set_length(&mut self, length: u64) -> Result<(), CodecError> {
        if let Some(cap) = self.cap {
            if length > cap {
                return Err(CodecError::OutOfRangeWrite {
                    pos: self.len,
                    len: (length - self.len) as usize,
                    cap,
                });
            }
        }
        self.len = length;
        self.pos = self.pos.min(length);
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.base
    }
}

fn measured_len<S: Seek>(base: &mut S) -> Result<u64, CodecError> {
    let here = base.stream_position()?;
    let end = base.seek(SeekFrom::End(0))?;
    base.seek(SeekFrom::Start(here))?;
    Ok(end)
}

/// Run `op` against the base with its position parked at `at`, restoring
/// whatever position the base held before.
fn positioned<S: Seek, T>(
    base: &mut S,
    at: u64,
    op: impl FnOnce(&mut S) -> io::Result<T>,
) -> io::Result<T> {
    let saved = base.stream_position()?;
    base.seek(SeekFrom::Start(at))?;
    let out = op(base);
    base.seek(SeekFrom::Start(saved))?;
    out
}

impl<S: Read + Seek> Read for SubStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(remaining) as usize;
        let at = self.offset + self.pos;
        let n = positioned(&mut self.base, at, |base| base.read(&mut buf[..want]))?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<S: Write + Seek> Write for SubStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let end = self.pos + buf.len() as u64;
        if let Some(cap) = self.cap {
            if end > cap {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    CodecError::OutOfRangeWrite {
                        pos: self.pos,
                        len: buf.len(),
                        cap,
                    },
                ));
            }
        }
        let at = self.offset + self.pos;
        let n = positioned(&mut self.base, at, |base| base.write(buf))?;
        self.pos += n as u64;
        self.len = self.len.max(self.pos);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.base.flush()
    }
}

impl<S: Seek> Seek for SubStream<S> {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let target = match from {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(d) => self.pos as i64 + d,
            SeekFrom::End(d) => self.len as i64 + d,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of sub-stream",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn window_reads_its_slice_only() {
        let base = Cursor::new(b"0123456789".to_vec());
        let mut view = SubStream::new(base, 2, 5).unwrap();
        let mut out = Vec::new();
        view.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"23456");
    }

    #[test]
    fn ctor_rejects_bad_ranges() {
        for (offset, length) in [(0u64, 0u64), (0, 11), (10, 1), (8, 3)] {
            let base = Cursor::new(b"0123456789".to_vec());
            match SubStream::new(base, offset, length) {
                Err(CodecError::InvalidRange { base: 10, .. }) => {}
                other => panic!("({offset},{length}) should be invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn base_position_is_preserved() {
        let mut base = Cursor::new(b"0123456789".to_vec());
        base.set_position(7);
        let mut view = SubStream::new(&mut base, 1, 4).unwrap();
        let mut buf = [0u8; 2];
        view.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"12");
        assert_eq!(view.into_inner().position(), 7);
    }

    #[test]
    fn seek_is_view_relative() {
        let base = Cursor::new(b"0123456789".to_vec());
        let mut view = SubStream::new(base, 4, 4).unwrap();
        view.seek(SeekFrom::End(-1)).unwrap();
        let mut buf = [0u8; 1];
        view.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"7");
        assert_eq!(view.position(), 4);
    }

    #[test]
    fn growable_view_extends_until_cap() {
        let base = Cursor::new(vec![0u8; 8]);
        let mut view = SubStream::growable(base, 2, Some(4)).unwrap();
        assert_eq!(view.length(), 0);
        view.write_all(b"abcd").unwrap();
        assert_eq!(view.length(), 4);

        let err = view.write_all(b"e").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let inner = err.into_inner().unwrap();
        assert!(matches!(
            inner.downcast_ref::<CodecError>(),
            Some(CodecError::OutOfRangeWrite { cap: 4, .. })
        ));

        assert_eq!(&view.into_inner().into_inner()[..8], b"\0\0abcd\0\0");
    }

    #[test]
    fn fixed_window_write_in_place() {
        let base = Cursor::new(b"0123456789".to_vec());
        let mut view = SubStream::new(base, 3, 4).unwrap();
        view.write_all(b"XY").unwrap();
        assert_eq!(view.position(), 2);
        assert_eq!(view.into_inner().into_inner(), b"012XY56789");
    }

    #[test]
    fn set_length_respects_cap() {
        let base = Cursor::new(vec![0u8; 8]);
        let mut view = SubStream::growable(base, 0, Some(6)).unwrap();
        view.set_length(5).unwrap();
        assert_eq!(view.length(), 5);
        assert!(matches!(
            view.set_length(7),
            Err(CodecError::OutOfRangeWrite { cap: 6, .. })
        ));
    }
}
