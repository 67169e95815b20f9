//! LzEnc, decode-only.
//!
//! A byte-oriented stream behind a little-endian size word. Control bytes
//! with the top bit clear start a literal run of `control + 1` bytes.
//! With it set, bits 4-6 hold `length - 2` (the all-ones value pulls an
//! extension byte that is added on), and the low nibble joins the next
//! byte as a 12-bit `displacement - 1`. No encoder for this layout ever
//! shipped; encoding reports `UnsupportedOperation`.

use std::io::Cursor;

use crate::errors::CodecError;

use super::{copy_backref, take_u32_le, take_u8};

const LEN_EXT: usize = 7;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = take_u32_le(&mut cur)? as usize;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let at = cur.position() as usize;
        let control = take_u8(&mut cur)? as usize;
        if control & 0x80 == 0 {
            let count = control + 1;
            if out.len() + count > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "literal run overruns the declared size",
                });
            }
            let start = out.len();
            out.resize(start + count, 0);
            super::take_bytes(&mut cur, &mut out[start..])?;
        } else {
            let field = (control >> 4) & 0x7;
            let mut length = field + 2;
            if field == LEN_EXT {
                length += take_u8(&mut cur)? as usize;
            }
            let low = take_u8(&mut cur)? as usize;
            let displacement = ((control & 0xF) << 8 | low) + 1;
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "reference overruns the declared size",
                });
            }
            copy_backref(&mut out, displacement, length, at)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Format;

    fn with_size(size: usize, body: &[u8]) -> Vec<u8> {
        let mut out = (size as u32).to_le_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn literal_runs_decode() {
        let packed = with_size(5, &[0x04, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(decode(&packed).unwrap(), b"hello");
    }

    #[test]
    fn short_reference_decodes() {
        // "abc" then copy 3 from displacement 3
        let packed = with_size(6, &[0x02, b'a', b'b', b'c', 0x90 | 0x0, 0x02]);
        assert_eq!(decode(&packed).unwrap(), b"abcabc");
    }

    #[test]
    fn extended_reference_decodes() {
        // one 'z', then an overlapping run of 9 + 3 more
        let packed = with_size(13, &[0x00, b'z', 0xF0, 0x03, 0x00]);
        assert_eq!(decode(&packed).unwrap(), &[b'z'; 13][..]);
    }

    #[test]
    fn displacement_past_start_is_malformed() {
        let packed = with_size(4, &[0x00, b'a', 0xA0, 0x05]);
        assert!(matches!(
            decode(&packed),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn truncated_run_is_reported() {
        let packed = with_size(8, &[0x07, b'x', b'y']);
        assert!(matches!(
            decode(&packed),
            Err(CodecError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn encode_is_unsupported() {
        assert!(matches!(
            Format::LzEnc.encode(b"data"),
            Err(CodecError::UnsupportedOperation("LzEnc"))
        ));
    }
}
