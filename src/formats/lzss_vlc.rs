//! LZSS with variable-length-coded integers and no upper bounds.
//!
//! All integers are 7-bit groups, low group first, bit 7 flagging a
//! continuation. The stream opens with the decompressed size; records are
//! either `displacement >= 1` followed by `length - 4`, or a zero marker
//! followed by a literal run (`count`, then that many raw bytes). Lengths
//! and displacements are unbounded, clamped only by the data itself.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_u8};

const MIN_LENGTH: usize = 4;

fn read_vlc(cur: &mut Cursor<&[u8]>) -> Result<u64, CodecError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let at = cur.position() as usize;
        let byte = take_u8(cur)?;
        if shift >= 63 {
            return Err(CodecError::MalformedToken {
                offset: at,
                reason: "variable-length integer too long",
            });
        }
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn write_vlc(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(group);
            return;
        }
        out.push(group | 0x80);
    }
}

fn vlc_len(value: u64) -> u32 {
    let mut groups = 1;
    let mut v = value >> 7;
    while v != 0 {
        groups += 1;
        v >>= 7;
    }
    groups
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = read_vlc(&mut cur)? as usize;
    let mut out = Vec::with_capacity(size);

    while out.len() < size {
        let at = cur.position() as usize;
        let marker = read_vlc(&mut cur)? as usize;
        if marker == 0 {
            let count = read_vlc(&mut cur)? as usize;
            if count == 0 || out.len() + count > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "literal run out of range",
                });
            }
            let start = out.len();
            out.resize(start + count, 0);
            super::take_bytes(&mut cur, &mut out[start..])?;
        } else {
            let length = read_vlc(&mut cur)? as usize + MIN_LENGTH;
            if out.len() + length > size {
                return Err(CodecError::MalformedToken {
                    offset: at,
                    reason: "reference overruns the declared size",
                });
            }
            copy_backref(&mut out, marker, length, at)?;
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
    }
    fn match_price(&self, length: usize, displacement: usize) -> u32 {
        8 * (vlc_len(displacement as u64) + vlc_len((length - MIN_LENGTH) as u64))
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        FindLimitations::UNBOUNDED,
        1,
        FindLimitations::UNBOUNDED,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    write_vlc(&mut out, input.len() as u64);

    let mut run: Vec<u8> = Vec::new();
    for token in &tokens {
        match token {
            Token::Literal { position } => run.push(input[*position]),
            Token::Match(m) => {
                flush_run(&mut out, &mut run);
                write_vlc(&mut out, m.displacement as u64);
                write_vlc(&mut out, (m.length - MIN_LENGTH) as u64);
            }
        }
    }
    flush_run(&mut out, &mut run);
    Ok(out)
}

fn flush_run(out: &mut Vec<u8>, run: &mut Vec<u8>) {
    if !run.is_empty() {
        write_vlc(out, 0);
        write_vlc(out, run.len() as u64);
        out.extend_from_slice(run);
        run.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlc_integers_roundtrip() {
        let mut buf = Vec::new();
        for v in [0u64, 1, 0x7F, 0x80, 0x3FFF, 0x4000, u32::MAX as u64] {
            buf.clear();
            write_vlc(&mut buf, v);
            assert_eq!(buf.len(), vlc_len(v) as usize);
            let mut cur = Cursor::new(buf.as_slice());
            assert_eq!(read_vlc(&mut cur).unwrap(), v);
        }
    }

    #[test]
    fn unbounded_reference_spans_the_whole_input() {
        // one long self-extending reference across 2 KiB of zeros
        let input = vec![0u8; 0x800];
        let packed = encode(&input).unwrap();
        assert!(packed.len() < 16);
        assert_eq!(decode(&packed).unwrap(), input);
    }

    #[test]
    fn mixed_content_roundtrips() {
        let mut input = Vec::new();
        for i in 0..64u32 {
            input.extend_from_slice(format!("chunk-{:03} ", i % 9).as_bytes());
        }
        assert_eq!(decode(&encode(&input).unwrap()).unwrap(), input);
    }

    #[test]
    fn empty_input_roundtrips() {
        assert_eq!(decode(&encode(&[]).unwrap()).unwrap(), Vec::<u8>::new());
    }
}
