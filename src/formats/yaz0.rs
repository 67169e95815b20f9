//! YAZ0: the interleaved sibling of YAY0.
//!
//! `"Yaz0"`, the decompressed size, eight reserved bytes, then a single
//! stream of flag bytes (MSB first) mixing literals and references
//! in-line. Reference grading matches YAY0, with the extension byte
//! following the reference word directly.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_bytes, take_u16_be, take_u8, Endian};

const MAGIC: &[u8; 4] = b"Yaz0";

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x111;
const MAX_DISPLACEMENT: usize = 0x1000;

pub fn decode(input: &[u8], endian: Endian) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let mut magic = [0u8; 4];
    take_bytes(&mut cur, &mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "missing Yaz0 magic",
        });
    }
    let mut size_bytes = [0u8; 4];
    take_bytes(&mut cur, &mut size_bytes)?;
    let size = match endian {
        Endian::Le => u32::from_le_bytes(size_bytes),
        Endian::Be => u32::from_be_bytes(size_bytes),
    } as usize;
    let mut reserved = [0u8; 8];
    take_bytes(&mut cur, &mut reserved)?;

    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        let flags = take_u8(&mut cur)?;
        for bit in (0..8).rev() {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                out.push(take_u8(&mut cur)?);
            } else {
                let at = cur.position() as usize;
                let word = take_u16_be(&mut cur)?;
                let displacement = ((word & 0xFFF) as usize) + 1;
                let nibble = (word >> 12) as usize;
                let length = if nibble == 0 {
                    take_u8(&mut cur)? as usize + 0x12
                } else {
                    nibble + 2
                };
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: at,
                        reason: "reference overruns the declared size",
                    });
                }
                copy_backref(&mut out, displacement, length, at)?;
            }
        }
    }
    Ok(out)
}

struct Price;

impl PriceCalculator for Price {
    fn literal_price(&self, _unit: u16) -> u32 {
        9
    }
    fn match_price(&self, length: usize, _displacement: usize) -> u32 {
        if length > 0x11 {
            25
        } else {
            17
        }
    }
}

pub fn encode(input: &[u8], endian: Endian) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    out.extend_from_slice(MAGIC);
    match endian {
        Endian::Le => out.extend_from_slice(&(input.len() as u32).to_le_bytes()),
        Endian::Be => out.extend_from_slice(&(input.len() as u32).to_be_bytes()),
    }
    out.extend_from_slice(&[0u8; 8]);

    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Literal { .. }) {
                flags |= 0x80 >> i;
            }
        }
        out.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => out.push(input[*position]),
                Token::Match(m) => {
                    let disp = (m.displacement - 1) as u16;
                    if m.length > 0x11 {
                        out.extend_from_slice(&disp.to_be_bytes());
                        out.push((m.length - 0x12) as u8);
                    } else {
                        let word = (((m.length - 2) as u16) << 12) | disp;
                        out.extend_from_slice(&word.to_be_bytes());
                    }
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_both_endians() {
        let input = b"interleaved interleaved interleaved data";
        for endian in [Endian::Le, Endian::Be] {
            let packed = encode(input, endian).unwrap();
            assert_eq!(&packed[..4], MAGIC);
            assert_eq!(decode(&packed, endian).unwrap(), input);
        }
    }

    #[test]
    fn extended_lengths_roundtrip() {
        let mut input = b"pad ".to_vec();
        input.extend(std::iter::repeat(b'=').take(0x300));
        let packed = encode(&input, Endian::Be).unwrap();
        assert_eq!(decode(&packed, Endian::Be).unwrap(), input);
    }

    #[test]
    fn reserved_words_are_zero() {
        let packed = encode(b"abc", Endian::Be).unwrap();
        assert_eq!(&packed[8..16], &[0u8; 8]);
    }
}
