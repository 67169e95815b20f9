//! LZSS under the `"SSZL"` header.
//!
//! Flag bytes are consumed LSB-first, a set bit taking one verbatim byte.
//! References are little-endian words with `displacement - 1` in the low
//! twelve bits and `length - 3` in the top nibble.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_bytes, take_u16_le, take_u32_le, take_u8};

const MAGIC: &[u8; 4] = b"SSZL";

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x12;
const MAX_DISPLACEMENT: usize = 0x1000;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let mut magic = [0u8; 4];
    take_bytes(&mut cur, &mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::MalformedToken {
            offset: 0,
            reason: "missing SSZL magic",
        });
    }
    let size = take_u32_le(&mut cur)? as usize;

    let mut out = Vec::with_capacity(size);
    while out.len() < size {
        let flags = take_u8(&mut cur)?;
        for bit in 0..8 {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                out.push(take_u8(&mut cur)?);
            } else {
                let at = cur.position() as usize;
                let word = take_u16_le(&mut cur)?;
                let displacement = ((word & 0xFFF) as usize) + 1;
                let length = ((word >> 12) as usize) + 3;
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
    fn match_price(&self, _length: usize, _displacement: usize) -> u32 {
        17
    }
}

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let limits = [FindLimitations::new(
        MIN_LENGTH,
        MAX_LENGTH,
        1,
        MAX_DISPLACEMENT,
    )];
    let tokens = lz::parse(input, &limits, &FindOptions::default(), &Price)?;

    let mut out = Vec::with_capacity(input.len() / 2 + 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Literal { .. }) {
                flags |= 1 << i;
            }
        }
        out.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => out.push(input[*position]),
                Token::Match(m) => {
                    let word =
                        (((m.length - 3) as u16) << 12) | ((m.displacement - 1) as u16);
                    out.extend_from_slice(&word.to_le_bytes());
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
    fn roundtrips() {
        for input in [
            &b"classic window classic window classic"[..],
            b"",
            b"no repeats here!",
        ] {
            assert_eq!(decode(&encode(input).unwrap()).unwrap(), input);
        }
    }

    #[test]
    fn full_window_displacement_is_representable() {
        // a repeat exactly 0x1000 bytes back
        let mut input = b"anchor##".to_vec();
        input.extend(std::iter::repeat(b'.').take(0x1000 - 8));
        input.extend_from_slice(b"anchor##");
        let packed = encode(&input).unwrap();
        assert_eq!(decode(&packed).unwrap(), input);
    }
}
