//! Backward LZ77, the tail-to-head scheme used for bootstrap and overlay
//! blobs.
//!
//! The decoder starts at the end of the payload and reconstructs the
//! output from its last byte to its first; references therefore point at
//! data that sits *after* the match in the final byte order. On disk the
//! payload is the byte-reversed image of a forward LZ10-style stream over
//! the reversed input, which is what makes the tail readable first, and
//! the leading size word is little-endian.

use std::io::Cursor;

use crate::errors::CodecError;
use crate::lz::{self, Direction, FindLimitations, FindOptions, PriceCalculator, Token};

use super::{copy_backref, take_u32_le};

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 0x12;
const MIN_DISPLACEMENT: usize = 3;
const MAX_DISPLACEMENT: usize = 0x1002;

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut cur = Cursor::new(input);
    let size = take_u32_le(&mut cur)? as usize;

    // normalise to a forward stream over the reversed output
    let payload: Vec<u8> = input[4..].iter().rev().copied().collect();
    let mut out = Vec::with_capacity(size);
    let mut pos = 0usize;

    while out.len() < size {
        if pos >= payload.len() {
            return Err(CodecError::TruncatedInput { offset: input.len() });
        }
        let flags = payload[pos];
        pos += 1;
        for bit in (0..8).rev() {
            if out.len() >= size {
                break;
            }
            if flags & (1 << bit) != 0 {
                if pos + 2 > payload.len() {
                    return Err(CodecError::TruncatedInput { offset: input.len() });
                }
                let word = u16::from_be_bytes([payload[pos], payload[pos + 1]]);
                pos += 2;
                let length = ((word >> 12) as usize) + 3;
                let displacement = ((word & 0xFFF) as usize) + 3;
                if out.len() + length > size {
                    return Err(CodecError::MalformedToken {
                        offset: pos,
                        reason: "reference overruns the declared size",
                    });
                }
                copy_backref(&mut out, displacement, length, pos)?;
            } else {
                if pos >= payload.len() {
                    return Err(CodecError::TruncatedInput { offset: input.len() });
                }
                out.push(payload[pos]);
                pos += 1;
            }
        }
    }
    out.reverse();
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
        MIN_DISPLACEMENT,
        MAX_DISPLACEMENT,
    )];
    let options = FindOptions {
        direction: Direction::Backward,
        ..FindOptions::default()
    };
    let tokens = lz::parse(input, &limits, &options, &Price)?;
    let n = input.len();

    // build the forward stream over the reversed input, then flip it
    let mut payload = Vec::with_capacity(n / 2 + 8);
    for group in tokens.chunks(8) {
        let mut flags = 0u8;
        for (i, token) in group.iter().enumerate() {
            if matches!(token, Token::Match(_)) {
                flags |= 0x80 >> i;
            }
        }
        payload.push(flags);
        for token in group {
            match token {
                Token::Literal { position } => payload.push(input[*position]),
                Token::Match(m) => {
                    let word = (((m.length - 3) as u16) << 12)
                        | ((m.displacement - 3) as u16);
                    payload.extend_from_slice(&word.to_be_bytes());
                }
            }
        }
    }
    payload.reverse();

    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&(n as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palindrome_roundtrips_tail_first() {
        let mut data = Vec::with_capacity(1024);
        for i in 0..512u32 {
            data.push((i * 31 % 251) as u8);
        }
        let mut mirror = data.clone();
        mirror.reverse();
        data.extend_from_slice(&mirror);

        let limits = [FindLimitations::new(
            MIN_LENGTH,
            MAX_LENGTH,
            MIN_DISPLACEMENT,
            MAX_DISPLACEMENT,
        )];
        let options = FindOptions {
            direction: Direction::Backward,
            ..FindOptions::default()
        };
        let tokens = lz::parse(&data, &limits, &options, &Price).unwrap();
        let first = &tokens[0];
        assert_eq!(first.position() + first.covered(), data.len());

        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn references_point_forward_in_final_order() {
        let data = b"0123456789012345678901234567890123456789";
        let packed = encode(data).unwrap();
        assert_eq!(decode(&packed).unwrap(), data);
    }

    #[test]
    fn incompressible_input_survives() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }
}
